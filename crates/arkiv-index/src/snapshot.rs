//! Serializable image of the term index for a single data divider.

use serde::{Deserialize, Serialize};

use arkiv_types::StorageTerm;

/// One flattened index value: `(type, storageKey, id) -> value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTermEntry {
    #[serde(rename = "type")]
    pub record_type: String,
    pub storage_key: String,
    pub id: String,
    pub value: String,
}

/// The original term set stored for one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedTermsEntry {
    #[serde(rename = "type")]
    pub record_type: String,
    pub id: String,
    pub terms: Vec<StorageTerm>,
}

/// Every index entry carrying one data divider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSnapshot {
    #[serde(default)]
    pub storage_terms: Vec<StoredTermEntry>,
    #[serde(default)]
    pub collected_terms: Vec<CollectedTermsEntry>,
}

impl TermSnapshot {
    pub fn is_empty(&self) -> bool {
        self.storage_terms.is_empty() && self.collected_terms.is_empty()
    }
}
