use serde::{Deserialize, Serialize};

/// A named, indexed scalar extracted from a record's document at write time.
///
/// `id` identifies the term definition that produced the value; the index
/// itself only keys on `storage_key`, so the id is preserved separately for
/// retrieval of the original term set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTerm {
    pub id: String,
    pub storage_key: String,
    pub value: String,
}

impl StorageTerm {
    pub fn new(
        id: impl Into<String>,
        storage_key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            storage_key: storage_key.into(),
            value: value.into(),
        }
    }
}
