//! The [`TermIndex`] structure.
//!
//! The index has two tiers:
//!
//! - a flattened map `type -> storageKey -> id -> [(value, divider)]` used to
//!   answer equality filters, and
//! - the exact [`StorageTerm`] set last stored per `(type, id)`, used for
//!   retrieval. The flattened tier drops term ids, so it cannot rebuild it.
//!
//! Both tiers live behind one `RwLock`, so replacing a record's terms is a
//! single step for concurrent readers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use tracing::debug;

use arkiv_types::{Filter, StorageTerm};

use crate::snapshot::{CollectedTermsEntry, StoredTermEntry, TermSnapshot};

/// A value stored under `(type, storageKey, id)` together with its divider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedValue {
    pub value: String,
    pub data_divider: String,
}

#[derive(Clone, Debug)]
struct CollectedTerms {
    data_divider: String,
    terms: BTreeSet<StorageTerm>,
}

type IdValues = BTreeMap<String, Vec<IndexedValue>>;

#[derive(Debug, Default)]
struct Inner {
    /// type -> storageKey -> id -> values.
    terms: BTreeMap<String, BTreeMap<String, IdValues>>,
    /// (type, id) -> original term set.
    collected: BTreeMap<(String, String), CollectedTerms>,
}

/// Secondary index over storage terms.
#[derive(Debug, Default)]
pub struct TermIndex {
    inner: RwLock<Inner>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the terms stored for `(record_type, id)`.
    ///
    /// Previous entries for the record are removed first. An empty `terms`
    /// set leaves the record with no entries at all.
    pub fn store_collected_terms(
        &self,
        record_type: &str,
        id: &str,
        terms: &BTreeSet<StorageTerm>,
        data_divider: &str,
    ) {
        let mut inner = self.inner.write().expect("term index lock poisoned");
        inner.remove_record(record_type, id);
        if terms.is_empty() {
            return;
        }

        let by_key = inner.terms.entry(record_type.to_string()).or_default();
        for term in terms {
            by_key
                .entry(term.storage_key.clone())
                .or_default()
                .entry(id.to_string())
                .or_default()
                .push(IndexedValue {
                    value: term.value.clone(),
                    data_divider: data_divider.to_string(),
                });
        }
        inner.collected.insert(
            (record_type.to_string(), id.to_string()),
            CollectedTerms {
                data_divider: data_divider.to_string(),
                terms: terms.clone(),
            },
        );
        debug!(record_type, id, count = terms.len(), "stored collected terms");
    }

    /// Remove every index entry and the original term set for a record.
    pub fn remove_previous_collected_storage_terms(&self, record_type: &str, id: &str) {
        let mut inner = self.inner.write().expect("term index lock poisoned");
        inner.remove_record(record_type, id);
    }

    /// Ids of records of `record_type` matching the filter's first part.
    ///
    /// Returns an empty list if no term was ever stored for the type, even if
    /// records of the type exist. Conditions are combined with logical AND;
    /// parts after the first are not evaluated.
    pub fn find_record_ids_for_filter(&self, record_type: &str, filter: &Filter) -> Vec<String> {
        let inner = self.inner.read().expect("term index lock poisoned");
        let Some(by_key) = inner.terms.get(record_type) else {
            return Vec::new();
        };
        let Some(part) = filter.include.first() else {
            return Vec::new();
        };

        let mut candidates: Option<BTreeSet<&String>> = None;
        for condition in &part.conditions {
            let matching: BTreeSet<&String> = by_key
                .get(&condition.key)
                .map(|ids| {
                    ids.iter()
                        .filter(|(_, values)| values.iter().any(|v| v.value == condition.value))
                        .map(|(id, _)| id)
                        .collect()
                })
                .unwrap_or_default();
            candidates = Some(match candidates {
                None => matching,
                Some(current) => current.intersection(&matching).copied().collect(),
            });
        }

        candidates
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect()
    }

    /// The term set last stored for a record, or an empty set.
    pub fn get_collected_terms(&self, record_type: &str, id: &str) -> BTreeSet<StorageTerm> {
        let inner = self.inner.read().expect("term index lock poisoned");
        inner
            .collected
            .get(&(record_type.to_string(), id.to_string()))
            .map(|c| c.terms.clone())
            .unwrap_or_default()
    }

    /// Values stored under `(record_type, storage_key, id)`.
    pub fn values_for(&self, record_type: &str, storage_key: &str, id: &str) -> Vec<IndexedValue> {
        let inner = self.inner.read().expect("term index lock poisoned");
        inner
            .terms
            .get(record_type)
            .and_then(|by_key| by_key.get(storage_key))
            .and_then(|ids| ids.get(id))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns `true` if a term was ever stored for the type.
    pub fn has_terms_for_type(&self, record_type: &str) -> bool {
        let inner = self.inner.read().expect("term index lock poisoned");
        inner.terms.contains_key(record_type)
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Partition the whole index by data divider.
    pub fn snapshot_by_divider(&self) -> BTreeMap<String, TermSnapshot> {
        let inner = self.inner.read().expect("term index lock poisoned");
        let mut out: BTreeMap<String, TermSnapshot> = BTreeMap::new();

        for (record_type, by_key) in &inner.terms {
            for (storage_key, ids) in by_key {
                for (id, values) in ids {
                    for v in values {
                        out.entry(v.data_divider.clone())
                            .or_default()
                            .storage_terms
                            .push(StoredTermEntry {
                                record_type: record_type.clone(),
                                storage_key: storage_key.clone(),
                                id: id.clone(),
                                value: v.value.clone(),
                            });
                    }
                }
            }
        }
        for ((record_type, id), collected) in &inner.collected {
            out.entry(collected.data_divider.clone())
                .or_default()
                .collected_terms
                .push(CollectedTermsEntry {
                    record_type: record_type.clone(),
                    id: id.clone(),
                    terms: collected.terms.iter().cloned().collect(),
                });
        }
        out
    }

    /// Load a divider's snapshot into the index, adding to what is present.
    pub fn restore(&self, data_divider: &str, snapshot: TermSnapshot) {
        let mut inner = self.inner.write().expect("term index lock poisoned");
        for entry in snapshot.storage_terms {
            inner
                .terms
                .entry(entry.record_type)
                .or_default()
                .entry(entry.storage_key)
                .or_default()
                .entry(entry.id)
                .or_default()
                .push(IndexedValue {
                    value: entry.value,
                    data_divider: data_divider.to_string(),
                });
        }
        for entry in snapshot.collected_terms {
            inner.collected.insert(
                (entry.record_type, entry.id),
                CollectedTerms {
                    data_divider: data_divider.to_string(),
                    terms: entry.terms.into_iter().collect(),
                },
            );
        }
    }
}

impl Inner {
    fn remove_record(&mut self, record_type: &str, id: &str) {
        if let Some(by_key) = self.terms.get_mut(record_type) {
            for ids in by_key.values_mut() {
                ids.remove(id);
            }
            by_key.retain(|_, ids| !ids.is_empty());
        }
        self.collected
            .remove(&(record_type.to_string(), id.to_string()));
    }
}
