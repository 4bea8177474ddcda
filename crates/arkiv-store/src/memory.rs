use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use tracing::{debug, warn};

use arkiv_index::TermIndex;
use arkiv_links::LinkGraph;
use arkiv_types::{
    DataGroup, Filter, Link, StorageError, StorageReadResult, StorageResult, StorageTerm,
};

use crate::traits::RecordStore;

/// Record type whose records define other record types. A definition names
/// its parent type under `parentId/linkedRecordId`.
pub const RECORD_TYPE: &str = "recordType";

/// A document as held by the store, with the divider it was written under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRecord {
    pub data: DataGroup,
    pub data_divider: String,
}

/// type -> id -> record.
type Buckets = BTreeMap<String, BTreeMap<String, StoredRecord>>;

/// In-memory, map-based record store.
///
/// Records live in a `BTreeMap` per type behind one `RwLock`. Every
/// mutation keeps the write lock from its existence check until the term
/// index and link graph are updated, so mutations on one store never
/// interleave. Readers take the record lock before touching the index.
pub struct InMemoryRecordStore {
    records: RwLock<Buckets>,
    terms: TermIndex,
    links: LinkGraph,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            terms: TermIndex::new(),
            links: LinkGraph::new(),
        }
    }

    /// The term index maintained by this store.
    pub fn term_index(&self) -> &TermIndex {
        &self.terms
    }

    /// The link graph maintained by this store.
    pub fn link_graph(&self) -> &LinkGraph {
        &self.links
    }

    /// Every record of one type, keyed by id. Empty if the type is unknown.
    pub fn records_of_type(&self, record_type: &str) -> BTreeMap<String, StoredRecord> {
        let records = self.records.read().expect("lock poisoned");
        records.get(record_type).cloned().unwrap_or_default()
    }

    /// Total number of records across all types.
    pub fn len(&self) -> usize {
        let records = self.records.read().expect("lock poisoned");
        records.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a record read back from persistent storage.
    ///
    /// Bypasses conflict checks and indexing: replayed terms and links are
    /// restored from their own snapshots.
    pub(crate) fn insert_replayed(
        &self,
        record_type: &str,
        id: &str,
        data: DataGroup,
        data_divider: &str,
    ) {
        let mut records = self.records.write().expect("lock poisoned");
        records
            .entry(record_type.to_string())
            .or_default()
            .insert(
                id.to_string(),
                StoredRecord {
                    data,
                    data_divider: data_divider.to_string(),
                },
            );
    }

    /// Records of `record_type`'s bucket matching `filter`, in id order.
    fn matching_records<'a>(
        &self,
        bucket: &'a BTreeMap<String, StoredRecord>,
        record_type: &str,
        filter: &Filter,
    ) -> Vec<&'a StoredRecord> {
        if filter.filters_results() {
            self.terms
                .find_record_ids_for_filter(record_type, filter)
                .iter()
                .filter_map(|id| bucket.get(id))
                .collect()
        } else {
            bucket.values().collect()
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `record_type` followed by every type implementing it, transitively.
///
/// Each type appears once; a parent cycle among type definitions stops at
/// the first repeated type.
fn implementing_types(records: &Buckets, record_type: &str) -> Vec<String> {
    let mut visited = BTreeSet::new();
    let mut out = Vec::new();
    collect_implementing(records, record_type, &mut visited, &mut out);
    out
}

fn collect_implementing(
    records: &Buckets,
    record_type: &str,
    visited: &mut BTreeSet<String>,
    out: &mut Vec<String>,
) {
    if !visited.insert(record_type.to_string()) {
        warn!(record_type, "cycle in record type hierarchy");
        return;
    }
    out.push(record_type.to_string());

    let Some(definitions) = records.get(RECORD_TYPE) else {
        return;
    };
    for (child_type, definition) in definitions {
        let parent = definition
            .data
            .first_child("parentId")
            .and_then(|p| p.first_atomic_value("linkedRecordId"));
        if parent == Some(record_type) {
            collect_implementing(records, child_type, visited, out);
        }
    }
}

fn read_last_match(records: &Buckets, types: &[&str], id: &str) -> Option<DataGroup> {
    let mut found = None;
    for record_type in types {
        if let Some(record) = records.get(*record_type).and_then(|b| b.get(id)) {
            found = Some(&record.data);
        }
    }
    found.cloned()
}

fn types_not_found(types: &[&str], id: &str) -> StorageError {
    StorageError::NotFound(format!(
        "no record exists with type in [{}] and id: {id}",
        types.join(", ")
    ))
}

impl RecordStore for InMemoryRecordStore {
    fn create(
        &self,
        record_type: &str,
        id: &str,
        data: &DataGroup,
        terms: &BTreeSet<StorageTerm>,
        links: &BTreeSet<Link>,
        data_divider: &str,
    ) -> StorageResult<()> {
        let mut records = self.records.write().expect("lock poisoned");
        let bucket = records.entry(record_type.to_string()).or_default();
        if bucket.contains_key(id) {
            return Err(StorageError::Conflict {
                record_type: record_type.to_string(),
                id: id.to_string(),
            });
        }
        bucket.insert(
            id.to_string(),
            StoredRecord {
                data: data.clone(),
                data_divider: data_divider.to_string(),
            },
        );
        self.terms
            .store_collected_terms(record_type, id, terms, data_divider);
        self.links
            .store_links(&Link::new(record_type, id), links, data_divider);

        debug!(record_type, id, data_divider, "created record");
        Ok(())
    }

    fn read(&self, types: &[&str], id: &str) -> StorageResult<DataGroup> {
        let records = self.records.read().expect("lock poisoned");
        read_last_match(&records, types, id).ok_or_else(|| types_not_found(types, id))
    }

    fn read_one(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        let records = self.records.read().expect("lock poisoned");
        let bucket = records.get(record_type).ok_or_else(|| {
            StorageError::NotFound(format!("no records exists with recordType: {record_type}"))
        })?;
        bucket
            .get(id)
            .map(|r| r.data.clone())
            .ok_or_else(|| StorageError::record_not_found(record_type, id))
    }

    fn read_abstract(&self, abstract_type: &str, id: &str) -> StorageResult<DataGroup> {
        let records = self.records.read().expect("lock poisoned");
        let types = implementing_types(&records, abstract_type);
        let types: Vec<&str> = types.iter().map(String::as_str).collect();
        read_last_match(&records, &types, id).ok_or_else(|| types_not_found(&types, id))
    }

    fn read_list(&self, types: &[&str], filter: &Filter) -> StorageResult<StorageReadResult> {
        let records = self.records.read().expect("lock poisoned");

        let mut seen = BTreeSet::new();
        let mut matches: Vec<&StoredRecord> = Vec::new();
        for requested in types {
            for record_type in implementing_types(&records, requested) {
                if !seen.insert(record_type.clone()) {
                    continue;
                }
                // Types without records contribute nothing.
                let Some(bucket) = records.get(&record_type) else {
                    continue;
                };
                matches.extend(self.matching_records(bucket, &record_type, filter));
            }
        }

        let range = filter.page_range(matches.len());
        Ok(StorageReadResult {
            start: filter.from_no.unwrap_or(1).max(1),
            total_number_of_matches: matches.len() as u64,
            list_of_data_groups: matches[range].iter().map(|r| r.data.clone()).collect(),
        })
    }

    fn update(
        &self,
        record_type: &str,
        id: &str,
        data: &DataGroup,
        terms: &BTreeSet<StorageTerm>,
        links: &BTreeSet<Link>,
        data_divider: &str,
    ) -> StorageResult<()> {
        let mut records = self.records.write().expect("lock poisoned");
        let record = records
            .get_mut(record_type)
            .and_then(|bucket| bucket.get_mut(id))
            .ok_or_else(|| StorageError::record_not_found(record_type, id))?;

        let from = Link::new(record_type, id);
        self.links.remove_links(&from);
        *record = StoredRecord {
            data: data.clone(),
            data_divider: data_divider.to_string(),
        };
        self.terms
            .store_collected_terms(record_type, id, terms, data_divider);
        self.links.store_links(&from, links, data_divider);

        debug!(record_type, id, data_divider, "updated record");
        Ok(())
    }

    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()> {
        let mut records = self.records.write().expect("lock poisoned");
        let bucket = records
            .get_mut(record_type)
            .filter(|bucket| bucket.contains_key(id))
            .ok_or_else(|| StorageError::record_not_found(record_type, id))?;

        self.links.remove_links(&Link::new(record_type, id));
        self.terms
            .remove_previous_collected_storage_terms(record_type, id);
        bucket.remove(id);
        if bucket.is_empty() {
            records.remove(record_type);
        }

        debug!(record_type, id, "deleted record");
        Ok(())
    }

    fn record_exists(&self, types: &[&str], id: &str) -> StorageResult<bool> {
        let records = self.records.read().expect("lock poisoned");
        Ok(types
            .iter()
            .any(|t| records.get(*t).is_some_and(|bucket| bucket.contains_key(id))))
    }

    fn get_total_number_of_records_for_types(
        &self,
        types: &[&str],
        filter: &Filter,
    ) -> StorageResult<u64> {
        let records = self.records.read().expect("lock poisoned");
        let total: usize = types
            .iter()
            .map(|record_type| {
                if filter.filters_results() {
                    self.terms
                        .find_record_ids_for_filter(record_type, filter)
                        .len()
                } else {
                    records.get(*record_type).map_or(0, BTreeMap::len)
                }
            })
            .sum();
        Ok(filter.page_range(total).len() as u64)
    }

    fn get_storage_terms(&self, record_type: &str, id: &str) -> StorageResult<BTreeSet<StorageTerm>> {
        Ok(self.terms.get_collected_terms(record_type, id))
    }

    fn get_links_to_record(&self, to: &Link) -> StorageResult<BTreeSet<Link>> {
        Ok(self.links.links_to_record(to))
    }

    fn get_links_from_record(&self, from: &Link) -> StorageResult<BTreeSet<Link>> {
        Ok(self.links.links_from_record(from))
    }

    fn links_exist_for_record(&self, to: &Link) -> StorageResult<bool> {
        Ok(self.links.links_exist_for_record(to))
    }

    fn record_types(&self) -> StorageResult<Vec<String>> {
        let records = self.records.read().expect("lock poisoned");
        Ok(records.keys().cloned().collect())
    }

    fn count(&self, record_type: &str) -> StorageResult<usize> {
        let records = self.records.read().expect("lock poisoned");
        Ok(records.get(record_type).map_or(0, BTreeMap::len))
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.len())
            .field("records_with_links", &self.links.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arkiv_types::{Condition, Part};
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    fn record(id: &str) -> DataGroup {
        DataGroup::new("place")
            .with_child(DataGroup::new("recordInfo").with_child(DataGroup::atomic("id", id)))
            .with_child(DataGroup::atomic("name", format!("name of {id}")))
    }

    fn type_definition(id: &str, parent: Option<&str>) -> DataGroup {
        let mut group = DataGroup::new("recordType")
            .with_child(DataGroup::new("recordInfo").with_child(DataGroup::atomic("id", id)));
        if let Some(parent) = parent {
            group.add_child(
                DataGroup::new("parentId")
                    .with_child(DataGroup::atomic("linkedRecordType", RECORD_TYPE))
                    .with_child(DataGroup::atomic("linkedRecordId", parent)),
            );
        }
        group
    }

    fn term(key: &str, value: &str) -> BTreeSet<StorageTerm> {
        [StorageTerm::new(format!("{key}Term"), key, value)]
            .into_iter()
            .collect()
    }

    fn no_terms() -> BTreeSet<StorageTerm> {
        BTreeSet::new()
    }

    fn no_links() -> BTreeSet<Link> {
        BTreeSet::new()
    }

    fn links(targets: &[Link]) -> BTreeSet<Link> {
        targets.iter().cloned().collect()
    }

    fn create_plain(store: &InMemoryRecordStore, record_type: &str, id: &str) {
        store
            .create(record_type, id, &record(id), &no_terms(), &no_links(), "cora")
            .unwrap();
    }

    fn store_with_places(count: usize) -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        for i in 0..count {
            create_plain(&store, "place", &format!("place:{i:03}"));
        }
        store
    }

    fn define_type(store: &InMemoryRecordStore, id: &str, parent: Option<&str>) {
        store
            .create(
                RECORD_TYPE,
                id,
                &type_definition(id, parent),
                &no_terms(),
                &no_links(),
                "cora",
            )
            .unwrap();
    }

    // -----------------------------------------------------------------------
    // Create / read
    // -----------------------------------------------------------------------

    #[test]
    fn create_then_read_returns_equal_copy() {
        let store = InMemoryRecordStore::new();
        let mut data = record("p1");
        store
            .create("place", "p1", &data, &no_terms(), &no_links(), "cora")
            .unwrap();

        // Mutating the caller's document must not reach the stored one.
        data.add_child(DataGroup::atomic("late", "change"));
        let mut read = store.read_one("place", "p1").unwrap();
        assert_eq!(read, record("p1"));

        // Nor may mutating a read copy.
        read.add_child(DataGroup::atomic("local", "edit"));
        assert_eq!(store.read_one("place", "p1").unwrap(), record("p1"));
    }

    #[test]
    fn create_duplicate_is_conflict() {
        let store = InMemoryRecordStore::new();
        create_plain(&store, "place", "p1");
        let err = store
            .create("place", "p1", &DataGroup::new("other"), &no_terms(), &no_links(), "cora")
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }), "got {err}");
        assert_eq!(store.read_one("place", "p1").unwrap(), record("p1"));
    }

    #[test]
    fn same_id_in_other_type_is_allowed() {
        let store = InMemoryRecordStore::new();
        create_plain(&store, "place", "x");
        create_plain(&store, "book", "x");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn read_missing_type_and_id() {
        let store = InMemoryRecordStore::new();
        assert!(store.read_one("place", "p1").unwrap_err().is_not_found());
        create_plain(&store, "place", "p1");
        assert!(store.read_one("place", "p2").unwrap_err().is_not_found());
    }

    #[test]
    fn read_over_types_prefers_last_match() {
        let store = InMemoryRecordStore::new();
        store
            .create("book", "x", &DataGroup::new("book"), &no_terms(), &no_links(), "cora")
            .unwrap();
        store
            .create("image", "x", &DataGroup::new("image"), &no_terms(), &no_links(), "cora")
            .unwrap();

        let read = store.read(&["book", "missing", "image"], "x").unwrap();
        assert_eq!(read.name_in_data, "image");
        let read = store.read(&["image", "book"], "x").unwrap();
        assert_eq!(read.name_in_data, "book");
        assert!(store.read(&["missing", "other"], "x").unwrap_err().is_not_found());
    }

    #[test]
    fn record_exists_over_types() {
        let store = InMemoryRecordStore::new();
        create_plain(&store, "place", "p1");
        assert!(store.record_exists(&["book", "place"], "p1").unwrap());
        assert!(!store.record_exists(&["book"], "p1").unwrap());
        assert!(!store.record_exists(&["place"], "p2").unwrap());
    }

    // -----------------------------------------------------------------------
    // Update / delete
    // -----------------------------------------------------------------------

    #[test]
    fn update_missing_is_not_found() {
        let store = InMemoryRecordStore::new();
        let err = store
            .update("place", "p1", &record("p1"), &no_terms(), &no_links(), "cora")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_replaces_document_terms_and_links() {
        let store = InMemoryRecordStore::new();
        let from = Link::new("book", "b1");
        let old_target = Link::new("place", "old");
        let new_target = Link::new("place", "new");
        store
            .create(
                "book",
                "b1",
                &DataGroup::new("book"),
                &term("title", "Old"),
                &links(&[old_target.clone()]),
                "cora",
            )
            .unwrap();

        store
            .update(
                "book",
                "b1",
                &DataGroup::atomic("book", "v2"),
                &term("title", "New"),
                &links(&[new_target.clone()]),
                "cora",
            )
            .unwrap();

        assert_eq!(store.read_one("book", "b1").unwrap().value.as_deref(), Some("v2"));
        assert_eq!(store.get_storage_terms("book", "b1").unwrap(), term("title", "New"));
        assert!(!store.links_exist_for_record(&old_target).unwrap());
        assert!(store.get_links_to_record(&new_target).unwrap().contains(&from));
        let found = store.read_list(&["book"], &Filter::equals("title", "Old")).unwrap();
        assert_eq!(found.total_number_of_matches, 0);
    }

    #[test]
    fn delete_removes_record_and_bucket() {
        let store = InMemoryRecordStore::new();
        create_plain(&store, "place", "p1");
        store.delete_by_type_and_id("place", "p1").unwrap();

        assert!(store.read_one("place", "p1").unwrap_err().is_not_found());
        assert!(store.record_types().unwrap().is_empty());
        let list = store.read_list(&["place"], &Filter::new()).unwrap();
        assert_eq!(list.total_number_of_matches, 0);
        assert!(list.is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = InMemoryRecordStore::new();
        assert!(store.delete_by_type_and_id("place", "p1").unwrap_err().is_not_found());
        create_plain(&store, "place", "p1");
        assert!(store.delete_by_type_and_id("place", "p2").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_cascades_to_terms_and_links() {
        let store = InMemoryRecordStore::new();
        let target = Link::new("place", "p1");
        store
            .create(
                "book",
                "b1",
                &DataGroup::new("book"),
                &term("title", "T"),
                &links(&[target.clone()]),
                "cora",
            )
            .unwrap();
        store.delete_by_type_and_id("book", "b1").unwrap();

        assert!(store.get_storage_terms("book", "b1").unwrap().is_empty());
        assert!(store.get_links_from_record(&Link::new("book", "b1")).unwrap().is_empty());
        assert!(!store.links_exist_for_record(&target).unwrap());
    }

    // -----------------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------------

    #[test]
    fn links_are_symmetric_after_create() {
        let store = InMemoryRecordStore::new();
        let from = Link::new("book", "b1");
        let targets = links(&[Link::new("place", "p1"), Link::new("person", "x")]);
        store
            .create("book", "b1", &DataGroup::new("book"), &no_terms(), &targets, "cora")
            .unwrap();

        for to in store.get_links_from_record(&from).unwrap() {
            assert!(store.get_links_to_record(&to).unwrap().contains(&from));
        }
        assert!(store.links_exist_for_record(&Link::new("place", "p1")).unwrap());
        assert!(!store.links_exist_for_record(&from).unwrap());
    }

    // -----------------------------------------------------------------------
    // Filtering
    // -----------------------------------------------------------------------

    #[test]
    fn filter_on_term_value() {
        let store = InMemoryRecordStore::new();
        store
            .create("place", "p1", &record("p1"), &term("placeName", "Uppsala"), &no_links(), "cora")
            .unwrap();
        store
            .create("place", "p2", &record("p2"), &term("placeName", "Stockholm"), &no_links(), "cora")
            .unwrap();

        let result = store
            .read_list(&["place"], &Filter::equals("placeName", "Uppsala"))
            .unwrap();
        assert_eq!(result.total_number_of_matches, 1);
        assert_eq!(result.list_of_data_groups, vec![record("p1")]);

        let none = store
            .read_list(&["place"], &Filter::equals("unknownKey", "Uppsala"))
            .unwrap();
        assert_eq!(none.total_number_of_matches, 0);
    }

    #[test]
    fn filter_on_type_without_terms_is_empty() {
        let store = store_with_places(3);
        let result = store
            .read_list(&["place"], &Filter::equals("placeName", "Uppsala"))
            .unwrap();
        assert_eq!(result.total_number_of_matches, 0);
        let all = store.read_list(&["place"], &Filter::new()).unwrap();
        assert_eq!(all.total_number_of_matches, 3);
    }

    #[test]
    fn filter_with_two_conditions_is_and() {
        let store = InMemoryRecordStore::new();
        let both: BTreeSet<StorageTerm> = [
            StorageTerm::new("nameTerm", "placeName", "Uppsala"),
            StorageTerm::new("countryTerm", "country", "SE"),
        ]
        .into_iter()
        .collect();
        store
            .create("place", "p1", &record("p1"), &both, &no_links(), "cora")
            .unwrap();
        store
            .create("place", "p2", &record("p2"), &term("placeName", "Uppsala"), &no_links(), "cora")
            .unwrap();

        let filter = Filter::new().with_part(Part::new(vec![
            Condition::equals("placeName", "Uppsala"),
            Condition::equals("country", "SE"),
        ]));
        let result = store.read_list(&["place"], &filter).unwrap();
        assert_eq!(result.list_of_data_groups, vec![record("p1")]);
    }

    // -----------------------------------------------------------------------
    // Pagination
    // -----------------------------------------------------------------------

    #[test]
    fn from_no_four_of_twenty_eight() {
        let store = store_with_places(28);
        let result = store
            .read_list(&["place"], &Filter::new().with_from_no(4))
            .unwrap();
        assert_eq!(result.len(), 25);
        assert_eq!(result.start, 4);
        assert_eq!(result.total_number_of_matches, 28);
        assert_eq!(result.list_of_data_groups[0], record("place:003"));
    }

    #[test]
    fn to_no_seven_without_from() {
        let store = store_with_places(28);
        let result = store.read_list(&["place"], &Filter::new().with_to_no(7)).unwrap();
        assert_eq!(result.len(), 7);
        assert_eq!(result.start, 1);
    }

    #[test]
    fn from_no_past_end_is_empty() {
        let store = store_with_places(18);
        let result = store
            .read_list(&["place"], &Filter::new().with_from_no(20))
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.total_number_of_matches, 18);
    }

    #[test]
    fn to_no_clamped_to_matches() {
        let store = store_with_places(5);
        let result = store
            .read_list(&["place"], &Filter::new().with_from_no(2).with_to_no(50))
            .unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn total_number_of_records_sums_then_paginates() {
        let store = store_with_places(10);
        for i in 0..5 {
            create_plain(&store, "book", &format!("book:{i}"));
        }
        let types = ["place", "book", "missing"];
        assert_eq!(
            store.get_total_number_of_records_for_types(&types, &Filter::new()).unwrap(),
            15
        );
        assert_eq!(
            store
                .get_total_number_of_records_for_types(&types, &Filter::new().with_from_no(12))
                .unwrap(),
            4
        );
        assert_eq!(
            store
                .get_total_number_of_records_for_types(&types, &Filter::new().with_to_no(3))
                .unwrap(),
            3
        );
    }

    #[test]
    fn total_number_of_records_with_filter() {
        let store = InMemoryRecordStore::new();
        store
            .create("place", "p1", &record("p1"), &term("placeName", "Uppsala"), &no_links(), "cora")
            .unwrap();
        store
            .create("town", "t1", &record("t1"), &term("placeName", "Uppsala"), &no_links(), "cora")
            .unwrap();
        let filter = Filter::equals("placeName", "Uppsala");
        assert_eq!(
            store
                .get_total_number_of_records_for_types(&["place", "town"], &filter)
                .unwrap(),
            2
        );
    }

    proptest! {
        #[test]
        fn page_never_exceeds_bounds(size in 0usize..40, from in 0u64..50, to in 0u64..50) {
            let store = store_with_places(size);
            let filter = Filter::new().with_from_no(from).with_to_no(to);
            let result = store.read_list(&["place"], &filter).unwrap();
            let counted = store.get_total_number_of_records_for_types(&["place"], &filter).unwrap();
            prop_assert_eq!(result.total_number_of_matches, size as u64);
            prop_assert_eq!(result.len() as u64, counted);
            prop_assert!(result.len() <= size);
            prop_assert!(result.len() as u64 <= to.saturating_sub(from.max(1)) + 1);
        }
    }

    // -----------------------------------------------------------------------
    // Abstract types
    // -----------------------------------------------------------------------

    #[test]
    fn read_list_includes_transitive_implementers() {
        let store = InMemoryRecordStore::new();
        define_type(&store, "publication", None);
        define_type(&store, "book", Some("publication"));
        define_type(&store, "novel", Some("book"));
        define_type(&store, "article", Some("publication"));
        create_plain(&store, "book", "b1");
        create_plain(&store, "novel", "n1");
        create_plain(&store, "novel", "n2");

        let result = store.read_list(&["publication"], &Filter::new()).unwrap();
        // article has no records and is skipped.
        assert_eq!(result.total_number_of_matches, 3);

        let books = store.read_list(&["book"], &Filter::new()).unwrap();
        assert_eq!(books.total_number_of_matches, 3);
        let novels = store.read_list(&["novel"], &Filter::new()).unwrap();
        assert_eq!(novels.total_number_of_matches, 2);
    }

    #[test]
    fn read_abstract_finds_implementer_record() {
        let store = InMemoryRecordStore::new();
        define_type(&store, "publication", None);
        define_type(&store, "book", Some("publication"));
        define_type(&store, "novel", Some("book"));
        create_plain(&store, "novel", "n1");

        assert_eq!(store.read_abstract("publication", "n1").unwrap(), record("n1"));
        assert!(store.read_abstract("publication", "zzz").unwrap_err().is_not_found());
    }

    #[test]
    fn parent_cycle_terminates() {
        let store = InMemoryRecordStore::new();
        define_type(&store, "a", Some("b"));
        define_type(&store, "b", Some("a"));
        create_plain(&store, "a", "x");
        create_plain(&store, "b", "y");

        let result = store.read_list(&["a"], &Filter::new()).unwrap();
        assert_eq!(result.total_number_of_matches, 2);
    }

    #[test]
    fn listed_types_are_not_counted_twice() {
        let store = InMemoryRecordStore::new();
        define_type(&store, "publication", None);
        define_type(&store, "book", Some("publication"));
        create_plain(&store, "book", "b1");
        let result = store
            .read_list(&["publication", "book"], &Filter::new())
            .unwrap();
        assert_eq!(result.total_number_of_matches, 1);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_creates_of_same_id_admit_one() {
        let store = Arc::new(InMemoryRecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .create(
                            "place",
                            "contested",
                            &DataGroup::atomic("place", i.to_string()),
                            &BTreeSet::new(),
                            &BTreeSet::new(),
                            "cora",
                        )
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(store.count("place").unwrap(), 1);
    }

    #[test]
    fn debug_format() {
        let store = store_with_places(2);
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryRecordStore"));
        assert!(debug.contains("record_count: 2"));
    }
}
