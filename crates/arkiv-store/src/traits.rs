use std::collections::BTreeSet;

use arkiv_types::{DataGroup, Filter, Link, StorageReadResult, StorageResult, StorageTerm};

/// Keyed document storage with term indexing and link tracking.
///
/// All implementations must satisfy these invariants:
/// - Documents handed in are copied; documents handed out are copies.
/// - `create`, `update`, and `delete_by_type_and_id` replace the record's
///   terms and links together with its document.
/// - Link symmetry: `a` links to `b` iff `b` is linked from `a`.
/// - A type with no records left behaves as a type never seen.
pub trait RecordStore: Send + Sync {
    /// Store a new record.
    ///
    /// Fails with `Conflict` if `id` already exists for `record_type`.
    fn create(
        &self,
        record_type: &str,
        id: &str,
        data: &DataGroup,
        terms: &BTreeSet<StorageTerm>,
        links: &BTreeSet<Link>,
        data_divider: &str,
    ) -> StorageResult<()>;

    /// Read a record that may be stored under any of `types`.
    ///
    /// If more than one type holds `id`, the match from the type listed last
    /// wins. Fails with `NotFound` if no type holds it.
    fn read(&self, types: &[&str], id: &str) -> StorageResult<DataGroup>;

    /// Read a record of a single type.
    fn read_one(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        self.read(&[record_type], id)
    }

    /// Read a record of an abstract type from any type implementing it.
    fn read_abstract(&self, abstract_type: &str, id: &str) -> StorageResult<DataGroup>;

    /// Read a page of records of `types` and every type implementing them.
    fn read_list(&self, types: &[&str], filter: &Filter) -> StorageResult<StorageReadResult>;

    /// Replace an existing record's document, terms, and links.
    ///
    /// Fails with `NotFound` if the record does not exist.
    fn update(
        &self,
        record_type: &str,
        id: &str,
        data: &DataGroup,
        terms: &BTreeSet<StorageTerm>,
        links: &BTreeSet<Link>,
        data_divider: &str,
    ) -> StorageResult<()>;

    /// Delete a record, its outgoing links, and its terms.
    ///
    /// Fails with `NotFound` if the record does not exist.
    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()>;

    /// Returns `true` if any of `types` holds `id`.
    fn record_exists(&self, types: &[&str], id: &str) -> StorageResult<bool>;

    /// Number of records of `types` matching `filter`, after applying the
    /// filter's pagination bounds to the summed count.
    fn get_total_number_of_records_for_types(
        &self,
        types: &[&str],
        filter: &Filter,
    ) -> StorageResult<u64>;

    /// The term set last stored for a record.
    fn get_storage_terms(&self, record_type: &str, id: &str) -> StorageResult<BTreeSet<StorageTerm>>;

    /// Records linking to `to`.
    fn get_links_to_record(&self, to: &Link) -> StorageResult<BTreeSet<Link>>;

    /// Records `from` links to.
    fn get_links_from_record(&self, from: &Link) -> StorageResult<BTreeSet<Link>>;

    /// Returns `true` if any record links to `to`.
    fn links_exist_for_record(&self, to: &Link) -> StorageResult<bool>;

    /// Every record type currently holding at least one record, sorted.
    fn record_types(&self) -> StorageResult<Vec<String>>;

    /// Number of records directly stored under `record_type`.
    fn count(&self, record_type: &str) -> StorageResult<usize>;
}
