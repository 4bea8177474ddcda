use crate::data::DataGroup;

/// One page of documents returned by a list read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageReadResult {
    /// The documents on this page, each an independent copy.
    pub list_of_data_groups: Vec<DataGroup>,
    /// 1-based position of the first item on this page.
    pub start: u64,
    /// Number of matches before pagination was applied.
    pub total_number_of_matches: u64,
}

impl StorageReadResult {
    /// Number of documents on this page.
    pub fn len(&self) -> usize {
        self.list_of_data_groups.len()
    }

    /// Returns `true` if the page holds no documents.
    pub fn is_empty(&self) -> bool {
        self.list_of_data_groups.is_empty()
    }
}
