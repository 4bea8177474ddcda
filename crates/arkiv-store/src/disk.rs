//! Disk-backed record store.
//!
//! [`DiskRecordStore`] keeps all state in an [`InMemoryRecordStore`] and,
//! after every successful mutation, rewrites the affected JSON snapshots:
//! the mutated type's record files, every term index file, and every link
//! file, each partitioned by data divider. On open, the base directory is
//! walked and every snapshot is loaded straight into memory without
//! triggering writes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use arkiv_index::TermSnapshot;
use arkiv_links::LinkListEntry;
use arkiv_types::{
    DataGroup, Filter, Link, StorageError, StorageReadResult, StorageResult, StorageTerm,
};

use crate::files::{
    parse_file_name, read_json, remove_snapshot, snapshot_path, validate_names,
    write_json_atomic, RecordFileEntry, COLLECTED_DATA, LINK_LISTS, STREAMS_DIR,
};
use crate::memory::InMemoryRecordStore;
use crate::traits::RecordStore;

/// Dividers that currently have a snapshot file on disk, per file name.
#[derive(Debug, Default)]
struct WrittenDividers {
    record_types: BTreeMap<String, BTreeSet<String>>,
    collected_data: BTreeSet<String>,
    link_lists: BTreeSet<String>,
}

/// Record store persisting JSON snapshots under a base directory.
pub struct DiskRecordStore {
    base_path: PathBuf,
    memory: InMemoryRecordStore,
    /// Serializes the snapshot phase of concurrent mutations.
    written: Mutex<WrittenDividers>,
}

impl DiskRecordStore {
    /// Open the store at `base_path`, creating the directory if missing and
    /// loading every snapshot found under it.
    pub fn open(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::io(
                format!("can not create storage directory {}", base_path.display()),
                e,
            )
        })?;

        let memory = InMemoryRecordStore::new();
        let written = replay(&base_path, &memory)?;
        info!(
            base_path = %base_path.display(),
            records = memory.len(),
            "loaded storage directory"
        );

        Ok(Self {
            base_path,
            memory,
            written: Mutex::new(written),
        })
    }

    /// The directory snapshots are written under.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The in-memory state behind this store.
    pub fn memory(&self) -> &InMemoryRecordStore {
        &self.memory
    }

    fn write_snapshots(&self, record_type: &str) -> StorageResult<()> {
        let mut written = self.written.lock().expect("snapshot writer poisoned");

        let mut records: BTreeMap<String, Vec<RecordFileEntry>> = BTreeMap::new();
        for (id, record) in self.memory.records_of_type(record_type) {
            records
                .entry(record.data_divider.clone())
                .or_default()
                .push(RecordFileEntry {
                    id,
                    data_divider: record.data_divider,
                    data: record.data,
                });
        }
        let known = written
            .record_types
            .entry(record_type.to_string())
            .or_default();
        sync_partitions(&self.base_path, record_type, known, &records)?;
        if known.is_empty() {
            written.record_types.remove(record_type);
        }

        let terms: BTreeMap<String, TermSnapshot> = self.memory.term_index().snapshot_by_divider();
        sync_partitions(
            &self.base_path,
            COLLECTED_DATA,
            &mut written.collected_data,
            &terms,
        )?;

        let links: BTreeMap<String, Vec<LinkListEntry>> =
            self.memory.link_graph().snapshot_by_divider();
        sync_partitions(&self.base_path, LINK_LISTS, &mut written.link_lists, &links)?;

        debug!(record_type, "snapshots written");
        Ok(())
    }
}

/// Make the files for `name` match `current`: write one file per divider
/// present and remove files of dividers no longer present.
fn sync_partitions<T: Serialize>(
    base: &Path,
    name: &str,
    known: &mut BTreeSet<String>,
    current: &BTreeMap<String, T>,
) -> StorageResult<()> {
    for stale in known.iter().filter(|d| !current.contains_key(*d)) {
        remove_snapshot(&snapshot_path(base, name, stale))?;
    }
    for (divider, value) in current {
        write_json_atomic(&snapshot_path(base, name, divider), value)?;
    }
    *known = current.keys().cloned().collect();
    Ok(())
}

fn replay(base: &Path, memory: &InMemoryRecordStore) -> StorageResult<WrittenDividers> {
    let mut written = WrittenDividers::default();

    let walker = WalkDir::new(base)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == STREAMS_DIR));

    for entry in walker {
        let entry = entry.map_err(|e| {
            StorageError::io(
                format!("can not read storage directory {}", base.display()),
                io::Error::from(e),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            warn!(path = %entry.path().display(), "skipping file with non UTF-8 name");
            continue;
        };
        // Leftovers of interrupted atomic writes.
        if file_name.starts_with('.') {
            continue;
        }
        let Some((name, divider)) = parse_file_name(file_name) else {
            warn!(path = %entry.path().display(), "skipping file with unrecognised name");
            continue;
        };

        match name {
            COLLECTED_DATA => {
                let snapshot: TermSnapshot = read_json(entry.path())?;
                memory.term_index().restore(divider, snapshot);
                written.collected_data.insert(divider.to_string());
            }
            LINK_LISTS => {
                let entries: Vec<LinkListEntry> = read_json(entry.path())?;
                memory.link_graph().restore(divider, entries);
                written.link_lists.insert(divider.to_string());
            }
            record_type => {
                let records: Vec<RecordFileEntry> = read_json(entry.path())?;
                for record in records {
                    memory.insert_replayed(record_type, &record.id, record.data, &record.data_divider);
                }
                written
                    .record_types
                    .entry(record_type.to_string())
                    .or_default()
                    .insert(divider.to_string());
            }
        }
        debug!(path = %entry.path().display(), "replayed snapshot");
    }
    Ok(written)
}

impl RecordStore for DiskRecordStore {
    fn create(
        &self,
        record_type: &str,
        id: &str,
        data: &DataGroup,
        terms: &BTreeSet<StorageTerm>,
        links: &BTreeSet<Link>,
        data_divider: &str,
    ) -> StorageResult<()> {
        validate_names(record_type, data_divider)?;
        self.memory
            .create(record_type, id, data, terms, links, data_divider)?;
        self.write_snapshots(record_type)
    }

    fn read(&self, types: &[&str], id: &str) -> StorageResult<DataGroup> {
        self.memory.read(types, id)
    }

    fn read_one(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        self.memory.read_one(record_type, id)
    }

    fn read_abstract(&self, abstract_type: &str, id: &str) -> StorageResult<DataGroup> {
        self.memory.read_abstract(abstract_type, id)
    }

    fn read_list(&self, types: &[&str], filter: &Filter) -> StorageResult<StorageReadResult> {
        self.memory.read_list(types, filter)
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
        validate_names(record_type, data_divider)?;
        self.memory
            .update(record_type, id, data, terms, links, data_divider)?;
        self.write_snapshots(record_type)
    }

    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()> {
        self.memory.delete_by_type_and_id(record_type, id)?;
        self.write_snapshots(record_type)
    }

    fn record_exists(&self, types: &[&str], id: &str) -> StorageResult<bool> {
        self.memory.record_exists(types, id)
    }

    fn get_total_number_of_records_for_types(
        &self,
        types: &[&str],
        filter: &Filter,
    ) -> StorageResult<u64> {
        self.memory
            .get_total_number_of_records_for_types(types, filter)
    }

    fn get_storage_terms(&self, record_type: &str, id: &str) -> StorageResult<BTreeSet<StorageTerm>> {
        self.memory.get_storage_terms(record_type, id)
    }

    fn get_links_to_record(&self, to: &Link) -> StorageResult<BTreeSet<Link>> {
        self.memory.get_links_to_record(to)
    }

    fn get_links_from_record(&self, from: &Link) -> StorageResult<BTreeSet<Link>> {
        self.memory.get_links_from_record(from)
    }

    fn links_exist_for_record(&self, to: &Link) -> StorageResult<bool> {
        self.memory.links_exist_for_record(to)
    }

    fn record_types(&self) -> StorageResult<Vec<String>> {
        self.memory.record_types()
    }

    fn count(&self, record_type: &str) -> StorageResult<usize> {
        self.memory.count(record_type)
    }
}

impl std::fmt::Debug for DiskRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskRecordStore")
            .field("base_path", &self.base_path)
            .field("memory", &self.memory)
            .finish()
    }
}
