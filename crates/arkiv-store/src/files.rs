//! On-disk snapshot layout.
//!
//! ```text
//! {base}/{divider}/{recordType}_{divider}.json    records of one type
//! {base}/{divider}/collectedData_{divider}.json   term index entries
//! {base}/{divider}/linkLists_{divider}.json       outgoing links
//! {base}/streams/...                              blobs, never replayed
//! ```
//!
//! Files are replaced by writing a temporary file in the target directory
//! and renaming it over the old one, so a reader sees either the previous
//! or the new snapshot.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use arkiv_types::{DataGroup, StorageError, StorageResult};

/// Logical name of term index snapshot files.
pub const COLLECTED_DATA: &str = "collectedData";
/// Logical name of link graph snapshot files.
pub const LINK_LISTS: &str = "linkLists";
/// Directory under the base path reserved for blobs.
pub const STREAMS_DIR: &str = "streams";

const EXTENSION: &str = "json";

/// One record in a record-type snapshot file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFileEntry {
    pub id: String,
    pub data_divider: String,
    pub data: DataGroup,
}

/// Split `{name}_{divider}.{ext}` into `(name, divider)`.
///
/// The name is everything before the last `_`, so record type names may
/// contain underscores but dividers may not.
pub fn parse_file_name(file_name: &str) -> Option<(&str, &str)> {
    let (stem, _ext) = file_name.rsplit_once('.')?;
    let (name, divider) = stem.rsplit_once('_')?;
    if name.is_empty() || divider.is_empty() {
        return None;
    }
    Some((name, divider))
}

/// Check that a record of `record_type` under `data_divider` can be written
/// to, and replayed from, `{base}/{divider}/{type}_{divider}.json`.
///
/// Dividers may not contain `_` (file names split at the last one) and may
/// not be the blob directory. Neither name may be empty, start with `.`, or
/// contain a path separator. Record types may not shadow the index and link
/// snapshot names.
pub fn validate_names(record_type: &str, data_divider: &str) -> StorageResult<()> {
    check_path_segment("record type", record_type)?;
    check_path_segment("data divider", data_divider)?;
    if record_type == COLLECTED_DATA || record_type == LINK_LISTS {
        return Err(StorageError::InvalidName(format!(
            "record type `{record_type}` is reserved"
        )));
    }
    if data_divider.contains('_') {
        return Err(StorageError::InvalidName(format!(
            "data divider `{data_divider}` contains `_`"
        )));
    }
    if data_divider == STREAMS_DIR {
        return Err(StorageError::InvalidName(format!(
            "data divider `{data_divider}` is reserved"
        )));
    }
    Ok(())
}

fn check_path_segment(what: &str, name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::InvalidName(format!("{what} is empty")));
    }
    if name.starts_with('.') || name.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidName(format!(
            "{what} `{name}` is not a plain file name"
        )));
    }
    Ok(())
}

/// Path of the snapshot file for `name` under `divider`.
pub fn snapshot_path(base: &Path, name: &str, divider: &str) -> PathBuf {
    base.join(divider)
        .join(format!("{name}_{divider}.{EXTENSION}"))
}

/// Read and parse a JSON snapshot file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let file = File::open(path).map_err(|e| {
        StorageError::io(format!("can not read file {}", path.display()), e)
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| StorageError::json(format!("can not parse file {}", path.display()), e))
}

/// Write `value` as JSON to `path`, replacing any existing file atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let context = || format!("can not write file {}", path.display());
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::io(context(), io::Error::from(io::ErrorKind::InvalidInput)))?;
    fs::create_dir_all(dir).map_err(|e| StorageError::io(context(), e))?;

    let tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(context(), e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| StorageError::json(context(), e))?;
        writer.flush().map_err(|e| StorageError::io(context(), e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| StorageError::io(context(), e))?;
    tmp.persist(path)
        .map_err(|e| StorageError::io(context(), e.error))?;

    debug!(path = %path.display(), "wrote snapshot");
    Ok(())
}

/// Remove a snapshot file if present, then its directory if now empty.
pub fn remove_snapshot(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed snapshot"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(StorageError::io(
                format!("can not delete file {}", path.display()),
                e,
            ))
        }
    }
    if let Some(dir) = path.parent() {
        remove_dir_if_empty(dir)?;
    }
    Ok(())
}

/// Remove `dir` if it exists and has no entries. Returns `true` if removed.
pub fn remove_dir_if_empty(dir: &Path) -> StorageResult<bool> {
    let context = || format!("can not remove directory {}", dir.display());
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(StorageError::io(context(), e)),
    };
    if entries.next().is_some() {
        return Ok(false);
    }
    match fs::remove_dir(dir) {
        Ok(()) => Ok(true),
        // Raced with another writer or pruner.
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty) => {
            Ok(false)
        }
        Err(e) => Err(StorageError::io(context(), e)),
    }
}
