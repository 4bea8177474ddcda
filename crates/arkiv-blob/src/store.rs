use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use arkiv_types::{StorageError, StorageResult};

const STREAMS_DIR: &str = "streams";
/// Retries when a concurrent delete prunes the directory chain mid-store.
const MAX_CREATE_ATTEMPTS: usize = 8;

/// Lower-case hex SHA-256 of `"{record_type}:{id}"`.
pub fn record_digest(record_type: &str, id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record_type.as_bytes());
    hasher.update(b":");
    hasher.update(id.as_bytes());
    hex::encode(hasher.finalize())
}

/// File store for binary streams.
///
/// Layout:
///
/// ```text
/// {base}/streams/{divider}/{d[0..3]}/{d[3..6]}/{d[6..9]}/{d}/{type}:{id}-{representation}
/// ```
///
/// where `d` is [`record_digest`] of the record.
#[derive(Clone, Debug)]
pub struct BlobStore {
    base_path: PathBuf,
}

impl BlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory segments below `{base}/streams`, divider first.
    fn segments(data_divider: &str, record_type: &str, id: &str) -> [String; 5] {
        let digest = record_digest(record_type, id);
        [
            data_divider.to_string(),
            digest[0..3].to_string(),
            digest[3..6].to_string(),
            digest[6..9].to_string(),
            digest,
        ]
    }

    fn file_name(record_type: &str, id: &str, representation: &str) -> String {
        format!("{record_type}:{id}-{representation}")
    }

    /// Full path of a stream. Does not touch the filesystem.
    pub fn blob_path(
        &self,
        data_divider: &str,
        record_type: &str,
        id: &str,
        representation: &str,
    ) -> PathBuf {
        let mut path = self.base_path.join(STREAMS_DIR);
        for segment in Self::segments(data_divider, record_type, id) {
            path.push(segment);
        }
        path.push(Self::file_name(record_type, id, representation));
        path
    }

    /// Copy `stream` into the blob for a record representation, replacing
    /// any previous content. Returns the number of bytes written.
    ///
    /// Directories created from `{base}/streams/{divider}` downward are made
    /// readable, writable, and searchable by everyone so that processes
    /// running under other users can share the tree.
    pub fn store(
        &self,
        data_divider: &str,
        record_type: &str,
        id: &str,
        representation: &str,
        stream: &mut dyn Read,
    ) -> StorageResult<u64> {
        let path = self.blob_path(data_divider, record_type, id, representation);
        let context = || format!("can not write stream {}", path.display());

        // A concurrent delete may prune directories between creating them
        // and creating the file; rebuild the chain and try again.
        let mut attempts = 0;
        let file = loop {
            self.create_blob_dirs(data_divider, record_type, id)?;
            match File::create(&path) {
                Ok(file) => break file,
                Err(e) if e.kind() == io::ErrorKind::NotFound && attempts < MAX_CREATE_ATTEMPTS => {
                    attempts += 1;
                }
                Err(e) => return Err(StorageError::io(context(), e)),
            }
        };
        let mut writer = BufWriter::new(file);
        let size = io::copy(stream, &mut writer).map_err(|e| StorageError::io(context(), e))?;
        writer.flush().map_err(|e| StorageError::io(context(), e))?;

        debug!(path = %path.display(), size, "stored stream");
        Ok(size)
    }

    fn create_blob_dirs(&self, data_divider: &str, record_type: &str, id: &str) -> StorageResult<()> {
        let streams = self.base_path.join(STREAMS_DIR);
        let segments = Self::segments(data_divider, record_type, id);
        let mut attempts = 0;
        'chain: loop {
            fs::create_dir_all(&streams).map_err(|e| {
                StorageError::io(format!("can not create directory {}", streams.display()), e)
            })?;
            let mut dir = streams.clone();
            for segment in &segments {
                dir.push(segment);
                match create_shared_dir(&dir) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound && attempts < MAX_CREATE_ATTEMPTS => {
                        attempts += 1;
                        continue 'chain;
                    }
                    Err(e) => {
                        return Err(StorageError::io(
                            format!("can not create directory {}", dir.display()),
                            e,
                        ))
                    }
                }
            }
            return Ok(());
        }
    }

    /// Open a stored blob for reading.
    ///
    /// Fails with `ResourceNotFound` if the blob does not exist.
    pub fn retrieve(
        &self,
        data_divider: &str,
        record_type: &str,
        id: &str,
        representation: &str,
    ) -> StorageResult<File> {
        let path = self.blob_path(data_divider, record_type, id, representation);
        File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::ResourceNotFound(format!(
                "could not read stream from disk, no such stream: {}",
                path.display()
            )),
            _ => StorageError::io(format!("can not read stream {}", path.display()), e),
        })
    }

    /// Delete a stored blob and every directory left empty above it, up to
    /// but never including the base path.
    ///
    /// Fails with `ResourceNotFound` if the blob does not exist.
    pub fn delete(
        &self,
        data_divider: &str,
        record_type: &str,
        id: &str,
        representation: &str,
    ) -> StorageResult<()> {
        let path = self.blob_path(data_divider, record_type, id, representation);
        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::ResourceNotFound(format!(
                "could not delete stream from disk, no such stream: {}",
                path.display()
            )),
            _ => StorageError::io(format!("can not delete stream {}", path.display()), e),
        })?;

        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.base_path || !dir.starts_with(&self.base_path) {
                break;
            }
            if !remove_empty_dir(dir)? {
                break;
            }
            current = dir.parent();
        }

        debug!(path = %path.display(), "deleted stream");
        Ok(())
    }
}

fn create_shared_dir(dir: &Path) -> io::Result<()> {
    match fs::create_dir(dir) {
        Ok(()) => set_shared_permissions(dir),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn set_shared_permissions(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dir, fs::Permissions::from_mode(0o777))
}

#[cfg(not(unix))]
fn set_shared_permissions(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Returns `true` if `dir` was empty and has been removed. A directory that
/// is already gone or was refilled concurrently stops pruning.
fn remove_empty_dir(dir: &Path) -> StorageResult<bool> {
    let context = || format!("can not delete directory {}", dir.display());
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
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty) => {
            Ok(false)
        }
        Err(e) => Err(StorageError::io(context(), e)),
    }
}
