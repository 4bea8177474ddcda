//! Record storage for Arkiv.
//!
//! Documents are stored keyed by `(record type, record id)`. Every write
//! also maintains the [`TermIndex`](arkiv_index::TermIndex) used for
//! equality filters and the [`LinkGraph`](arkiv_links::LinkGraph) used for
//! reverse-reference lookups.
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- map-backed store, the authoritative state
//! - [`DiskRecordStore`] -- wraps the in-memory store and rewrites JSON
//!   snapshot files under a base directory after every mutation
//!
//! Use [`open_record_store`] with a [`StorageConfig`] to pick one.
//!
//! # Design Rules
//!
//! 1. Documents are copied on the way in and on the way out.
//! 2. A mutation holds the record map's write lock for its whole sequence,
//!    so two creates of the same id can never both succeed.
//! 3. Reading a type also reads every type that implements it.
//! 4. Snapshot files are replaced by atomic rename, never rewritten in place.

pub mod config;
pub mod disk;
pub mod files;
pub mod memory;
pub mod traits;

pub use config::{open_record_store, Backend, StorageConfig};
pub use disk::DiskRecordStore;
pub use memory::{InMemoryRecordStore, StoredRecord, RECORD_TYPE};
pub use traits::RecordStore;
