//! Blob storage for Arkiv.
//!
//! Binary streams ("representations" of a record, such as a master file or
//! a thumbnail) are stored as plain files under `{base}/streams/`. The
//! directory of a record's streams is derived from the SHA-256 of
//! `"{type}:{id}"` and sharded three levels deep, so no single directory
//! grows unbounded.
//!
//! The blob store is independent of record storage: deleting a record does
//! not delete its streams.

pub mod store;

pub use store::{record_digest, BlobStore};
