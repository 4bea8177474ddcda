//! Term index for Arkiv.
//!
//! Maintains a secondary index from storage terms to record ids, used to
//! answer equality filters without scanning documents, and keeps the exact
//! term set last stored per record for retrieval.
//!
//! # Key Types
//!
//! - [`TermIndex`] -- The two-tier index (flattened values + original sets)
//! - [`TermSnapshot`] -- Serializable per-divider image of the index

pub mod index;
pub mod snapshot;

pub use index::{IndexedValue, TermIndex};
pub use snapshot::{CollectedTermsEntry, StoredTermEntry, TermSnapshot};
