//! Foundation types for Arkiv.
//!
//! This crate provides the value types shared by every Arkiv storage crate:
//! the hierarchical document tree, the terms extracted from it for indexing,
//! link identities, query filters, and the common error taxonomy.
//!
//! # Key Types
//!
//! - [`DataGroup`] — Hierarchical document node (name, value, children, attributes)
//! - [`StorageTerm`] — Indexed scalar extracted from a document at write time
//! - [`Link`] — `(type, id)` identity of a record used as a graph endpoint
//! - [`Filter`] — Conjunctive equality filter with 1-based pagination bounds
//! - [`StorageReadResult`] — Page of documents plus the unpaginated match count
//! - [`StorageError`] — Conflict / NotFound / Io / ResourceNotFound

pub mod data;
pub mod error;
pub mod filter;
pub mod link;
pub mod result;
pub mod term;

pub use data::DataGroup;
pub use error::{StorageError, StorageResult};
pub use filter::{Condition, Filter, Operator, Part};
pub use link::Link;
pub use result::StorageReadResult;
pub use term::StorageTerm;
