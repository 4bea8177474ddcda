//! Link graph for Arkiv.
//!
//! Tracks directed links between records in both directions so that
//! "which records point at this one" can be answered without scanning.
//!
//! # Key Types
//!
//! - [`LinkGraph`] -- Outgoing and incoming adjacency sets
//! - [`LinkListEntry`] -- Serializable outgoing adjacency of one record

pub mod graph;

pub use graph::{LinkGraph, LinkListEntry};
