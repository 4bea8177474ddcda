//! The [`LinkGraph`] structure.
//!
//! Edges are stored twice: `outgoing[from]` holds every target of a record
//! and `incoming[to]` holds every record pointing at `to`.
//!
//! # Invariants
//!
//! - `incoming[to]` contains `from` if and only if `outgoing[from]` contains
//!   `to`. This holds after every public mutation.
//! - No empty adjacency set is ever kept.
//! - Targets are sets: the same edge added twice is stored once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use arkiv_types::Link;

/// Persisted outgoing adjacency of one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkListEntry {
    pub from: Link,
    pub to: Vec<Link>,
}

#[derive(Clone, Debug)]
struct Outgoing {
    /// Divider of the source record; persistence partitions on it.
    data_divider: String,
    targets: BTreeSet<Link>,
}

#[derive(Debug, Default)]
struct Inner {
    outgoing: BTreeMap<Link, Outgoing>,
    incoming: BTreeMap<Link, BTreeSet<Link>>,
}

/// Bidirectional adjacency between records.
#[derive(Debug, Default)]
pub struct LinkGraph {
    inner: RwLock<Inner>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Set the outgoing links of `from` to `targets`.
    ///
    /// Does nothing if `targets` is empty. Any previous outgoing links of
    /// `from` are replaced.
    pub fn store_links(&self, from: &Link, targets: &BTreeSet<Link>, data_divider: &str) {
        if targets.is_empty() {
            return;
        }
        let mut inner = self.inner.write().expect("link graph lock poisoned");
        inner.remove_outgoing(from);
        for to in targets {
            inner
                .incoming
                .entry(to.clone())
                .or_default()
                .insert(from.clone());
        }
        inner.outgoing.insert(
            from.clone(),
            Outgoing {
                data_divider: data_divider.to_string(),
                targets: targets.clone(),
            },
        );
        debug!(from = %from, count = targets.len(), "stored links");
    }

    /// Remove every outgoing link of `from` and the matching incoming entries.
    pub fn remove_links(&self, from: &Link) {
        let mut inner = self.inner.write().expect("link graph lock poisoned");
        if inner.remove_outgoing(from) {
            debug!(from = %from, "removed links");
        }
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Records linking to `to`.
    pub fn links_to_record(&self, to: &Link) -> BTreeSet<Link> {
        let inner = self.inner.read().expect("link graph lock poisoned");
        inner.incoming.get(to).cloned().unwrap_or_default()
    }

    /// Records `from` links to.
    pub fn links_from_record(&self, from: &Link) -> BTreeSet<Link> {
        let inner = self.inner.read().expect("link graph lock poisoned");
        inner
            .outgoing
            .get(from)
            .map(|o| o.targets.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if any record links to `to`.
    pub fn links_exist_for_record(&self, to: &Link) -> bool {
        let inner = self.inner.read().expect("link graph lock poisoned");
        inner.incoming.contains_key(to)
    }

    /// Number of records with outgoing links.
    pub fn len(&self) -> usize {
        self.inner.read().expect("link graph lock poisoned").outgoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Outgoing adjacency of every record, partitioned by data divider.
    pub fn snapshot_by_divider(&self) -> BTreeMap<String, Vec<LinkListEntry>> {
        let inner = self.inner.read().expect("link graph lock poisoned");
        let mut out: BTreeMap<String, Vec<LinkListEntry>> = BTreeMap::new();
        for (from, outgoing) in &inner.outgoing {
            out.entry(outgoing.data_divider.clone())
                .or_default()
                .push(LinkListEntry {
                    from: from.clone(),
                    to: outgoing.targets.iter().cloned().collect(),
                });
        }
        out
    }

    /// Load a divider's persisted adjacency, rebuilding incoming sets.
    pub fn restore(&self, data_divider: &str, entries: Vec<LinkListEntry>) {
        for entry in entries {
            let targets: BTreeSet<Link> = entry.to.into_iter().collect();
            self.store_links(&entry.from, &targets, data_divider);
        }
    }
}

impl Inner {
    /// Returns `true` if `from` had outgoing links.
    fn remove_outgoing(&mut self, from: &Link) -> bool {
        let Some(previous) = self.outgoing.remove(from) else {
            return false;
        };
        for to in &previous.targets {
            if let Some(sources) = self.incoming.get_mut(to) {
                sources.remove(from);
                if sources.is_empty() {
                    self.incoming.remove(to);
                }
            }
        }
        true
    }
}
