//! # Search: Trie Index and Registry
//!
//! Searching a notepad goes through two layers:
//!
//! 1. [`Trie`] — a per-notepad index built from a [`FlatNotepad`]'s notes:
//!    character-trie prefix search over titles, exact-match lookup over
//!    hashtags.
//! 2. [`SearchRegistry`] — a cache of built tries keyed by notepad title,
//!    so repeated queries against the same notepad reuse an index instead
//!    of rebuilding per query.
//!
//! The registry is an owned value, not process-global state: callers
//! create one, scope it (per session, per workspace), and pass it where
//! searching happens. Multi-threaded callers wrap it in their own lock —
//! everything underneath is pure, in-memory computation.
//!
//! Staleness is wholesale: when [`Trie::should_reindex`] reports drift the
//! registry rebuilds the whole index from the flat projection; there is no
//! incremental delete.
//!
//! Titles are the registry key (a boundary contract, not an identity
//! claim): callers with two open notepads sharing a title must namespace
//! the key themselves.

pub mod trie;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::flat::FlatNotepad;
use crate::model::InternalRef;

pub use trie::Trie;

/// A cache of built search indexes, keyed by notepad title.
#[derive(Debug, Clone, Default)]
pub struct SearchRegistry {
    indexes: HashMap<String, Trie>,
}

impl SearchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh index for `flat`, rebuilding the cached one when
    /// the staleness check reports drift.
    pub fn index_for(&mut self, flat: &FlatNotepad) -> &Trie {
        match self.indexes.entry(flat.title.clone()) {
            Entry::Occupied(mut entry) => {
                if entry
                    .get()
                    .should_reindex(flat.last_modified, flat.notes.len())
                {
                    log::debug!(
                        "rebuilding search index for {:?} ({} notes)",
                        flat.title,
                        flat.notes.len()
                    );
                    entry.insert(Trie::from_flat(flat));
                }
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                log::debug!(
                    "building search index for {:?} ({} notes)",
                    flat.title,
                    flat.notes.len()
                );
                entry.insert(Trie::from_flat(flat))
            }
        }
    }

    /// Queries `flat`, rebuilding its index first if stale.
    pub fn search(&mut self, flat: &FlatNotepad, query: &str) -> Vec<InternalRef> {
        self.index_for(flat).search(query)
    }

    /// Drops the cached index for `title`, forcing the next query to
    /// rebuild.
    pub fn evict(&mut self, title: &str) -> bool {
        self.indexes.remove(title).is_some()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
