//! # Notetree Architecture
//!
//! Notetree is the data-modeling core of a hierarchical note-taking
//! document. It is a library with no I/O: format translators, encryption,
//! asset storage, and UIs are external collaborators that talk to this
//! crate through a small set of value-returning operations.
//!
//! ## The Three Representations
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Tree (model/, element/)                                    │
//! │  - Notepad → Section → Note → NoteElement / Source          │
//! │  - Immutable values; every edit returns a new version       │
//! │  - internalRef: the one stable identity across versions     │
//! └─────────────────────────────────────────────────────────────┘
//!                  │ flatten()            ▲ to_notepad()
//!                  ▼                      │
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Flat (flat/)                                               │
//! │  - Ref-keyed maps: O(1) lookup, order-preserving            │
//! │  - Round-trips back to the exact tree shape                 │
//! └─────────────────────────────────────────────────────────────┘
//!                  │ notes feed
//!                  ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Index (search/)                                            │
//! │  - Trie: title prefix search + exact hashtag lookup         │
//! │  - SearchRegistry: per-title cache with staleness rebuilds  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ground Rules
//!
//! - **No in-place mutation.** `add_section` / `add_note` / `add_element` /
//!   `add_source` / `add_asset` / `touch` all take `&self` and return a new
//!   value. Concurrent readers of an old version are never invalidated.
//! - **Refs, not pointers.** Parent back-references are `internalRef`
//!   lookups, so copy-on-write updates cannot leave them stale.
//! - **Translators use the operations.** External importers/exporters must
//!   build trees through the `add_*` surface (or [`shell`] restore), never
//!   by assembling fields directly, or the back-reference invariant breaks.
//! - **Fail fast on corrupt flat input.** Reconstruction never drops or
//!   re-homes an orphaned node; it returns an error.

pub mod element;
pub mod error;
pub mod flat;
pub mod model;
pub mod search;
pub mod shell;

pub use element::{
    can_optimise_element, normalize_checklists, ElementArgs, ElementKind, NoteElement,
    ASSET_SENTINEL,
};
pub use error::{NotepadError, Result};
pub use flat::{FlatNotepad, FlatSection};
pub use model::{Asset, InternalRef, Note, Notepad, Section, Source};
pub use search::{SearchRegistry, Trie};
pub use shell::{shell_timestamp, NotepadShell, SHELL_TIME_FORMAT};
