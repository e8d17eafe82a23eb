//! # Domain Model: The Persistent Notepad Tree
//!
//! This module defines the core data structures: [`Notepad`], [`Section`],
//! [`Note`], [`Source`], and [`Asset`].
//!
//! ## Value-Oriented Mutation
//!
//! Every entity is an immutable value. "Mutation" (`add_section`,
//! `add_note`, `add_element`, `add_source`, `add_asset`, `touch`) takes
//! `&self` and returns a new value; the receiver is never altered, so any
//! reader holding an older version is unaffected by later edits. The one
//! deliberate sharing point is [`Asset`] payloads, which are `Arc`-backed
//! and never copied when the surrounding tree is cloned.
//!
//! ## Identity: `internalRef`
//!
//! Every Section and Note carries an [`InternalRef`], minted once at
//! creation and preserved across every update. It is the only stable
//! cross-representation identity — titles are not unique and must never be
//! used as keys.
//!
//! ## Parent Back-References
//!
//! `Section.parent` / `Note.parent` hold the *owning section's* ref
//! (`None` for top-level sections). They are navigation hints, not
//! ownership edges: ownership flows strictly downward (Notepad → Section →
//! Note). Because the link is a ref rather than a pointer, and refs never
//! change across versions, a copy-on-write update of an ancestor cannot
//! leave a descendant's link stale. `add_section`/`add_note` still assign
//! the child's link from the receiver, so the invariant holds locally:
//! a child's `parent` always names the node whose children vec holds it.
//!
//! ## Timestamps
//!
//! `Notepad.last_modified` advances only through explicit [`Notepad::touch`]
//! / [`Notepad::modified`] calls. Structural edits never move it; the
//! search staleness contract in [`crate::search`] depends on that.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::NoteElement;

/// Stable identifier for a Section or Note, minted once and never
/// regenerated by any clone/update operation.
///
/// A string rather than a [`Uuid`] so refs restored from historic
/// serialized shells survive byte-for-byte.
pub type InternalRef = String;

pub(crate) fn mint_ref() -> InternalRef {
    Uuid::new_v4().to_string()
}

// A hashtag token: `#` followed by word characters or hyphens.
static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[A-Za-z0-9_-]+").expect("valid hashtag regex"));

/// A bibliography entry on a [`Note`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: usize,
    pub item: String,
}

/// Identity plus an immutable binary payload, referenced by UUID from
/// note elements via the asset sentinel contract.
///
/// The payload is `Arc`-backed: cloning a Notepad (which every
/// copy-on-write operation does) shares the bytes, it never copies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub uuid: Uuid,
    pub data: Arc<[u8]>,
}

impl Asset {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            data: data.into(),
        }
    }

    /// For import paths where the asset identity already exists externally.
    pub fn with_uuid(uuid: Uuid, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            uuid,
            data: data.into(),
        }
    }
}

/// A leaf document unit: title, timestamp, ordered elements, and an
/// ordered bibliography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub time: DateTime<Utc>,
    #[serde(rename = "internalRef")]
    pub internal_ref: InternalRef,
    /// Ref of the owning section. Navigation only; rebuilt by structural
    /// operations, never dereferenced as an ownership edge.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<InternalRef>,
    pub elements: Vec<NoteElement>,
    pub bibliography: Vec<Source>,
}

impl Note {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_ref(title, mint_ref())
    }

    /// For restore paths where the ref already exists.
    pub fn with_ref(title: impl Into<String>, internal_ref: InternalRef) -> Self {
        Self {
            title: title.into(),
            time: Utc::now(),
            internal_ref,
            parent: None,
            elements: Vec::new(),
            bibliography: Vec::new(),
        }
    }

    /// Returns a new note with `element` appended. The receiver is unchanged.
    pub fn add_element(&self, element: NoteElement) -> Note {
        let mut next = self.clone();
        next.elements.push(element);
        next
    }

    /// Returns a new note with `source` appended to the bibliography.
    pub fn add_source(&self, source: Source) -> Note {
        let mut next = self.clone();
        next.bibliography.push(source);
        next
    }

    /// All hashtag tokens across this note's element contents, in order of
    /// appearance. Duplicates are retained; buckets in the search index
    /// deduplicate, the note itself does not.
    pub fn get_hashtags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        for element in &self.elements {
            for found in HASHTAG.find_iter(&element.content) {
                tags.push(found.as_str().to_string());
            }
        }
        tags
    }

    /// Matches this note against a query.
    ///
    /// - empty query: every note matches;
    /// - `#`-prefixed: exact token match against [`Note::get_hashtags`]
    ///   (a hashtag prefix does not match);
    /// - anything else: case-insensitive substring match on the title.
    pub fn search(&self, query: &str) -> Option<&Note> {
        if query.is_empty() {
            return Some(self);
        }
        let matched = if query.starts_with('#') {
            self.get_hashtags().iter().any(|tag| tag == query)
        } else {
            self.title.to_lowercase().contains(&query.to_lowercase())
        };
        matched.then_some(self)
    }
}

/// An internal tree node: ordered child sections and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(rename = "internalRef")]
    pub internal_ref: InternalRef,
    /// Ref of the parent section; `None` when owned directly by the
    /// notepad root. Navigation only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<InternalRef>,
    pub sections: Vec<Section>,
    pub notes: Vec<Note>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_ref(title, mint_ref())
    }

    /// For restore paths where the ref already exists.
    pub fn with_ref(title: impl Into<String>, internal_ref: InternalRef) -> Self {
        Self {
            title: title.into(),
            internal_ref,
            parent: None,
            sections: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Returns a new section with `section` appended as a child, its
    /// back-reference pointing at the receiver. Insertion-ordered.
    pub fn add_section(&self, section: Section) -> Section {
        let mut next = self.clone();
        let mut child = section;
        child.parent = Some(next.internal_ref.clone());
        next.sections.push(child);
        next
    }

    /// Returns a new section with `note` appended, its back-reference
    /// pointing at the receiver.
    pub fn add_note(&self, note: Note) -> Section {
        let mut next = self.clone();
        let mut child = note;
        child.parent = Some(next.internal_ref.clone());
        next.notes.push(child);
        next
    }
}

/// The root aggregate: title, last-modified stamp, top-level sections,
/// assets, and the list of asset UUIDs considered in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notepad {
    pub title: String,
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
    pub sections: Vec<Section>,
    /// Binary payloads are external collaborators' concern; they never
    /// travel with the serialized tree.
    #[serde(skip)]
    pub assets: Vec<Asset>,
    #[serde(rename = "notepadAssets")]
    pub notepad_assets: Vec<Uuid>,
}

impl Notepad {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            last_modified: Utc::now(),
            sections: Vec::new(),
            assets: Vec::new(),
            notepad_assets: Vec::new(),
        }
    }

    /// Returns a new notepad with `section` appended at the top level.
    /// Top-level sections carry no parent ref; their owner is the root.
    pub fn add_section(&self, section: Section) -> Notepad {
        let mut next = self.clone();
        let mut child = section;
        child.parent = None;
        next.sections.push(child);
        next
    }

    /// Returns a new notepad holding `asset` and marking its UUID in use.
    pub fn add_asset(&self, asset: Asset) -> Notepad {
        let mut next = self.clone();
        next.notepad_assets.push(asset.uuid);
        next.assets.push(asset);
        next
    }

    /// Returns a new notepad stamped with `at`. The only way
    /// `last_modified` ever moves; structural edits never touch it.
    pub fn touch(&self, at: DateTime<Utc>) -> Notepad {
        let mut next = self.clone();
        next.last_modified = at;
        next
    }

    /// [`Notepad::touch`] with the current instant.
    pub fn modified(&self) -> Notepad {
        self.touch(Utc::now())
    }
}
