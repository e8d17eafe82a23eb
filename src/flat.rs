//! # FlatNotepad: The Reference-Indexed Projection
//!
//! A [`FlatNotepad`] is a derived, denormalized view of a [`Notepad`]: two
//! ref-keyed maps (minimal section descriptors and full notes) plus the
//! notepad's title, stamp, and in-use asset list. It gives O(1) lookup by
//! `internalRef`, feeds the search index, and reconstructs back into a
//! full tree via [`FlatNotepad::to_notepad`].
//!
//! ## Ordering
//!
//! Both maps are [`IndexMap`]s, so they iterate in depth-first insertion
//! order. That choice makes the round-trip law exact: for any notepad `n`,
//! `n.flatten().to_notepad()` preserves the set of refs, every
//! parent/child edge, sibling order within each level, and note contents.
//!
//! ## Reconstruction
//!
//! Flat maps carry no nesting, only `parentRef` links, and nothing
//! guarantees parents precede children in iteration order. `to_notepad`
//! therefore resolves the whole parent graph first (group by parent, then
//! attach recursively from the roots). Corrupt input fails fast rather
//! than silently dropping or re-homing nodes:
//!
//! - a `parentRef` naming no known section → [`NotepadError::UnresolvedParent`]
//! - a note without an owning section → [`NotepadError::DetachedNote`]
//! - sections that resolve but can never reach the root (a `parentRef`
//!   cycle) → [`NotepadError::UnreachableSections`]
//!
//! A FlatNotepad holds no ownership responsibility toward assets; only the
//! UUID list travels through the projection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NotepadError, Result};
use crate::model::{InternalRef, Note, Notepad, Section};

/// Minimal descriptor for one section: enough to rebuild the tree shape,
/// nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatSection {
    pub title: String,
    #[serde(rename = "internalRef")]
    pub internal_ref: InternalRef,
    /// Present only when the parent is itself a section; top-level
    /// sections carry `None`.
    #[serde(rename = "parentRef", skip_serializing_if = "Option::is_none", default)]
    pub parent_ref: Option<InternalRef>,
}

/// The flattened projection of a [`Notepad`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNotepad {
    pub title: String,
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
    pub sections: IndexMap<InternalRef, FlatSection>,
    pub notes: IndexMap<InternalRef, Note>,
    #[serde(rename = "notepadAssets")]
    pub notepad_assets: Vec<Uuid>,
}

impl FlatNotepad {
    /// An empty projection, for incremental building during import.
    pub fn new(title: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            last_modified,
            sections: IndexMap::new(),
            notes: IndexMap::new(),
            notepad_assets: Vec::new(),
        }
    }

    /// Returns a new projection with `section` recorded under its own ref.
    pub fn add_section(&self, section: FlatSection) -> FlatNotepad {
        let mut next = self.clone();
        next.sections.insert(section.internal_ref.clone(), section);
        next
    }

    /// Returns a new projection with `note` recorded under its own ref.
    /// The note's `parent` field is trusted as the owning section link.
    pub fn add_note(&self, note: Note) -> FlatNotepad {
        let mut next = self.clone();
        next.notes.insert(note.internal_ref.clone(), note);
        next
    }

    /// Rebuilds the full tree from the two flat maps, using only
    /// `internalRef`/`parentRef` links.
    pub fn to_notepad(&self) -> Result<Notepad> {
        // Pass 1: resolve the parent graph. Children grouped per parent,
        // preserving flat insertion order within each group.
        let mut child_sections: HashMap<Option<&str>, Vec<&FlatSection>> = HashMap::new();
        for flat in self.sections.values() {
            if let Some(parent_ref) = &flat.parent_ref {
                if !self.sections.contains_key(parent_ref) {
                    return Err(NotepadError::UnresolvedParent(parent_ref.clone()));
                }
            }
            child_sections
                .entry(flat.parent_ref.as_deref())
                .or_default()
                .push(flat);
        }

        let mut notes_by_section: HashMap<&str, Vec<&Note>> = HashMap::new();
        for note in self.notes.values() {
            let parent_ref = note
                .parent
                .as_deref()
                .ok_or_else(|| NotepadError::DetachedNote(note.internal_ref.clone()))?;
            if !self.sections.contains_key(parent_ref) {
                return Err(NotepadError::UnresolvedParent(parent_ref.to_string()));
            }
            notes_by_section.entry(parent_ref).or_default().push(note);
        }

        // Pass 2: attach from the roots down.
        let mut notepad = Notepad {
            title: self.title.clone(),
            last_modified: self.last_modified,
            sections: Vec::new(),
            assets: Vec::new(),
            notepad_assets: self.notepad_assets.clone(),
        };
        let mut attached = 0usize;
        for root in child_sections.get(&None).cloned().unwrap_or_default() {
            let section = build_section(root, &child_sections, &notes_by_section, &mut attached);
            notepad = notepad.add_section(section);
        }

        // Every ref resolved, but nodes trapped in a parentRef cycle can
        // still never reach the root. Refuse the partial tree.
        if attached != self.sections.len() {
            let orphaned = self.sections.len() - attached;
            log::warn!(
                "flat notepad {:?}: {} sections unreachable from the root",
                self.title,
                orphaned
            );
            return Err(NotepadError::UnreachableSections(orphaned));
        }

        Ok(notepad)
    }
}

fn build_section(
    flat: &FlatSection,
    child_sections: &HashMap<Option<&str>, Vec<&FlatSection>>,
    notes_by_section: &HashMap<&str, Vec<&Note>>,
    attached: &mut usize,
) -> Section {
    *attached += 1;
    let mut section = Section::with_ref(flat.title.clone(), flat.internal_ref.clone());
    let children = child_sections
        .get(&Some(flat.internal_ref.as_str()))
        .cloned()
        .unwrap_or_default();
    for child in children {
        let built = build_section(child, child_sections, notes_by_section, attached);
        section = section.add_section(built);
    }
    if let Some(notes) = notes_by_section.get(flat.internal_ref.as_str()) {
        for note in notes {
            section = section.add_note((*note).clone());
        }
    }
    section
}

impl Notepad {
    /// Projects this notepad into its flat form with a depth-first walk.
    pub fn flatten(&self) -> FlatNotepad {
        let mut flat = FlatNotepad::new(self.title.clone(), self.last_modified);
        flat.notepad_assets = self.notepad_assets.clone();
        for section in &self.sections {
            flatten_section(section, None, &mut flat);
        }
        flat
    }
}

fn flatten_section(section: &Section, parent_ref: Option<&InternalRef>, flat: &mut FlatNotepad) {
    flat.sections.insert(
        section.internal_ref.clone(),
        FlatSection {
            title: section.title.clone(),
            internal_ref: section.internal_ref.clone(),
            parent_ref: parent_ref.cloned(),
        },
    );
    for note in &section.notes {
        let mut note = note.clone();
        // Record the owning section as the note's parent link, whatever
        // the note carried before.
        note.parent = Some(section.internal_ref.clone());
        flat.notes.insert(note.internal_ref.clone(), note);
    }
    for child in &section.sections {
        flatten_section(child, Some(&section.internal_ref), flat);
    }
}
