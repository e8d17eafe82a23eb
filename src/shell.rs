//! # Serialized Shell Restore
//!
//! The boundary for bringing a previously serialized notepad back into the
//! model. Translators hand this module the outer JSON shape
//!
//! ```json
//! {
//!   "title": "...",
//!   "lastModified": "2021-03-09T18:56:22.174+01:00",
//!   "notepadAssets": ["uuid", "..."],
//!   "sections": [ { "title": "...", "internalRef": "...",
//!                   "sections": [...], "notes": [...] } ]
//! }
//! ```
//!
//! and get back a fully linked [`Notepad`]. Two boundary rules live here:
//!
//! - **Encrypted payloads.** When `sections` arrives as an opaque string
//!   instead of the array shape, the payload is encrypted. Decryption is an
//!   external collaborator's job; restore fails with
//!   [`NotepadError::EncryptedPayload`] so it can run first.
//! - **Timestamps.** `lastModified` uses a fixed millisecond +
//!   timezone-offset rendering. [`shell_timestamp`] emits the same form, so
//!   restored-then-rewritten shells are byte-stable.
//!
//! The restore path rebuilds the tree exclusively through the model's
//! `add_*` operations, which keeps the parent back-reference invariant
//! intact, and re-runs element construction so checklist normalization
//! applies to shells written before it existed. Historic `internalRef`s
//! are preserved byte-for-byte.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::element::NoteElement;
use crate::error::{NotepadError, Result};
use crate::model::{InternalRef, Note, Notepad, Section, Source};

/// Fixed rendering for shell timestamps: milliseconds plus a numeric
/// timezone offset, e.g. `2021-03-09T18:56:22.174+01:00`.
pub const SHELL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Formats a timestamp the way shells expect.
pub fn shell_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn parse_shell_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_str(raw, SHELL_TIME_FORMAT)?;
    Ok(parsed.with_timezone(&Utc))
}

/// The outer serialized shape of a notepad.
#[derive(Debug, Clone, Deserialize)]
pub struct NotepadShell {
    pub title: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    #[serde(rename = "notepadAssets", default)]
    pub notepad_assets: Vec<Uuid>,
    #[serde(default)]
    pub sections: SectionsField,
}

/// `sections` is either the real array shape or an opaque encrypted blob.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SectionsField {
    Sections(Vec<SectionShell>),
    Encrypted(String),
}

impl Default for SectionsField {
    fn default() -> Self {
        SectionsField::Sections(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionShell {
    pub title: String,
    #[serde(rename = "internalRef")]
    pub internal_ref: InternalRef,
    #[serde(default)]
    pub sections: Vec<SectionShell>,
    #[serde(default)]
    pub notes: Vec<NoteShell>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteShell {
    pub title: String,
    /// Same fixed format as `lastModified`. Older shells omit it; the
    /// restore instant is used instead.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "internalRef")]
    pub internal_ref: InternalRef,
    #[serde(default)]
    pub elements: Vec<NoteElement>,
    #[serde(default)]
    pub bibliography: Vec<Source>,
}

impl Notepad {
    /// Restores a notepad from its parsed shell.
    pub fn from_shell(shell: NotepadShell) -> Result<Notepad> {
        let sections = match shell.sections {
            SectionsField::Sections(sections) => sections,
            SectionsField::Encrypted(_) => return Err(NotepadError::EncryptedPayload),
        };

        let last_modified = parse_shell_timestamp(&shell.last_modified)?;
        let mut notepad = Notepad::new(shell.title).touch(last_modified);
        notepad.notepad_assets = shell.notepad_assets;
        for section in sections {
            notepad = notepad.add_section(restore_section(section)?);
        }
        log::debug!(
            "restored notepad {:?}: {} top-level sections, {} assets in use",
            notepad.title,
            notepad.sections.len(),
            notepad.notepad_assets.len()
        );
        Ok(notepad)
    }

    /// Restores a notepad straight from shell JSON.
    pub fn from_shell_json(json: &str) -> Result<Notepad> {
        let shell: NotepadShell = serde_json::from_str(json)?;
        Notepad::from_shell(shell)
    }
}

fn restore_section(shell: SectionShell) -> Result<Section> {
    let mut section = Section::with_ref(shell.title, shell.internal_ref);
    for child in shell.sections {
        section = section.add_section(restore_section(child)?);
    }
    for note in shell.notes {
        section = section.add_note(restore_note(note)?);
    }
    Ok(section)
}

fn restore_note(shell: NoteShell) -> Result<Note> {
    let mut note = Note::with_ref(shell.title, shell.internal_ref);
    if let Some(raw) = &shell.time {
        note.time = parse_shell_timestamp(raw)?;
    }
    for element in shell.elements {
        // Re-run construction so normalization applies to old shells.
        note = note.add_element(NoteElement::new(element.kind, element.args, element.content));
    }
    for source in shell.bibliography {
        note = note.add_source(source);
    }
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELL: &str = r#"{
        "title": "Uni",
        "lastModified": "2021-03-09T18:56:22.174+01:00",
        "notepadAssets": ["9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d"],
        "sections": [
            {
                "title": "Maths",
                "internalRef": "maths-ref",
                "sections": [
                    { "title": "Algebra", "internalRef": "algebra-ref" }
                ],
                "notes": [
                    {
                        "title": "Lecture 1",
                        "time": "2021-03-08T10:00:00.000+00:00",
                        "internalRef": "lecture-ref",
                        "elements": [
                            {
                                "type": "markdown",
                                "args": { "id": "markdown1", "x": "0px", "y": "0px",
                                          "width": "auto", "height": "auto" },
                                "content": "- [] revise #todo"
                            }
                        ],
                        "bibliography": [ { "id": 1, "item": "https://example.org" } ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_restore_rebuilds_tree_and_links() {
        let notepad = Notepad::from_shell_json(SHELL).unwrap();

        assert_eq!(notepad.title, "Uni");
        assert_eq!(notepad.sections.len(), 1);
        let maths = &notepad.sections[0];
        assert_eq!(maths.internal_ref, "maths-ref");
        assert_eq!(maths.parent, None);
        assert_eq!(maths.sections[0].internal_ref, "algebra-ref");
        assert_eq!(maths.sections[0].parent.as_deref(), Some("maths-ref"));
        assert_eq!(maths.notes[0].internal_ref, "lecture-ref");
        assert_eq!(maths.notes[0].parent.as_deref(), Some("maths-ref"));
        assert_eq!(maths.notes[0].bibliography.len(), 1);
    }

    #[test]
    fn test_restore_parses_fixed_timestamp() {
        let notepad = Notepad::from_shell_json(SHELL).unwrap();
        // 18:56:22.174+01:00 is 17:56:22.174 UTC.
        assert_eq!(
            shell_timestamp(&notepad.last_modified),
            "2021-03-09T17:56:22.174+00:00"
        );
        assert_eq!(
            shell_timestamp(&notepad.sections[0].notes[0].time),
            "2021-03-08T10:00:00.000+00:00"
        );
    }

    #[test]
    fn test_restore_applies_checklist_normalization() {
        let notepad = Notepad::from_shell_json(SHELL).unwrap();
        assert_eq!(
            notepad.sections[0].notes[0].elements[0].content,
            "- [ ] revise #todo"
        );
    }

    #[test]
    fn test_restore_carries_asset_uuids() {
        let notepad = Notepad::from_shell_json(SHELL).unwrap();
        assert_eq!(notepad.notepad_assets.len(), 1);
        assert_eq!(
            notepad.notepad_assets[0].to_string(),
            "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d"
        );
    }

    #[test]
    fn test_encrypted_sections_are_rejected() {
        let json = r#"{
            "title": "Secret",
            "lastModified": "2021-03-09T18:56:22.174+01:00",
            "notepadAssets": [],
            "sections": "U2FsdGVkX1+2pX9PGlCbPQ=="
        }"#;
        assert!(matches!(
            Notepad::from_shell_json(json),
            Err(NotepadError::EncryptedPayload)
        ));
    }

    #[test]
    fn test_malformed_timestamp_fails() {
        let json = r#"{
            "title": "Bad clock",
            "lastModified": "yesterday-ish",
            "notepadAssets": [],
            "sections": []
        }"#;
        assert!(matches!(
            Notepad::from_shell_json(json),
            Err(NotepadError::Timestamp(_))
        ));
    }

    #[test]
    fn test_missing_sections_field_defaults_empty() {
        let json = r#"{ "title": "Empty", "lastModified": "2021-03-09T18:56:22.174+01:00" }"#;
        let notepad = Notepad::from_shell_json(json).unwrap();
        assert!(notepad.sections.is_empty());
        assert!(notepad.notepad_assets.is_empty());
    }

    #[test]
    fn test_restored_tree_flattens_cleanly() {
        let flat = Notepad::from_shell_json(SHELL).unwrap().flatten();
        assert_eq!(flat.sections.len(), 2);
        assert_eq!(flat.notes.len(), 1);
        assert!(flat.notes.contains_key("lecture-ref"));
        assert_eq!(
            flat.sections["algebra-ref"].parent_ref.as_deref(),
            Some("maths-ref")
        );
    }
}
