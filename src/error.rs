use thiserror::Error;

use crate::model::InternalRef;

#[derive(Error, Debug)]
pub enum NotepadError {
    #[error("No section with internalRef {0} exists in the flat structure")]
    UnresolvedParent(InternalRef),

    #[error("Note {0} has no owning section in the flat structure")]
    DetachedNote(InternalRef),

    #[error("{0} flat sections are unreachable from the notepad root")]
    UnreachableSections(usize),

    #[error("Sections are encrypted; decrypt the payload before restoring")]
    EncryptedPayload,

    #[error("Bad timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotepadError>;
