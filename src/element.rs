//! # Note Content Blocks
//!
//! A note's body is an ordered list of [`NoteElement`]s: markdown text,
//! images, drawings, attached files, recordings, and PDFs. Every element
//! carries positional/size metadata in [`ElementArgs`] and either literal
//! content or the [`ASSET_SENTINEL`] marker.
//!
//! ## The Asset Sentinel
//!
//! Binary payloads do not live inline. An element whose `content` equals
//! `"AS"` stores its real payload in the [`crate::model::Asset`] whose UUID
//! is in `args.ext`. Consumers must honor that indirection; the model only
//! guarantees the reference survives every clone/flatten/reconstruct cycle.
//!
//! ## Checklist Normalization
//!
//! Users write GFM task items in chaotic forms. The canonical unchecked
//! form is `[ ]`; the shorthand `[]` (no space) is rewritten at element
//! construction, once. Items already written `[ ]`, `[x]`, or `[X]` are
//! left alone, and the rewrite only fires on list-item checkboxes, never on
//! arbitrary bracket pairs in prose.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Content marker meaning "the real payload is the Asset named by `args.ext`".
pub const ASSET_SENTINEL: &str = "AS";

// Matches an empty checkbox at the head of a list item: `- []`, `* []`,
// `+ []`, `1. []`, with any leading indentation.
static UNCHECKED_TASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\s*(?:[-*+]|\d+\.)\s+)\[\]").expect("valid checklist regex"));

/// The kind of content a [`NoteElement`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Markdown,
    Image,
    Drawing,
    File,
    Recording,
    Pdf,
}

/// Positional, size, and type-specific metadata attached to an element.
///
/// `x`/`y`/`width`/`height` are free-form CSS-like strings (`"10px"`,
/// `"auto"`) because the model never interprets them; they round-trip as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementArgs {
    pub id: String,
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
    /// Explicit optimization override. `None` falls back to the per-kind
    /// default in [`can_optimise_element`].
    #[serde(rename = "canOptimise", skip_serializing_if = "Option::is_none", default)]
    pub can_optimise: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub filename: Option<String>,
    /// UUID of the backing Asset when `content` is [`ASSET_SENTINEL`].
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ext: Option<String>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl ElementArgs {
    /// Args for a freshly placed element: origin position, auto-sized.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: "0px".to_string(),
            y: "0px".to_string(),
            width: "auto".to_string(),
            height: "auto".to_string(),
            can_optimise: None,
            filename: None,
            ext: None,
            due_date: None,
        }
    }
}

/// A single content block owned by a [`crate::model::Note`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub args: ElementArgs,
    pub content: String,
}

impl NoteElement {
    /// Creates an element, normalizing markdown checklists once up front.
    ///
    /// Normalization happens here and only here; reads never rewrite.
    pub fn new(kind: ElementKind, args: ElementArgs, content: impl Into<String>) -> Self {
        let content = content.into();
        let content = if kind == ElementKind::Markdown {
            normalize_checklists(&content)
        } else {
            content
        };
        Self {
            kind,
            args,
            content,
        }
    }

    /// Shorthand for a markdown block with default placement args.
    pub fn markdown(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(ElementKind::Markdown, ElementArgs::new(id), content)
    }

    /// Whether this element's payload lives in an external Asset.
    pub fn is_asset_backed(&self) -> bool {
        self.content == ASSET_SENTINEL
    }
}

/// Rewrites the `[]` shorthand on task-list items to the canonical `[ ]`.
pub fn normalize_checklists(content: &str) -> String {
    UNCHECKED_TASK.replace_all(content, "${1}[ ]").into_owned()
}

/// Whether external tooling may optimize (e.g. recompress) this element.
///
/// An explicit `canOptimise` flag wins in either direction. Without one,
/// only images are eligible.
pub fn can_optimise_element(element: &NoteElement) -> bool {
    match element.args.can_optimise {
        Some(explicit) => explicit,
        None => element.kind == ElementKind::Image,
    }
}
