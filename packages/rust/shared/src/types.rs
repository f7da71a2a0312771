//! Core domain types for steamlib aggregations.
//!
//! These are the flattened, application-facing shapes. Vendor wire objects
//! live in `steamlib-remote` and are mapped into these by `steamlib-core`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SteamError};

/// Page size for note-summary listings (the vendor's practical maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// Time zone sent with every note filter.
pub const DEFAULT_TIME_ZONE: &str = "America/Chicago";

/// The vendor's default sort field for note listings.
const DEFAULT_NOTE_ORDER: i32 = 0;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Which deployment of the note service to talk to.
///
/// Selects connection parameters only; the pipeline behaves identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    /// Map the `is_using_sandbox` flag onto an environment.
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox { Self::Sandbox } else { Self::Production }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = SteamError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(SteamError::validation(format!(
                "unknown environment '{other}': expected 'sandbox' or 'production'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Notebook / Note / Tag
// ---------------------------------------------------------------------------

/// A notebook with its fully assembled notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub guid: String,
    pub name: String,
    pub update_sequence_num: i32,
    /// Whether this is the account's default notebook.
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub is_published: bool,
    /// Vendor publishing settings, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishing: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_notebook_ids: Vec<i64>,
    /// Vendor sharing records, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<serde_json::Value>,
    /// Contained notes. Every note's `notebook_guid` equals `guid`.
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Lightweight listing record for a note; input to note assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub guid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub update_sequence_num: i32,
}

/// A fully assembled note.
///
/// Assembly only returns a `Note` after every tag lookup has finished, so
/// `tags.len() + unresolved_tag_guids.len() == tag_guids.len()` always holds
/// and an empty `tags` list means the note genuinely resolved no tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub guid: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Length of the raw markup in bytes, as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub update_sequence_num: i32,
    pub notebook_guid: String,
    /// Tag guids referenced by the note when it was fetched.
    #[serde(default)]
    pub tag_guids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<serde_json::Value>,
    pub content: NoteContent,
    /// Resolved tags. Callers must not rely on their order.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Tag guids whose lookup failed during assembly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_tag_guids: Vec<String>,
}

impl Note {
    /// `true` when every referenced tag was looked up successfully.
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved_tag_guids.is_empty()
    }

    /// Names of the resolved tags, in assembly order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Rendered note body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteContent {
    pub plaintext: String,
    pub html: String,
    /// The vendor markup exactly as fetched.
    pub raw_markup: String,
}

/// A binary attachment referenced from note markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub guid: String,
    pub mime: String,
    /// Hex digest the markup uses to reference this resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Where the attachment was originally downloaded from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Base64 body, present when the note was fetched with resource data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// A named label referenced by guid from notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub guid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_sequence_num: Option<i32>,
}

// ---------------------------------------------------------------------------
// NoteFilter / FieldSpec (sent over the wire)
// ---------------------------------------------------------------------------

/// Search filter for a note-summary listing, scoped to one notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFilter {
    pub notebook_guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_guids: Option<Vec<String>>,
    pub order: i32,
    pub ascending: bool,
    pub time_zone: String,
    /// `false` excludes deleted notes.
    pub inactive: bool,
}

impl NoteFilter {
    /// Filter for every active note in `notebook_guid`.
    pub fn for_notebook(notebook_guid: impl Into<String>) -> Result<Self> {
        let notebook_guid = notebook_guid.into();
        if notebook_guid.trim().is_empty() {
            return Err(SteamError::validation("a note filter requires a notebook guid"));
        }

        Ok(Self {
            notebook_guid,
            words: None,
            tag_guids: None,
            order: DEFAULT_NOTE_ORDER,
            ascending: true,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            inactive: false,
        })
    }

    /// Restrict to notes matching a free-text query.
    pub fn with_words(mut self, words: impl Into<String>) -> Self {
        self.words = Some(words.into());
        self
    }

    /// Restrict to notes carrying all of the given tags.
    pub fn with_tag_guids(mut self, tag_guids: Vec<String>) -> Self {
        self.tag_guids = Some(tag_guids);
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }
}

/// Which optional fields a note-summary listing should populate.
///
/// The pipeline never varies this; [`FieldSpec::everything`] is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub include_title: bool,
    pub include_content: bool,
    pub include_resources_data: bool,
    pub include_note_app_data_values: bool,
    pub include_resources_recognition: bool,
    pub include_resources_alternate_data: bool,
    pub include_shared_notes: bool,
    pub include_resource_app_data_values: bool,
    pub include_account_limits: bool,
}

impl FieldSpec {
    /// Request every optional field.
    pub fn everything() -> Self {
        Self {
            include_title: true,
            include_content: true,
            include_resources_data: true,
            include_note_app_data_values: true,
            include_resources_recognition: true,
            include_resources_alternate_data: true,
            include_shared_notes: true,
            include_resource_app_data_values: true,
            include_account_limits: true,
        }
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::everything()
    }
}
