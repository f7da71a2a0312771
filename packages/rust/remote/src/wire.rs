//! Vendor-shaped objects as the note service sends them.
//!
//! Field names follow the service's camelCase and timestamps are milliseconds
//! since the Unix epoch. Anything the pipeline passes through without
//! interpreting is kept as raw JSON.

use serde::{Deserialize, Serialize};

use steamlib_shared::{FieldSpec, NoteFilter};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNotebook {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub update_sequence_num: i32,
    #[serde(default)]
    pub default_notebook: bool,
    #[serde(default)]
    pub service_created: Option<i64>,
    #[serde(default)]
    pub service_updated: Option<i64>,
    #[serde(default)]
    pub publishing: Option<serde_json::Value>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub shared_notebook_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub shared_notebooks: Option<Vec<serde_json::Value>>,
}

/// One page of a note-summary listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesMetadataList {
    #[serde(default)]
    pub start_index: u32,
    #[serde(default)]
    pub total_notes: u32,
    #[serde(default)]
    pub notes: Vec<NoteMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub guid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub update_sequence_num: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNote {
    pub guid: String,
    #[serde(default)]
    pub title: String,
    /// Note body markup.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub content_length: Option<i64>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default)]
    pub deleted: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub update_sequence_num: i32,
    #[serde(default)]
    pub notebook_guid: String,
    #[serde(default)]
    pub tag_guids: Option<Vec<String>>,
    #[serde(default)]
    pub resources: Option<Vec<RemoteResource>>,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
    #[serde(default)]
    pub shared_notes: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub restrictions: Option<serde_json::Value>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResource {
    pub guid: String,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub data: Option<ResourceData>,
    #[serde(default)]
    pub attributes: Option<ResourceAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceData {
    /// Hex digest of the body; `<en-media hash=..>` refers to this.
    #[serde(default)]
    pub body_hash: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    /// Base64 body, only present when requested.
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAttributes {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTag {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_guid: Option<String>,
    #[serde(default)]
    pub update_sequence_num: Option<i32>,
}

/// What to include when fetching a full note body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteBodyOptions {
    pub with_content: bool,
    pub with_resources_data: bool,
    pub with_resources_recognition: bool,
    pub with_resources_alternate_data: bool,
}

impl NoteBodyOptions {
    /// Content, resources and their binary data.
    pub fn everything() -> Self {
        Self {
            with_content: true,
            with_resources_data: true,
            with_resources_recognition: true,
            with_resources_alternate_data: true,
        }
    }

    pub(crate) fn as_query(&self) -> [(&'static str, bool); 4] {
        [
            ("withContent", self.with_content),
            ("withResourcesData", self.with_resources_data),
            ("withResourcesRecognition", self.with_resources_recognition),
            ("withResourcesAlternateData", self.with_resources_alternate_data),
        ]
    }
}

impl Default for NoteBodyOptions {
    fn default() -> Self {
        Self::everything()
    }
}

/// Request body for `POST notes/metadata`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindNotesMetadataRequest<'a> {
    pub filter: &'a NoteFilter,
    pub offset: u32,
    pub max_notes: u32,
    pub result_spec: &'a FieldSpec,
}

/// Error body the service sends with non-success statuses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
