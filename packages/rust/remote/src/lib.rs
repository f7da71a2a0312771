//! Remote note service client.
//!
//! The aggregation pipeline only ever talks to the service through the
//! [`NoteStore`] trait, so tests can swap in an in-memory store. This crate
//! provides:
//! - [`NoteStore`]: the six read-only calls the pipeline consumes
//! - [`wire`]: vendor-shaped request/response objects
//! - [`HttpNoteStore`]: the `reqwest` implementation

mod http;
pub mod wire;

use async_trait::async_trait;

use steamlib_shared::{FieldSpec, NoteFilter, Result};

pub use http::HttpNoteStore;
pub use wire::{
    NoteBodyOptions, NoteMetadata, NotesMetadataList, RemoteNote, RemoteNotebook, RemoteResource,
    RemoteTag,
};

/// Read-only view of the note service, bound to one auth token and environment.
///
/// Every call is independently failable. `Option` results model responses the
/// service may return without a body; callers decide whether that is an error.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List every notebook in the account.
    async fn list_notebooks(&self) -> Result<Vec<RemoteNotebook>>;

    /// Look up a single notebook.
    async fn get_notebook(&self, guid: &str) -> Result<RemoteNotebook>;

    /// Look up the account's default notebook.
    async fn get_default_notebook(&self) -> Result<Option<RemoteNotebook>>;

    /// Fetch one page of note summaries matching `filter`.
    async fn find_notes_metadata(
        &self,
        filter: &NoteFilter,
        offset: u32,
        max_notes: u32,
        spec: &FieldSpec,
    ) -> Result<Option<NotesMetadataList>>;

    /// Fetch a full note body.
    async fn get_note(&self, guid: &str, opts: NoteBodyOptions) -> Result<Option<RemoteNote>>;

    /// Look up a single tag.
    async fn get_tag(&self, guid: &str) -> Result<RemoteTag>;
}
