//! Pure transforms from vendor wire objects to the application model.
//!
//! Nothing in here performs I/O; content rendering is a pure function too.

use chrono::{DateTime, Utc};

use steamlib_remote::{NoteMetadata, RemoteNote, RemoteNotebook, RemoteResource, RemoteTag};
use steamlib_shared::{Note, NoteContent, NoteSummary, Notebook, Resource, Tag};

/// Vendor timestamps are milliseconds since the Unix epoch.
pub(crate) fn timestamp(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(DateTime::from_timestamp_millis)
}

/// Notebook record with no notes attached yet.
pub(crate) fn notebook(remote: RemoteNotebook) -> Notebook {
    Notebook {
        guid: remote.guid,
        name: remote.name,
        update_sequence_num: remote.update_sequence_num,
        is_default: remote.default_notebook,
        created_at: timestamp(remote.service_created),
        updated_at: timestamp(remote.service_updated),
        is_published: remote.published.unwrap_or(false),
        publishing: remote.publishing,
        stack: remote.stack,
        shared_notebook_ids: remote.shared_notebook_ids.unwrap_or_default(),
        shared_with: remote.shared_notebooks.unwrap_or_default(),
        notes: Vec::new(),
    }
}

pub(crate) fn summary(remote: NoteMetadata) -> NoteSummary {
    NoteSummary {
        guid: remote.guid,
        title: remote.title.unwrap_or_default(),
        update_sequence_num: remote.update_sequence_num.unwrap_or_default(),
    }
}

pub(crate) fn resource(remote: RemoteResource) -> Resource {
    let (hash, size, data) = match remote.data {
        Some(d) => (d.body_hash, d.size, d.body),
        None => (None, None, None),
    };
    let (file_name, source_url) = match remote.attributes {
        Some(a) => (a.file_name, a.source_url),
        None => (None, None),
    };

    Resource {
        guid: remote.guid,
        mime: remote.mime,
        hash,
        size,
        file_name,
        source_url,
        data,
    }
}

pub(crate) fn tag(remote: RemoteTag) -> Tag {
    Tag {
        guid: remote.guid,
        name: remote.name,
        parent_guid: remote.parent_guid,
        update_sequence_num: remote.update_sequence_num,
    }
}

/// A note whose body is mapped but whose tags are not resolved yet.
///
/// The only way out is [`NoteDraft::resolve`], which takes the tag lookup
/// outcomes, so a [`Note`] never escapes assembly half-built.
#[derive(Debug)]
pub(crate) struct NoteDraft {
    note: Note,
}

impl NoteDraft {
    pub(crate) fn guid(&self) -> &str {
        &self.note.guid
    }

    pub(crate) fn tag_guids(&self) -> &[String] {
        &self.note.tag_guids
    }

    /// Attach the resolved tags and the guids that failed to resolve.
    pub(crate) fn resolve(self, tags: Vec<Tag>, unresolved_tag_guids: Vec<String>) -> Note {
        debug_assert_eq!(
            tags.len() + unresolved_tag_guids.len(),
            self.note.tag_guids.len()
        );
        Note {
            tags,
            unresolved_tag_guids,
            ..self.note
        }
    }
}

/// Map a full note body, rendering its content.
///
/// `fallback_title` (the listing title) is used when the body has none.
pub(crate) fn note_draft(remote: RemoteNote, fallback_title: &str) -> NoteDraft {
    let resources: Vec<Resource> = remote
        .resources
        .unwrap_or_default()
        .into_iter()
        .map(resource)
        .collect();

    let raw_markup = remote.content.unwrap_or_default();
    let rendered = steamlib_render::render(&raw_markup, &resources);

    let title = if remote.title.is_empty() {
        fallback_title.to_string()
    } else {
        remote.title
    };

    NoteDraft {
        note: Note {
            guid: remote.guid,
            title,
            content_hash: remote.content_hash,
            content_length: remote.content_length,
            created_at: timestamp(remote.created),
            updated_at: timestamp(remote.updated),
            deleted_at: timestamp(remote.deleted),
            is_active: remote.active,
            update_sequence_num: remote.update_sequence_num,
            notebook_guid: remote.notebook_guid,
            tag_guids: remote.tag_guids.unwrap_or_default(),
            resources,
            attributes: remote.attributes,
            shared_with: remote.shared_notes.unwrap_or_default(),
            restrictions: remote.restrictions,
            content: NoteContent {
                plaintext: rendered.plaintext,
                html: rendered.html,
                raw_markup,
            },
            tags: Vec::new(),
            unresolved_tag_guids: Vec::new(),
        },
    }
}
