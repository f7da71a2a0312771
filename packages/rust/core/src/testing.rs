//! In-memory [`NoteStore`] for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use steamlib_remote::wire::ResourceData;
use steamlib_remote::{
    NoteBodyOptions, NoteMetadata, NoteStore, NotesMetadataList, RemoteNote, RemoteNotebook,
    RemoteResource, RemoteTag,
};
use steamlib_shared::{FieldSpec, NoteFilter, Result, SteamError};

use crate::progress::ProgressReporter;

struct StoredNote {
    /// Notebook whose listing returns this note.
    listed_in: String,
    note: RemoteNote,
}

/// Builder-style mock of the note service.
///
/// Notes are listed in insertion order. Every tag and note lookup is counted,
/// and the peak number of concurrently running calls is tracked.
#[derive(Default)]
pub(crate) struct MockStore {
    notebooks: Vec<RemoteNotebook>,
    notes: Vec<StoredNote>,
    tags: HashMap<String, RemoteTag>,

    fail_notebook_list: bool,
    fail_default: bool,
    failing_listings: HashSet<String>,
    empty_listings: HashSet<String>,
    failing_notes: HashSet<String>,
    empty_notes: HashSet<String>,
    failing_tags: HashSet<String>,
    flaky_tags: Mutex<HashMap<String, u32>>,
    flaky_listings: Mutex<HashMap<String, u32>>,
    flaky_notes: Mutex<HashMap<String, u32>>,
    tag_delays: HashMap<String, u64>,
    note_delays: HashMap<String, u64>,

    tag_calls: Mutex<HashMap<String, usize>>,
    completed_tag_calls: AtomicUsize,
    listing_calls: Mutex<Vec<(String, u32, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Tracks one running call for the in-flight high-water mark.
struct InFlight<'a>(&'a MockStore);

impl<'a> InFlight<'a> {
    fn enter(store: &'a MockStore) -> Self {
        let now = store.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        store.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(store)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn server_error(what: &str) -> SteamError {
    SteamError::Remote {
        status: 500,
        message: format!("{what} failed"),
    }
}

/// Spend one of the remaining transient failures for `key`, if any.
fn transient(flaky: &Mutex<HashMap<String, u32>>, key: &str) -> Result<()> {
    let mut flaky = flaky.lock().expect("mock lock");
    match flaky.get_mut(key).filter(|r| **r > 0) {
        Some(remaining) => {
            *remaining -= 1;
            Err(SteamError::Network("connection reset".into()))
        }
        None => Ok(()),
    }
}

async fn pause(delay: Option<&u64>) {
    match delay {
        Some(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
        None => tokio::task::yield_now().await,
    }
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_notebook(mut self, guid: &str, name: &str, is_default: bool) -> Self {
        self.notebooks.push(RemoteNotebook {
            guid: guid.into(),
            name: name.into(),
            default_notebook: is_default,
            ..RemoteNotebook::default()
        });
        self
    }

    pub(crate) fn with_note(
        self,
        notebook_guid: &str,
        guid: &str,
        title: &str,
        tag_guids: &[&str],
    ) -> Self {
        self.with_misfiled_note(notebook_guid, notebook_guid, guid, title, tag_guids)
    }

    /// A note listed under `listed_in` whose body claims `notebook_guid`.
    pub(crate) fn with_misfiled_note(
        mut self,
        listed_in: &str,
        notebook_guid: &str,
        guid: &str,
        title: &str,
        tag_guids: &[&str],
    ) -> Self {
        let hash = format!("{guid}-hash");
        self.notes.push(StoredNote {
            listed_in: listed_in.into(),
            note: RemoteNote {
                guid: guid.into(),
                title: title.into(),
                content: Some(format!(
                    r#"<en-note><div>{title} body</div><en-media type="image/png" hash="{hash}"/></en-note>"#
                )),
                active: true,
                notebook_guid: notebook_guid.into(),
                tag_guids: (!tag_guids.is_empty())
                    .then(|| tag_guids.iter().map(|t| t.to_string()).collect()),
                resources: Some(vec![RemoteResource {
                    guid: format!("{guid}-res"),
                    mime: "image/png".into(),
                    data: Some(ResourceData {
                        body_hash: Some(hash),
                        size: Some(4),
                        body: Some("iVBO".into()),
                    }),
                    attributes: None,
                }]),
                ..RemoteNote::default()
            },
        });
        self
    }

    pub(crate) fn with_tag(mut self, guid: &str, name: &str) -> Self {
        self.tags.insert(
            guid.into(),
            RemoteTag {
                guid: guid.into(),
                name: name.into(),
                ..RemoteTag::default()
            },
        );
        self
    }

    pub(crate) fn fail_notebook_list(mut self) -> Self {
        self.fail_notebook_list = true;
        self
    }

    pub(crate) fn fail_default(mut self) -> Self {
        self.fail_default = true;
        self
    }

    pub(crate) fn fail_listing(mut self, notebook_guid: &str) -> Self {
        self.failing_listings.insert(notebook_guid.into());
        self
    }

    /// The listing for `notebook_guid` answers with no body.
    pub(crate) fn empty_listing(mut self, notebook_guid: &str) -> Self {
        self.empty_listings.insert(notebook_guid.into());
        self
    }

    pub(crate) fn fail_note(mut self, guid: &str) -> Self {
        self.failing_notes.insert(guid.into());
        self
    }

    pub(crate) fn empty_note(mut self, guid: &str) -> Self {
        self.empty_notes.insert(guid.into());
        self
    }

    /// Permanent (non-retryable) failure for one tag.
    pub(crate) fn fail_tag(mut self, guid: &str) -> Self {
        self.failing_tags.insert(guid.into());
        self
    }

    /// Fail the first `times` lookups of a tag with a transient error.
    pub(crate) fn flaky_tag(mut self, guid: &str, times: u32) -> Self {
        self.flaky_tags
            .get_mut()
            .expect("mock lock")
            .insert(guid.into(), times);
        self
    }

    pub(crate) fn flaky_listing(mut self, notebook_guid: &str, times: u32) -> Self {
        self.flaky_listings
            .get_mut()
            .expect("mock lock")
            .insert(notebook_guid.into(), times);
        self
    }

    pub(crate) fn flaky_note(mut self, guid: &str, times: u32) -> Self {
        self.flaky_notes
            .get_mut()
            .expect("mock lock")
            .insert(guid.into(), times);
        self
    }

    pub(crate) fn tag_delay(mut self, guid: &str, ms: u64) -> Self {
        self.tag_delays.insert(guid.into(), ms);
        self
    }

    pub(crate) fn note_delay(mut self, guid: &str, ms: u64) -> Self {
        self.note_delays.insert(guid.into(), ms);
        self
    }

    pub(crate) fn tag_calls(&self, guid: &str) -> usize {
        let calls = self.tag_calls.lock().expect("mock lock");
        calls.get(guid).copied().unwrap_or(0)
    }

    /// Tag lookups that have run to completion, successful or not.
    pub(crate) fn completed_tag_calls(&self) -> usize {
        self.completed_tag_calls.load(Ordering::SeqCst)
    }

    /// `(notebook_guid, offset, max_notes)` of every listing call.
    pub(crate) fn listing_calls(&self) -> Vec<(String, u32, u32)> {
        self.listing_calls.lock().expect("mock lock").clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteStore for MockStore {
    async fn list_notebooks(&self) -> Result<Vec<RemoteNotebook>> {
        let _guard = InFlight::enter(self);
        pause(None).await;
        if self.fail_notebook_list {
            return Err(server_error("listNotebooks"));
        }
        Ok(self.notebooks.clone())
    }

    async fn get_notebook(&self, guid: &str) -> Result<RemoteNotebook> {
        let _guard = InFlight::enter(self);
        pause(None).await;
        self.notebooks
            .iter()
            .find(|nb| nb.guid == guid)
            .cloned()
            .ok_or_else(|| SteamError::Remote {
                status: 404,
                message: format!("notebook {guid} not found"),
            })
    }

    async fn get_default_notebook(&self) -> Result<Option<RemoteNotebook>> {
        let _guard = InFlight::enter(self);
        pause(None).await;
        if self.fail_default {
            return Err(server_error("getDefaultNotebook"));
        }
        Ok(self.notebooks.iter().find(|nb| nb.default_notebook).cloned())
    }

    async fn find_notes_metadata(
        &self,
        filter: &NoteFilter,
        offset: u32,
        max_notes: u32,
        _spec: &FieldSpec,
    ) -> Result<Option<NotesMetadataList>> {
        let _guard = InFlight::enter(self);
        self.listing_calls.lock().expect("mock lock").push((
            filter.notebook_guid.clone(),
            offset,
            max_notes,
        ));
        pause(None).await;

        let guid = &filter.notebook_guid;
        transient(&self.flaky_listings, guid)?;
        if self.failing_listings.contains(guid) {
            return Err(server_error("findNotesMetadata"));
        }
        if self.empty_listings.contains(guid) {
            return Ok(None);
        }

        let matching: Vec<&RemoteNote> = self
            .notes
            .iter()
            .filter(|n| &n.listed_in == guid)
            .map(|n| &n.note)
            .collect();
        let notes = matching
            .iter()
            .skip(offset as usize)
            .take(max_notes as usize)
            .map(|n| NoteMetadata {
                guid: n.guid.clone(),
                title: Some(n.title.clone()),
                update_sequence_num: Some(n.update_sequence_num),
            })
            .collect();

        Ok(Some(NotesMetadataList {
            start_index: offset,
            total_notes: matching.len() as u32,
            notes,
        }))
    }

    async fn get_note(&self, guid: &str, _opts: NoteBodyOptions) -> Result<Option<RemoteNote>> {
        let _guard = InFlight::enter(self);
        pause(self.note_delays.get(guid)).await;
        transient(&self.flaky_notes, guid)?;
        if self.failing_notes.contains(guid) {
            return Err(server_error("getNote"));
        }
        if self.empty_notes.contains(guid) {
            return Ok(None);
        }
        Ok(self
            .notes
            .iter()
            .find(|n| n.note.guid == guid)
            .map(|n| n.note.clone()))
    }

    async fn get_tag(&self, guid: &str) -> Result<RemoteTag> {
        let _guard = InFlight::enter(self);
        *self
            .tag_calls
            .lock()
            .expect("mock lock")
            .entry(guid.into())
            .or_default() += 1;
        pause(self.tag_delays.get(guid)).await;

        let result = self.lookup_tag(guid);
        self.completed_tag_calls.fetch_add(1, Ordering::SeqCst);
        result
    }
}

impl MockStore {
    fn lookup_tag(&self, guid: &str) -> Result<RemoteTag> {
        transient(&self.flaky_tags, guid)?;
        if self.failing_tags.contains(guid) {
            return Err(SteamError::Remote {
                status: 404,
                message: format!("tag {guid} not found"),
            });
        }
        self.tags.get(guid).cloned().ok_or_else(|| SteamError::Remote {
            status: 404,
            message: format!("tag {guid} not found"),
        })
    }
}

/// Progress reporter that records every callback as a short event string.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().expect("mock lock").clone()
    }

    fn push(&self, event: String) {
        self.events.lock().expect("mock lock").push(event);
    }
}

impl ProgressReporter for RecordingProgress {
    fn phase(&self, name: &str) {
        self.push(format!("phase:{name}"));
    }

    fn notebook_populated(&self, name: &str, note_count: usize) {
        self.push(format!("notebook:{name}:{note_count}"));
    }

    fn note_assembled(&self, title: &str) {
        self.push(format!("note:{title}"));
    }

    fn tag_failed(&self, note_guid: &str, tag_guid: &str, _error: &SteamError) {
        self.push(format!("tag_failed:{note_guid}:{tag_guid}"));
    }
}
