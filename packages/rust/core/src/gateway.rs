//! Every remote call the pipeline makes goes through [`Gateway`], which applies
//! the in-flight cap and the retry policy uniformly.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::warn;

use steamlib_remote::{
    NoteBodyOptions, NoteStore, NotesMetadataList, RemoteNote, RemoteNotebook, RemoteTag,
};
use steamlib_shared::{FieldSpec, NoteFilter, Result, SteamError};

use crate::options::RetryPolicy;

pub(crate) struct Gateway {
    store: Arc<dyn NoteStore>,
    limiter: Option<Arc<Semaphore>>,
    retry: RetryPolicy,
}

impl Gateway {
    /// `max_in_flight == 0` leaves fan-out unbounded.
    pub(crate) fn new(store: Arc<dyn NoteStore>, max_in_flight: usize, retry: RetryPolicy) -> Self {
        let limiter = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
        Self {
            store,
            limiter,
            retry,
        }
    }

    async fn permit(&self) -> Result<Option<SemaphorePermit<'_>>> {
        match &self.limiter {
            Some(sem) => sem
                .acquire()
                .await
                .map(Some)
                .map_err(|_| SteamError::validation("request limiter closed")),
            None => Ok(None),
        }
    }

    /// Run one remote call, retrying transient failures with backoff.
    ///
    /// The permit is held only for the duration of each attempt, never while
    /// sleeping between attempts.
    async fn call<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = {
                let _permit = self.permit().await?;
                f().await
            };

            match result {
                Err(e) if attempt < self.retry.max_retries && e.is_transient() => {
                    let delay = self.retry.backoff_for(attempt);
                    warn!(
                        op,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    pub(crate) async fn list_notebooks(&self) -> Result<Vec<RemoteNotebook>> {
        self.call("list_notebooks", || self.store.list_notebooks())
            .await
    }

    pub(crate) async fn get_notebook(&self, guid: &str) -> Result<RemoteNotebook> {
        self.call("get_notebook", || self.store.get_notebook(guid))
            .await
    }

    pub(crate) async fn get_default_notebook(&self) -> Result<Option<RemoteNotebook>> {
        self.call("get_default_notebook", || self.store.get_default_notebook())
            .await
    }

    pub(crate) async fn find_notes_metadata(
        &self,
        filter: &NoteFilter,
        offset: u32,
        max_notes: u32,
        spec: &FieldSpec,
    ) -> Result<Option<NotesMetadataList>> {
        self.call("find_notes_metadata", || {
            self.store.find_notes_metadata(filter, offset, max_notes, spec)
        })
        .await
    }

    pub(crate) async fn get_note(
        &self,
        guid: &str,
        opts: NoteBodyOptions,
    ) -> Result<Option<RemoteNote>> {
        self.call("get_note", || self.store.get_note(guid, opts))
            .await
    }

    pub(crate) async fn get_tag(&self, guid: &str) -> Result<RemoteTag> {
        self.call("get_tag", || self.store.get_tag(guid)).await
    }
}
