//! Public entry points of the aggregation pipeline.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, instrument};

use steamlib_remote::{HttpNoteStore, NoteStore};
use steamlib_shared::{
    Environment, Note, NoteFilter, NoteSummary, Notebook, RemoteConfig, Result, SteamError,
};

use crate::assembler;
use crate::context::RunContext;
use crate::gateway::Gateway;
use crate::mapping;
use crate::options::AggregateOptions;
use crate::populator;
use crate::progress::{ProgressReporter, SilentProgress};

/// One notebook that could not be populated during a lenient listing.
#[derive(Debug)]
pub struct NotebookFailure {
    pub guid: String,
    pub name: String,
    pub error: SteamError,
}

/// Outcome of [`Aggregator::list_all_notebooks_lenient`].
#[derive(Debug, Default)]
pub struct AccountSnapshot {
    /// Fully populated notebooks, in listing order.
    pub notebooks: Vec<Notebook>,
    pub failures: Vec<NotebookFailure>,
}

/// Aggregates notebooks, notes and tags from one account.
///
/// Bound to a single token and environment. Holds no state between calls:
/// each public method builds its own run context (tag cache included).
pub struct Aggregator {
    gateway: Gateway,
    options: AggregateOptions,
    progress: Arc<dyn ProgressReporter>,
}

impl Aggregator {
    /// Connect to the note service over HTTP.
    pub fn connect(
        token: impl Into<String>,
        remote: &RemoteConfig,
        options: AggregateOptions,
    ) -> Result<Self> {
        let store = HttpNoteStore::new(token, remote)?;
        info!(environment = %store.environment(), "note service client ready");
        Ok(Self::with_store(Arc::new(store), options))
    }

    /// Aggregate over any [`NoteStore`] implementation.
    pub fn with_store(store: Arc<dyn NoteStore>, options: AggregateOptions) -> Self {
        let gateway = Gateway::new(store, options.max_in_flight, options.retry);
        Self {
            gateway,
            options,
            progress: Arc::new(SilentProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    fn context(&self) -> RunContext<'_> {
        RunContext::new(&self.gateway, &self.options, self.progress.as_ref())
    }

    async fn remote_notebooks(&self) -> Result<Vec<Notebook>> {
        self.progress.phase("listing notebooks");
        let remotes = self.gateway.list_notebooks().await.map_err(|e| {
            let err = SteamError::notebook_list(e);
            error!(error = %err, "notebook listing failed");
            err
        })?;
        info!(count = remotes.len(), "notebooks listed");
        Ok(remotes.into_iter().map(mapping::notebook).collect())
    }

    /// Every notebook in the account with its notes.
    ///
    /// Notebooks are populated concurrently. The first population failure (in
    /// listing order) fails the whole call.
    #[instrument(skip_all)]
    pub async fn list_all_notebooks(&self) -> Result<Vec<Notebook>> {
        let notebooks = self.remote_notebooks().await?;
        let ctx = &self.context();

        self.progress.phase("populating notebooks");
        let populated = join_all(
            notebooks
                .into_iter()
                .map(|nb| populator::populate(ctx, nb, None, None)),
        )
        .await;

        populated.into_iter().collect()
    }

    /// Like [`list_all_notebooks`](Self::list_all_notebooks), but a notebook
    /// that fails to populate is reported instead of failing the call.
    ///
    /// Only the initial notebook listing is fatal.
    #[instrument(skip_all)]
    pub async fn list_all_notebooks_lenient(&self) -> Result<AccountSnapshot> {
        let notebooks = self.remote_notebooks().await?;
        let ctx = &self.context();

        self.progress.phase("populating notebooks");
        let populated = join_all(notebooks.into_iter().map(|nb| async move {
            let (guid, name) = (nb.guid.clone(), nb.name.clone());
            populator::populate(ctx, nb, None, None)
                .await
                .map_err(|error| NotebookFailure { guid, name, error })
        }))
        .await;

        let mut snapshot = AccountSnapshot::default();
        for outcome in populated {
            match outcome {
                Ok(nb) => snapshot.notebooks.push(nb),
                Err(failure) => {
                    error!(
                        notebook_guid = %failure.guid,
                        error = %failure.error,
                        "notebook population failed"
                    );
                    snapshot.failures.push(failure);
                }
            }
        }
        Ok(snapshot)
    }

    /// The account's default notebook with its notes.
    #[instrument(skip_all)]
    pub async fn get_default_notebook_with_notes(&self) -> Result<Notebook> {
        self.progress.phase("resolving default notebook");
        let remote = self
            .gateway
            .get_default_notebook()
            .await
            .and_then(|nb| nb.ok_or_else(|| SteamError::empty_response("default notebook")))
            .map_err(|e| {
                let err = SteamError::default_notebook(e);
                error!(error = %err, "default notebook lookup failed");
                err
            })?;

        let ctx = self.context();
        self.progress.phase("populating notebooks");
        populator::populate(&ctx, mapping::notebook(remote), None, None).await
    }

    /// One notebook by guid with the notes matching `filter`.
    ///
    /// `filter` defaults to every active note in the notebook; `page_size`
    /// defaults to the configured page size.
    #[instrument(skip(self, filter))]
    pub async fn populate_notebook(
        &self,
        notebook_guid: &str,
        filter: Option<NoteFilter>,
        page_size: Option<u32>,
    ) -> Result<Notebook> {
        if notebook_guid.trim().is_empty() {
            return Err(SteamError::validation("a notebook guid is required"));
        }

        let remote = self
            .gateway
            .get_notebook(notebook_guid)
            .await
            .map_err(|e| SteamError::notebook_fetch(notebook_guid, e))?;

        let ctx = self.context();
        populator::populate(&ctx, mapping::notebook(remote), filter, page_size).await
    }

    /// Assemble one note from a listing summary.
    pub async fn assemble_note(&self, summary: &NoteSummary) -> Result<Note> {
        assembler::assemble_note(&self.context(), &summary.guid, &summary.title).await
    }

    /// Assemble one note by guid.
    pub async fn assemble_note_by_guid(&self, note_guid: &str) -> Result<Note> {
        assembler::assemble_note(&self.context(), note_guid, "").await
    }
}

fn baseline(token: &str, environment: Environment) -> Result<Aggregator> {
    let remote = RemoteConfig {
        environment,
        ..RemoteConfig::default()
    };
    Aggregator::connect(token, &remote, AggregateOptions::default())
}

/// Every notebook with its notes, using default connection settings.
pub async fn list_all_notebooks(token: &str, environment: Environment) -> Result<Vec<Notebook>> {
    baseline(token, environment)?.list_all_notebooks().await
}

/// The default notebook with its notes, using default connection settings.
pub async fn get_default_notebook_with_notes(
    token: &str,
    environment: Environment,
) -> Result<Notebook> {
    baseline(token, environment)?
        .get_default_notebook_with_notes()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockStore, RecordingProgress};

    fn three_notebooks() -> MockStore {
        MockStore::new()
            .with_notebook("nb-1", "Inbox", true)
            .with_notebook("nb-2", "Work", false)
            .with_notebook("nb-3", "Travel", false)
            .with_note("nb-1", "n-1", "Groceries", &["t-1"])
            .with_note("nb-2", "n-2", "Standup", &[])
            .with_note("nb-3", "n-3", "Flights", &[])
            .with_tag("t-1", "home")
    }

    fn aggregator(store: MockStore) -> Aggregator {
        Aggregator::with_store(Arc::new(store), AggregateOptions::default())
    }

    #[tokio::test]
    async fn lists_every_notebook_in_order() {
        let notebooks = aggregator(three_notebooks())
            .list_all_notebooks()
            .await
            .unwrap();

        let names: Vec<&str> = notebooks.iter().map(|nb| nb.name.as_str()).collect();
        assert_eq!(names, ["Inbox", "Work", "Travel"]);
        assert!(notebooks.iter().all(|nb| nb.notes.len() == 1));
        assert_eq!(notebooks[0].notes[0].tag_names(), ["home"]);
    }

    #[tokio::test]
    async fn one_failing_notebook_fails_the_strict_listing() {
        let err = aggregator(three_notebooks().fail_listing("nb-2"))
            .list_all_notebooks()
            .await
            .unwrap_err();

        assert!(
            matches!(err, SteamError::NoteList { ref notebook_guid, .. } if notebook_guid == "nb-2")
        );
    }

    #[tokio::test]
    async fn one_failing_notebook_is_reported_by_the_lenient_listing() {
        let snapshot = aggregator(three_notebooks().fail_listing("nb-2"))
            .list_all_notebooks_lenient()
            .await
            .unwrap();

        let names: Vec<&str> = snapshot.notebooks.iter().map(|nb| nb.name.as_str()).collect();
        assert_eq!(names, ["Inbox", "Travel"]);
        assert_eq!(snapshot.failures.len(), 1);
        assert_eq!(snapshot.failures[0].guid, "nb-2");
        assert_eq!(snapshot.failures[0].name, "Work");
        assert!(matches!(snapshot.failures[0].error, SteamError::NoteList { .. }));
    }

    #[tokio::test]
    async fn notebook_listing_failure_is_fatal_for_both_policies() {
        let strict = aggregator(three_notebooks().fail_notebook_list())
            .list_all_notebooks()
            .await
            .unwrap_err();
        assert!(matches!(strict, SteamError::NotebookList { .. }));

        let lenient = aggregator(three_notebooks().fail_notebook_list())
            .list_all_notebooks_lenient()
            .await
            .unwrap_err();
        assert!(matches!(lenient, SteamError::NotebookList { .. }));
    }

    #[tokio::test]
    async fn default_notebook_is_populated() {
        let progress = Arc::new(RecordingProgress::default());
        let agg = aggregator(three_notebooks()).with_progress(progress.clone());

        let inbox = agg.get_default_notebook_with_notes().await.unwrap();
        assert_eq!(inbox.name, "Inbox");
        assert!(inbox.is_default);
        assert_eq!(inbox.notes.len(), 1);

        let events = progress.events();
        assert_eq!(events.first().map(String::as_str), Some("phase:resolving default notebook"));
        assert!(events.contains(&"note:Groceries".to_string()));
        assert!(events.contains(&"notebook:Inbox:1".to_string()));
    }

    #[tokio::test]
    async fn missing_default_notebook_is_an_error() {
        let store = MockStore::new().with_notebook("nb-1", "Work", false);
        let err = aggregator(store)
            .get_default_notebook_with_notes()
            .await
            .unwrap_err();
        assert!(matches!(err, SteamError::DefaultNotebook { .. }));
    }

    #[tokio::test]
    async fn default_notebook_lookup_failure_is_an_error() {
        let err = aggregator(three_notebooks().fail_default())
            .get_default_notebook_with_notes()
            .await
            .unwrap_err();
        assert!(matches!(err, SteamError::DefaultNotebook { .. }));
    }

    #[tokio::test]
    async fn populate_notebook_by_guid() {
        let agg = aggregator(three_notebooks());

        let work = agg.populate_notebook("nb-2", None, None).await.unwrap();
        assert_eq!(work.name, "Work");
        assert_eq!(work.notes[0].title, "Standup");

        let missing = agg.populate_notebook("nb-9", None, None).await.unwrap_err();
        assert!(matches!(missing, SteamError::NotebookFetch { .. }));

        let blank = agg.populate_notebook("  ", None, None).await.unwrap_err();
        assert!(matches!(blank, SteamError::Validation { .. }));
    }

    #[tokio::test]
    async fn assemble_single_note() {
        let agg = aggregator(three_notebooks());
        let summary = NoteSummary {
            guid: "n-1".into(),
            title: "Groceries".into(),
            update_sequence_num: 0,
        };

        let note = agg.assemble_note(&summary).await.unwrap();
        assert_eq!(note.tag_names(), ["home"]);

        let by_guid = agg.assemble_note_by_guid("n-3").await.unwrap();
        assert_eq!(by_guid.notebook_guid, "nb-3");
    }

    fn busy_store() -> MockStore {
        let mut store = MockStore::new().with_notebook("nb-1", "Inbox", true);
        for i in 0..6 {
            let tag = format!("t-{i}");
            store = store
                .with_note("nb-1", &format!("n-{i}"), "Note", &[tag.as_str()])
                .with_tag(&tag, "tag")
                .tag_delay(&tag, 10);
        }
        store
    }

    #[tokio::test]
    async fn fan_out_is_unbounded_by_default() {
        let store = Arc::new(busy_store());
        let agg = Aggregator::with_store(store.clone(), AggregateOptions::default());

        agg.list_all_notebooks().await.unwrap();
        assert!(store.max_in_flight() >= 6);
    }

    #[tokio::test]
    async fn limiter_caps_in_flight_calls() {
        let store = Arc::new(busy_store());
        let options = AggregateOptions {
            max_in_flight: 2,
            ..AggregateOptions::default()
        };
        let agg = Aggregator::with_store(store.clone(), options);
        assert_eq!(agg.options().max_in_flight, 2);

        let notebooks = agg.list_all_notebooks().await.unwrap();
        assert_eq!(notebooks[0].notes.len(), 6);
        assert!(store.max_in_flight() <= 2);
    }
}
