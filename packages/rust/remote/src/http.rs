//! `reqwest`-backed [`NoteStore`] speaking JSON over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use steamlib_shared::{Environment, FieldSpec, NoteFilter, RemoteConfig, Result, SteamError};

use crate::NoteStore;
use crate::wire::{
    ErrorBody, FindNotesMetadataRequest, NoteBodyOptions, NotesMetadataList, RemoteNote,
    RemoteNotebook, RemoteTag,
};

/// User-Agent string for note service requests.
const USER_AGENT: &str = concat!("steamlib/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// A note store bound to one auth token and one environment.
///
/// Cheap to share: the inner `reqwest::Client` pools connections and the
/// store holds no mutable state.
pub struct HttpNoteStore {
    client: Client,
    base_url: Url,
    token: String,
    environment: Environment,
}

impl std::fmt::Debug for HttpNoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNoteStore")
            .field("base_url", &self.base_url.as_str())
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl HttpNoteStore {
    /// Build a store for `config.environment` authenticating with `token`.
    pub fn new(token: impl Into<String>, config: &RemoteConfig) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SteamError::config("auth token is empty"));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SteamError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
            token,
            environment: config.environment,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Resolve path segments under the base URL, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SteamError::config(format!("base url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, bool)],
    ) -> Result<Option<T>> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let request = self.client.get(url.clone()).query(query);
        self.send(&url, request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Option<T>> {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let request = self.client.post(url.clone()).json(body);
        self.send(&url, request).await
    }

    /// Send a request and decode its body, mapping failures onto [`SteamError`].
    ///
    /// An empty or `null` body decodes to `None`.
    async fn send<T: DeserializeOwned>(&self, url: &Url, request: RequestBuilder) -> Result<Option<T>> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SteamError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SteamError::Network(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(SteamError::Remote {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<T>>(&body)
            .map_err(|e| SteamError::parse(format!("{url}: malformed response: {e}")))
    }
}

/// Best-effort human message from an error body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            error_code: Some(code),
            ..
        }) => code,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

/// Turn a required-but-missing body into an error.
fn required<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| SteamError::empty_response(what))
}

#[async_trait]
impl NoteStore for HttpNoteStore {
    #[instrument(skip_all)]
    async fn list_notebooks(&self) -> Result<Vec<RemoteNotebook>> {
        required(self.get(&["notebooks"], &[]).await?, "notebook listing")
    }

    #[instrument(skip(self))]
    async fn get_notebook(&self, guid: &str) -> Result<RemoteNotebook> {
        required(self.get(&["notebooks", guid], &[]).await?, "notebook")
    }

    #[instrument(skip_all)]
    async fn get_default_notebook(&self) -> Result<Option<RemoteNotebook>> {
        self.get(&["default-notebook"], &[]).await
    }

    #[instrument(skip(self, filter, spec), fields(notebook_guid = %filter.notebook_guid))]
    async fn find_notes_metadata(
        &self,
        filter: &NoteFilter,
        offset: u32,
        max_notes: u32,
        spec: &FieldSpec,
    ) -> Result<Option<NotesMetadataList>> {
        let body = FindNotesMetadataRequest {
            filter,
            offset,
            max_notes,
            result_spec: spec,
        };
        self.post(&["notes", "metadata"], &body).await
    }

    #[instrument(skip(self, opts))]
    async fn get_note(&self, guid: &str, opts: NoteBodyOptions) -> Result<Option<RemoteNote>> {
        self.get(&["notes", guid], &opts.as_query()).await
    }

    #[instrument(skip(self))]
    async fn get_tag(&self, guid: &str) -> Result<RemoteTag> {
        required(self.get(&["tags", guid], &[]).await?, "tag")
    }
}
