//! Request-scoped tag memoization.
//!
//! Tags are immutable for the duration of one aggregation, so a tag shared by
//! many notes only needs one lookup. Concurrent lookups of the same guid wait
//! on the first one instead of racing it. A failed lookup leaves the entry
//! empty so the next note tries again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use steamlib_shared::{Result, Tag};

#[derive(Default)]
pub(crate) struct TagCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Tag>>>>,
}

impl TagCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn get_or_fetch<F, Fut>(&self, guid: &str, fetch: F) -> Result<Tag>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Tag>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry(guid.to_string()).or_default().clone()
        };

        cell.get_or_try_init(fetch).await.cloned()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }
}
