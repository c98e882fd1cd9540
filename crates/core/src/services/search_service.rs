use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error};
use tokio::task::JoinHandle;

use crate::cancellation::CancelToken;
use crate::errors::CoreError;
use crate::models::market::SearchResponse;
use crate::models::settings::MIN_SEARCH_LEN;
use crate::providers::traits::MarketApi;
use crate::view::{apply_if_live, DashboardView, ViewUpdate};

/// Debounced free-text search.
///
/// Each keystroke aborts the pending search and schedules a new one after
/// the debounce delay, so only the final query of a typing burst reaches the
/// backend. Queries shorter than `min_len` characters hide the results
/// instead of searching. `min_len` never drops below [`MIN_SEARCH_LEN`].
pub struct SearchService {
    api: Arc<dyn MarketApi>,
    view: Arc<dyn DashboardView>,
    debounce: Duration,
    min_len: usize,
    token: CancelToken,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchService {
    pub fn new(
        api: Arc<dyn MarketApi>,
        view: Arc<dyn DashboardView>,
        debounce: Duration,
        min_len: usize,
        token: CancelToken,
    ) -> Self {
        Self {
            api,
            view,
            debounce,
            min_len: min_len.max(MIN_SEARCH_LEN),
            token,
            pending: Mutex::new(None),
        }
    }

    /// Handle a change of the search input. Must be called inside a tokio runtime.
    pub fn on_input(&self, text: &str) {
        let query = text.trim().to_string();
        self.cancel_pending();

        if query.chars().count() < self.min_len {
            apply_if_live(self.view.as_ref(), &self.token, ViewUpdate::SearchHidden);
            return;
        }

        let api = Arc::clone(&self.api);
        let view = Arc::clone(&self.view);
        let token = self.token.clone();
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if token.is_cancelled() {
                return;
            }
            apply_if_live(view.as_ref(), &token, ViewUpdate::SearchLoading);

            let update = match api.search_stocks(&query).await {
                Ok(resp) if !resp.results.is_empty() => ViewUpdate::SearchResults(resp.results),
                Ok(_) => ViewUpdate::SearchNoResults,
                Err(e) => {
                    error!("Search error for '{query}': {e}");
                    ViewUpdate::SearchFailed
                }
            };
            apply_if_live(view.as_ref(), &token, update);
        });

        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Run a search right away, bypassing the debounce.
    pub async fn search_now(&self, query: &str) -> Result<SearchResponse, CoreError> {
        let query = query.trim();
        if query.chars().count() < self.min_len {
            return Err(CoreError::ValidationError(format!(
                "Search query must have at least {} characters",
                self.min_len
            )));
        }
        self.api.search_stocks(query).await
    }

    /// Close the results panel (e.g. a click outside of it).
    pub fn hide_results(&self) {
        apply_if_live(self.view.as_ref(), &self.token, ViewUpdate::SearchHidden);
    }

    /// Abort the scheduled search, if any.
    pub fn cancel_pending(&self) {
        if let Some(task) = self.pending.lock().unwrap_or_else(|e| e.into_inner()).take() {
            debug!("Aborting pending search");
            task.abort();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SearchService {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
