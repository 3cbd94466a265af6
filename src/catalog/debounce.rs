//! Debounced suggestion lookups
//!
//! Each keystroke reschedules the lookup; only input that stays unchanged for
//! the quiet period reaches the provider. Results arrive on a channel so the
//! caller can apply them without holding a borrow across the wait.

use super::suggestions::{is_suggestable, SuggestionProvider};
use crate::config::DEFAULT_DEBOUNCE_MS;
use crate::error::CatalogResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(DEFAULT_DEBOUNCE_MS);

/// Outcome of one debounced lookup, tagged with the input that produced it
#[derive(Debug)]
pub struct SuggestionUpdate {
    pub query: String,
    pub result: CatalogResult<Vec<String>>,
}

pub struct DebouncedSuggestions<P: ?Sized> {
    provider: Arc<P>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    updates: mpsc::UnboundedSender<SuggestionUpdate>,
}

impl<P> DebouncedSuggestions<P>
where
    P: SuggestionProvider + ?Sized + 'static,
{
    /// Returns the debouncer and the receiving end for completed lookups
    pub fn new(
        provider: Arc<P>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SuggestionUpdate>) {
        let (updates, receiver) = mpsc::unbounded_channel();
        let debouncer = Self {
            provider,
            delay,
            pending: None,
            updates,
        };
        (debouncer, receiver)
    }

    /// Replace any pending lookup with one for `query`. Too-short input only
    /// cancels. Must be called from within a tokio runtime.
    pub fn schedule(&mut self, query: &str) {
        self.cancel();

        if !is_suggestable(query) {
            return;
        }

        let provider = Arc::clone(&self.provider);
        let updates = self.updates.clone();
        let delay = self.delay;
        let query = query.to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            log::debug!("Looking up suggestions for '{}'", query);
            let result = provider.suggestions(&query).await;
            if updates.send(SuggestionUpdate { query, result }).is_err() {
                log::debug!("Suggestion receiver dropped, discarding result");
            }
        }));
    }
}

impl<P: ?Sized> DebouncedSuggestions<P> {
    /// Abort the pending lookup, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a lookup is waiting out its quiet period or in flight
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<P: ?Sized> Drop for DebouncedSuggestions<P> {
    fn drop(&mut self) {
        self.cancel();
    }
}
