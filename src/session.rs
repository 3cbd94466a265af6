//! Search session: query input, suggestions, search lifecycle and
//! collection toggling for one user
//!
//! The session is a plain state machine. Network calls happen outside it:
//! a search is started with [`SearchSession::submit`] (or by picking a
//! suggestion), which hands back a [`SearchTicket`]. The outcome is then
//! applied with [`SearchSession::finish_search`]. Tickets from superseded
//! searches are discarded, so a slow response can never overwrite newer
//! results.

use crate::catalog::{is_suggestable, CardSource};
use crate::collection::{CollectionStore, KeyValueStore};
use crate::error::{CatalogError, CatalogResult, StorageResult};
use crate::models::Card;
use crate::price::market_price;
use crate::value_filter::{filter_valuable, DEFAULT_MIN_VALUE};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Suggesting,
    Searching,
    ResultsShown,
    ErrorShown,
}

/// Informational or error text shown in place of results
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMessage {
    /// Request succeeded but nothing matched the query
    NoCardsFound,
    /// Request succeeded but every card was below the value threshold
    NoneAboveThreshold { found: usize, threshold: f64 },
    /// Upstream returned 429
    RateLimited,
    /// Any other failure, with the underlying cause
    FetchFailed(String),
}

impl SearchMessage {
    /// True for actual failures, false for "nothing to show" outcomes
    pub fn is_failure(&self) -> bool {
        matches!(self, SearchMessage::RateLimited | SearchMessage::FetchFailed(_))
    }
}

impl fmt::Display for SearchMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMessage::NoCardsFound => write!(f, "No cards found."),
            SearchMessage::NoneAboveThreshold { found, threshold } => write!(
                f,
                "Found {} cards, but none are worth more than ${:.2}.",
                found, threshold
            ),
            SearchMessage::RateLimited => write!(
                f,
                "Too many requests. Please wait a moment before searching again."
            ),
            SearchMessage::FetchFailed(cause) => write!(f, "Failed to fetch cards. ({})", cause),
        }
    }
}

impl From<&CatalogError> for SearchMessage {
    fn from(err: &CatalogError) -> Self {
        if err.is_rate_limited() {
            SearchMessage::RateLimited
        } else {
            SearchMessage::FetchFailed(err.to_string())
        }
    }
}

/// Handle for one started search; pass it back to `finish_search`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One search result as displayed: the card, its price and whether it is owned
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow<'a> {
    pub card: &'a Card,
    pub price: Option<f64>,
    pub owned: bool,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Searching { started: Instant },
    Results(Vec<Card>),
    Error(SearchMessage),
}

#[derive(Debug)]
pub struct SearchSession {
    query: String,
    suggestions: Vec<String>,
    suggestions_open: bool,
    phase: Phase,
    generation: u64,
    min_value: f64,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VALUE)
    }
}

impl SearchSession {
    pub fn new(min_value: f64) -> Self {
        Self {
            query: String::new(),
            suggestions: Vec::new(),
            suggestions_open: false,
            phase: Phase::Idle,
            generation: 0,
            min_value,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Searching { .. } => SessionState::Searching,
            _ if self.suggestions_open => SessionState::Suggesting,
            Phase::Results(_) => SessionState::ResultsShown,
            Phase::Error(_) => SessionState::ErrorShown,
            Phase::Idle => SessionState::Idle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestions_open(&self) -> bool {
        self.suggestions_open
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.phase, Phase::Searching { .. })
    }

    /// Submit stays disabled while a search is running
    pub fn can_submit(&self) -> bool {
        !self.is_searching() && !self.query.trim().is_empty()
    }

    /// How long the running search has been waiting
    pub fn searching_for(&self) -> Option<Duration> {
        match self.phase {
            Phase::Searching { started } => Some(started.elapsed()),
            _ => None,
        }
    }

    /// Value-filtered cards of the last successful search
    pub fn results(&self) -> &[Card] {
        match &self.phase {
            Phase::Results(cards) => cards,
            _ => &[],
        }
    }

    pub fn message(&self) -> Option<&SearchMessage> {
        match &self.phase {
            Phase::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Update the query text. Returns the query to look suggestions up for,
    /// or `None` when it is too short (the dropdown is closed then).
    pub fn set_query(&mut self, text: &str) -> Option<String> {
        self.query = text.to_string();
        if is_suggestable(text) {
            Some(self.query.clone())
        } else {
            self.suggestions.clear();
            self.suggestions_open = false;
            None
        }
    }

    /// Apply a suggestion lookup. Results for an outdated query are ignored.
    /// An error means no suggestion source is available; the dropdown stays shut.
    pub fn apply_suggestions(&mut self, for_query: &str, result: CatalogResult<Vec<String>>) {
        if for_query != self.query || !is_suggestable(&self.query) {
            log::debug!("Ignoring suggestions for outdated query '{}'", for_query);
            return;
        }
        if self.is_searching() {
            return;
        }

        match result {
            Ok(names) => {
                self.suggestions = names;
                self.suggestions_open = true;
            }
            Err(e) => {
                log::warn!("Suggestions unavailable: {}", e);
                self.suggestions.clear();
                self.suggestions_open = false;
            }
        }
    }

    /// Input regained focus
    pub fn focus(&mut self) {
        if is_suggestable(&self.query) && !self.suggestions.is_empty() && !self.is_searching() {
            self.suggestions_open = true;
        }
    }

    /// Click outside the dropdown
    pub fn dismiss_suggestions(&mut self) {
        self.suggestions_open = false;
    }

    /// Start a search for the current query. Refused for a blank query or
    /// while another search is running.
    pub fn submit(&mut self) -> Option<SearchTicket> {
        if self.is_searching() {
            log::debug!("Search already running, submit ignored");
            return None;
        }
        if self.query.trim().is_empty() {
            return None;
        }
        Some(self.start_search(self.query.clone()))
    }

    /// Pick a suggestion: it becomes the query and a new search starts,
    /// superseding any running one.
    pub fn select_suggestion(&mut self, name: &str) -> Option<SearchTicket> {
        self.query = name.to_string();
        if name.trim().is_empty() {
            return None;
        }
        Some(self.start_search(name.to_string()))
    }

    fn start_search(&mut self, query: String) -> SearchTicket {
        self.generation += 1;
        self.suggestions_open = false;
        self.phase = Phase::Searching {
            started: Instant::now(),
        };
        log::info!("Searching for '{}' (search #{})", query.trim(), self.generation);
        SearchTicket {
            generation: self.generation,
            query,
        }
    }

    /// Apply the outcome of a search. Returns `false` if the ticket was
    /// superseded and the outcome dropped.
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        outcome: CatalogResult<Vec<Card>>,
    ) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding stale result for '{}' (search #{}, current #{})",
                ticket.query,
                ticket.generation,
                self.generation
            );
            return false;
        }

        self.suggestions_open = false;
        self.phase = match outcome {
            Ok(cards) => {
                let valuable = filter_valuable(&cards, self.min_value);
                log::info!(
                    "Found {} cards for '{}', {} worth at least {:.2}",
                    cards.len(),
                    ticket.query,
                    valuable.len(),
                    self.min_value
                );
                if !valuable.is_empty() {
                    Phase::Results(valuable)
                } else if cards.is_empty() {
                    Phase::Error(SearchMessage::NoCardsFound)
                } else {
                    Phase::Error(SearchMessage::NoneAboveThreshold {
                        found: cards.len(),
                        threshold: self.min_value,
                    })
                }
            }
            Err(e) => {
                log::error!("Search for '{}' failed: {}", ticket.query, e);
                Phase::Error(SearchMessage::from(&e))
            }
        };
        true
    }

    /// Run `ticket` against `source` and apply the outcome
    pub async fn search<C>(&mut self, source: &C, ticket: SearchTicket) -> bool
    where
        C: CardSource + ?Sized,
    {
        let outcome = source.search_cards(ticket.query()).await;
        self.finish_search(ticket, outcome)
    }

    /// Submit the current query and wait for it. Returns `false` if the
    /// submit was refused.
    pub async fn submit_and_search<C>(&mut self, source: &C) -> bool
    where
        C: CardSource + ?Sized,
    {
        match self.submit() {
            Some(ticket) => self.search(source, ticket).await,
            None => false,
        }
    }

    /// Results paired with price and current collection membership
    pub fn result_rows<'a, S: KeyValueStore>(
        &'a self,
        store: &CollectionStore<S>,
    ) -> Vec<ResultRow<'a>> {
        self.results()
            .iter()
            .map(|card| ResultRow {
                card,
                price: market_price(card),
                owned: store.contains(&card.id),
            })
            .collect()
    }

    /// Add the result card to the collection if absent, remove it if present.
    /// Returns the new membership, or `None` if `card_id` is not a current result.
    pub fn toggle<S: KeyValueStore>(
        &self,
        store: &mut CollectionStore<S>,
        card_id: &str,
    ) -> StorageResult<Option<bool>> {
        let Some(card) = self.results().iter().find(|c| c.id == card_id) else {
            return Ok(None);
        };

        if store.contains(card_id) {
            store.remove(card_id)?;
            Ok(Some(false))
        } else {
            store.add(card.clone())?;
            Ok(Some(true))
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
