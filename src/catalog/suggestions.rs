//! Name suggestions while typing
//!
//! Two sources: a name taxonomy fetched once and filtered in memory, or the
//! card catalog queried per keystroke (wrap that one in
//! [`DebouncedSuggestions`](super::DebouncedSuggestions)).

use super::client::{name_prefix_query, read_success_body, CatalogClient};
use crate::config::{Config, USER_AGENT};
use crate::error::{CatalogError, CatalogResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::OnceCell;

/// Shorter inputs never produce suggestions
pub const MIN_PREFIX_LEN: usize = 2;
pub const MAX_SUGGESTIONS: usize = 10;

/// Upper bound on taxonomy entries requested in one go
const TAXONOMY_LIMIT: u32 = 2000;
/// Catalog page used to collect candidate names per keystroke
const SUGGESTION_PAGE_SIZE: u32 = 50;

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Up to [`MAX_SUGGESTIONS`] names for `prefix`, deduplicated and sorted.
    /// Returns an empty list without any I/O for too-short prefixes.
    async fn suggestions(&self, prefix: &str) -> CatalogResult<Vec<String>>;
}

pub fn is_suggestable(prefix: &str) -> bool {
    prefix.trim().chars().count() >= MIN_PREFIX_LEN
}

/// Filter `names` by case-insensitive substring, drop case-insensitive
/// duplicates, sort alphabetically and cap at [`MAX_SUGGESTIONS`].
pub fn rank_names<I, S>(names: I, query: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let needle = query.trim().to_lowercase();
    let mut seen = HashSet::new();

    let mut matches: Vec<String> = names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref().trim();
            let folded = name.to_lowercase();
            (folded.contains(&needle) && seen.insert(folded)).then(|| name.to_string())
        })
        .collect();

    matches.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    matches.truncate(MAX_SUGGESTIONS);
    matches
}

/// "bulbasaur" -> "Bulbasaur"
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct TaxonomyPage {
    results: Vec<TaxonomyEntry>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyEntry {
    name: String,
}

/// Full species name list, fetched on first use and kept for the process lifetime
pub struct NameTaxonomy {
    client: reqwest::Client,
    url: String,
    names: OnceCell<Vec<String>>,
}

impl NameTaxonomy {
    pub fn new(config: &Config) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.taxonomy_url.clone(),
            names: OnceCell::new(),
        })
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            names: OnceCell::new(),
        }
    }

    /// Cached names, fetching them on first call. A failed fetch is not
    /// cached; the next call tries again.
    pub async fn names(&self) -> CatalogResult<&[String]> {
        let names = self.names.get_or_try_init(|| self.fetch()).await?;
        Ok(names.as_slice())
    }

    pub fn is_loaded(&self) -> bool {
        self.names.initialized()
    }

    async fn fetch(&self) -> CatalogResult<Vec<String>> {
        log::info!("Fetching name taxonomy from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .query(&[("limit", TAXONOMY_LIMIT)])
            .send()
            .await?;
        let body = read_success_body(response).await?;
        let page: TaxonomyPage = serde_json::from_str(&body)?;

        let names: Vec<String> = page
            .results
            .iter()
            .map(|entry| capitalize_first(&entry.name))
            .collect();

        if names.is_empty() {
            return Err(CatalogError::Unavailable("name taxonomy is empty".to_string()));
        }

        log::info!("Cached {} names from taxonomy", names.len());
        Ok(names)
    }
}

#[async_trait]
impl SuggestionProvider for NameTaxonomy {
    async fn suggestions(&self, prefix: &str) -> CatalogResult<Vec<String>> {
        if !is_suggestable(prefix) {
            return Ok(Vec::new());
        }
        let names = self.names().await?;
        Ok(rank_names(names, prefix))
    }
}

#[derive(Debug, Deserialize)]
struct NamePage {
    data: Vec<NameOnly>,
}

#[derive(Debug, Deserialize)]
struct NameOnly {
    name: String,
}

/// Per-keystroke lookup against the catalog. Only `select` is sent, never
/// `orderBy`.
#[async_trait]
impl SuggestionProvider for CatalogClient {
    async fn suggestions(&self, prefix: &str) -> CatalogResult<Vec<String>> {
        if !is_suggestable(prefix) {
            return Ok(Vec::new());
        }
        let Some(expression) = name_prefix_query(prefix) else {
            return Ok(Vec::new());
        };

        let url = format!("{}/cards", self.base_url);
        let params = [
            ("q", expression),
            ("pageSize", SUGGESTION_PAGE_SIZE.to_string()),
            ("select", "name".to_string()),
        ];
        let body = self.get(&url, &params).await?;
        let page: NamePage = serde_json::from_str(&body)?;

        Ok(rank_names(page.data.iter().map(|card| card.name.as_str()), prefix))
    }
}

#[cfg(test)]
#[path = "suggestions_tests.rs"]
mod tests;
