//! Pokémon TCG catalog client
//!
//! Uses async reqwest for non-blocking HTTP requests. The upstream service is
//! known to reject `orderBy` combined with `select`, and sometimes to fail
//! or time out on `orderBy` on its own, so server-side sorting is only ever an optimisation: results
//! are always re-sorted locally when a sort is requested.

use crate::config::{clamp_page_size, Config, USER_AGENT};
use crate::error::{CatalogError, CatalogResult};
use crate::models::Card;
use crate::value_filter::sort_by_market_price_desc;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Server-side sort expression for "most valuable first"
const ORDER_BY_MARKET_DESC: &str = "-tcgplayer.prices.holofoil.market";

/// Fields every `select` must carry for a `Card` to deserialize
const REQUIRED_FIELDS: [&str; 2] = ["id", "name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    MarketPriceDesc,
}

/// Optional query shaping for a catalog search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub sort: Option<SortOrder>,
    /// Restrict the returned fields (`select=`)
    pub select: Option<Vec<String>>,
}

/// One page of `/cards` results
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardPage {
    data: Vec<Card>,
    #[serde(default)]
    total_count: Option<u64>,
}

/// `/cards/{id}` wraps the card in `data`
#[derive(Debug, Deserialize)]
struct CardEnvelope {
    data: Card,
}

/// Anything that can answer a card search. The session depends on this
/// rather than on the HTTP client directly.
#[async_trait]
pub trait CardSource: Send + Sync {
    async fn search_cards(&self, query: &str) -> CatalogResult<Vec<Card>>;
}

/// Stateless client for the card catalog; safe to share and call concurrently
#[derive(Debug, Clone)]
pub struct CatalogClient {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    api_key: Option<String>,
    page_size: u32,
    options: SearchOptions,
}

impl CatalogClient {
    /// Build a client from configuration (base URL, API key, page size, timeout)
    pub fn new(config: &Config) -> CatalogResult<Self> {
        log::info!("Creating catalog client for {}", config.api_url);
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            page_size: clamp_page_size(config.page_size),
            options: SearchOptions::default(),
        })
    }

    /// Client against an arbitrary base URL with default settings
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            page_size: clamp_page_size(u32::MAX),
            options: SearchOptions::default(),
        }
    }

    /// Options applied by [`CatalogClient::search_cards`]
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = clamp_page_size(page_size);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Search by name prefix using the client's default options.
    ///
    /// A blank query returns no cards without touching the network.
    pub async fn search_cards(&self, query: &str) -> CatalogResult<Vec<Card>> {
        self.search_cards_with(query, &self.options).await
    }

    /// Search by name prefix with explicit sort/field options
    pub async fn search_cards_with(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> CatalogResult<Vec<Card>> {
        let Some(expression) = name_prefix_query(query) else {
            log::debug!("Skipping catalog search for blank query");
            return Ok(Vec::new());
        };

        let mut params = vec![("q", expression), ("pageSize", self.page_size.to_string())];
        if let Some(fields) = &options.select {
            params.push(("select", select_fields(fields)));
        }

        let server_sort = options.sort.is_some() && options.select.is_none();
        if options.sort.is_some() && !server_sort {
            log::debug!("Not combining orderBy with select, sorting client-side");
        }

        let page = if server_sort {
            let mut sorted = params.clone();
            sorted.push(("orderBy", ORDER_BY_MARKET_DESC.to_string()));
            match self.fetch_page(&sorted).await {
                Ok(page) => page,
                Err(e) if is_failed_server_sort(&e) => {
                    log::warn!("Server-side sort failed ({}), retrying without orderBy", e);
                    self.fetch_page(&params).await?
                }
                Err(e) => return Err(e),
            }
        } else {
            self.fetch_page(&params).await?
        };

        if let Some(total) = page.total_count.filter(|t| *t > page.data.len() as u64) {
            log::info!(
                "Catalog has {} matches for '{}', showing the first {}",
                total,
                query.trim(),
                page.data.len()
            );
        }
        let mut cards = page.data;

        if options.sort == Some(SortOrder::MarketPriceDesc) {
            sort_by_market_price_desc(&mut cards);
        }

        log::info!("Catalog returned {} cards for '{}'", cards.len(), query.trim());
        Ok(cards)
    }

    /// Fetch a single card by catalog id
    pub async fn get_card(&self, id: &str) -> CatalogResult<Card> {
        let url = format!("{}/cards/{}", self.base_url, urlencoding::encode(id.trim()));
        let body = self.get(&url, &[]).await?;
        let envelope: CardEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    async fn fetch_page(&self, params: &[(&str, String)]) -> CatalogResult<CardPage> {
        let url = format!("{}/cards", self.base_url);
        let body = self.get(&url, params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET `url` with query `params`, returning the body of a successful response
    pub(crate) async fn get(&self, url: &str, params: &[(&str, String)]) -> CatalogResult<String> {
        log::debug!("Fetching from catalog: {} {:?}", url, params);

        let mut request = self.client.get(url).query(params);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        read_success_body(request.send().await?).await
    }
}

#[async_trait]
impl CardSource for CatalogClient {
    async fn search_cards(&self, query: &str) -> CatalogResult<Vec<Card>> {
        CatalogClient::search_cards(self, query).await
    }
}

/// Build the `q` expression for a case-insensitive name-prefix match.
/// Returns `None` for blank input. Quotes and wildcards in the input are
/// dropped so the expression stays well-formed.
pub fn name_prefix_query(query: &str) -> Option<String> {
    let cleaned: String = query.chars().filter(|c| *c != '"' && *c != '*').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(format!("name:\"{}*\"", cleaned))
}

/// Comma-separated `select` list, always including the required fields
fn select_fields(fields: &[String]) -> String {
    let mut selected: Vec<&str> = REQUIRED_FIELDS.to_vec();
    for field in fields.iter().map(|f| f.trim()) {
        if !field.is_empty() && !selected.contains(&field) {
            selected.push(field);
        }
    }
    selected.join(",")
}

/// Failures of an `orderBy` request worth retrying unsorted: the catalog
/// rejecting the parameter, timing out on it, or erroring server-side.
/// Rate limiting is never retried.
fn is_failed_server_sort(err: &CatalogError) -> bool {
    match err {
        CatalogError::HttpStatus(status) => {
            matches!(
                *status,
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
            ) || status.is_server_error()
        }
        CatalogError::Network(e) => e.is_timeout(),
        _ => false,
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Map a response to its body, or to the matching error for non-success statuses
pub(crate) async fn read_success_body(response: reqwest::Response) -> CatalogResult<String> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = retry_after(response.headers());
        log::warn!("Rate limited by {} (retry after: {:?})", response.url(), retry_after);
        return Err(CatalogError::RateLimited { retry_after });
    }

    if !status.is_success() {
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        log::error!(
            "Request to {} failed with {}: {}",
            url,
            status,
            body.chars().take(200).collect::<String>()
        );
        return Err(CatalogError::HttpStatus(status));
    }

    Ok(response.text().await?)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
