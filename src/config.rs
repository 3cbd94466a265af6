//! Runtime configuration
//!
//! Defaults are overlaid from environment variables; command-line flags in
//! `main` override both.

use crate::value_filter::DEFAULT_MIN_VALUE;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.pokemontcg.io/v2";
pub const DEFAULT_TAXONOMY_URL: &str = "https://pokeapi.co/api/v2/pokemon";
/// Upstream refuses pages larger than this
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = "collectors_vault/0.1";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub taxonomy_url: String,
    pub page_size: u32,
    pub min_value: f64,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            taxonomy_url: DEFAULT_TAXONOMY_URL.to_string(),
            page_size: MAX_PAGE_SIZE,
            min_value: DEFAULT_MIN_VALUE,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.update_from_env();
        config
    }

    fn update_from_env(&mut self) {
        if let Ok(url) = env::var("POKEMONTCG_API_URL") {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = env::var("POKEMONTCG_API_KEY") {
            self.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Ok(url) = env::var("VAULT_TAXONOMY_URL") {
            self.taxonomy_url = url;
        }
        if let Ok(size) = env::var("VAULT_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(size) => self.page_size = clamp_page_size(size),
                Err(e) => log::warn!("Ignoring VAULT_PAGE_SIZE={}: {}", size, e),
            }
        }
        if let Ok(min_value) = env::var("VAULT_MIN_VALUE") {
            match min_value.parse::<f64>() {
                Ok(value) if value.is_finite() => self.min_value = value,
                _ => log::warn!("Ignoring VAULT_MIN_VALUE={}", min_value),
            }
        }
        if let Ok(ms) = env::var("VAULT_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.debounce = Duration::from_millis(ms),
                Err(e) => log::warn!("Ignoring VAULT_DEBOUNCE_MS={}: {}", ms, e),
            }
        }
        if let Ok(secs) = env::var("VAULT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout = Duration::from_secs(secs),
                _ => log::warn!("Ignoring VAULT_TIMEOUT_SECS={}", secs),
            }
        }
        if let Ok(dir) = env::var("VAULT_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }
}

/// Returns the default data directory: ~/.local/share/collectors_vault
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("collectors_vault")
}

/// Keep page sizes within what the catalog accepts
pub fn clamp_page_size(size: u32) -> u32 {
    size.clamp(1, MAX_PAGE_SIZE)
}
