//! Collector's Vault - trading card search and collection valuation
//!
//! Searches the Pokémon TCG catalog by name, keeps only cards worth at least
//! a threshold, and maintains a persisted personal collection with a running
//! market value total.

pub mod catalog;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod price;
pub mod session;
pub mod value_filter;

pub use catalog::{
    CardSource, CatalogClient, DebouncedSuggestions, NameTaxonomy, SearchOptions, SortOrder,
    SuggestionProvider,
};
pub use collection::{CollectionStore, FileStore, KeyValueStore, MemoryStore, SqliteStore};
pub use config::Config;
pub use error::{CatalogError, CatalogResult, StorageError, StorageResult};
pub use models::Card;
pub use price::market_price;
pub use session::{SearchMessage, SearchSession, SessionState};
pub use value_filter::{filter_valuable, DEFAULT_MIN_VALUE};
