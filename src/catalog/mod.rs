//! Remote card catalog: search, single-card lookup and name suggestions

mod client;
mod debounce;
mod suggestions;

pub use client::{name_prefix_query, CardSource, CatalogClient, SearchOptions, SortOrder};
pub use debounce::{DebouncedSuggestions, SuggestionUpdate};
pub use suggestions::{
    capitalize_first, is_suggestable, rank_names, NameTaxonomy, SuggestionProvider,
    MAX_SUGGESTIONS, MIN_PREFIX_LEN,
};
