//! Card data as returned by the Pokémon TCG catalog
//!
//! Unknown upstream fields are kept in `extra` maps so a persisted card
//! reads back as the same `Card`. Known optional fields that are `null` or
//! missing are both `None` and are left out when writing, so the stored JSON
//! is not byte-identical to the fetched payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Price records keyed by finish variant ("holofoil", "reverseHolofoil", ...).
/// Ordered so fallback iteration is deterministic.
pub type PriceBlock = BTreeMap<String, VariantPrice>;

/// A single catalog card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<String>,
    #[serde(default)]
    pub images: CardImages,
    #[serde(default)]
    pub set: CardSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcgplayer: Option<TcgPlayer>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardImages {
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub large: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub series: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// TCGplayer market data attached to a card
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcgPlayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prices: Option<PriceBlock>,
}

/// Price record for one finish variant. Every number may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPrice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_low: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VariantPrice {
    /// Market price if it is a real, non-zero number
    pub fn usable_market(&self) -> Option<f64> {
        self.market.filter(|m| m.is_finite() && *m != 0.0)
    }
}

impl Card {
    /// Minimal card with no price data
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supertype: None,
            images: CardImages::default(),
            set: CardSet::default(),
            tcgplayer: None,
            extra: Map::new(),
        }
    }

    /// Attach (or replace) the market price for one variant
    pub fn with_market_price(mut self, variant: &str, market: f64) -> Self {
        self.tcgplayer
            .get_or_insert_with(TcgPlayer::default)
            .prices
            .get_or_insert_with(PriceBlock::new)
            .insert(
                variant.to_string(),
                VariantPrice {
                    market: Some(market),
                    ..VariantPrice::default()
                },
            );
        self
    }

    /// Price block, if the upstream supplied one
    pub fn prices(&self) -> Option<&PriceBlock> {
        self.tcgplayer.as_ref()?.prices.as_ref()
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
