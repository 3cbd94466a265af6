//! Minimum-value filtering and client-side price ordering

use crate::models::Card;
use crate::price::market_price;
use std::cmp::Ordering;

/// Cards below this market price are hidden unless the caller overrides it
pub const DEFAULT_MIN_VALUE: f64 = 5.0;

/// Keep cards whose resolved price is known and at least `min_value`.
/// Input order is preserved.
pub fn filter_valuable(cards: &[Card], min_value: f64) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| market_price(card).is_some_and(|price| price >= min_value))
        .cloned()
        .collect()
}

/// Stable sort, most valuable first. Unknown prices go last.
pub fn sort_by_market_price_desc(cards: &mut [Card]) {
    cards.sort_by(|a, b| match (market_price(a), market_price(b)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
