//! Market price resolution for a single card

use crate::models::Card;

pub const HOLOFOIL: &str = "holofoil";
pub const REVERSE_HOLOFOIL: &str = "reverseHolofoil";
pub const NORMAL: &str = "normal";

/// Variants checked first, in this order
pub const PRIORITY_VARIANTS: [&str; 3] = [HOLOFOIL, REVERSE_HOLOFOIL, NORMAL];

/// Resolve the representative market price of a card.
///
/// Holofoil, then reverse holofoil, then normal. Failing those, the first
/// other variant (lexical order) carrying a usable market number. Variants
/// without a market field are skipped. `None` means the price is unknown.
pub fn market_price(card: &Card) -> Option<f64> {
    let prices = card.prices()?;

    PRIORITY_VARIANTS
        .iter()
        .filter_map(|variant| prices.get(*variant))
        .find_map(|price| price.usable_market())
        .or_else(|| {
            prices
                .iter()
                .filter(|(variant, _)| !PRIORITY_VARIANTS.contains(&variant.as_str()))
                .find_map(|(_, price)| price.usable_market())
        })
}

/// Format a resolved price for display ("$12.50", or "n/a" when unknown)
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(value) => format!("${:.2}", value),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
#[path = "price_tests.rs"]
mod tests;
