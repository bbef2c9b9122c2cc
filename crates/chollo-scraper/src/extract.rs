//! Price extraction from scraped free text, for form pre-fill.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use chollo_core::price::parse_price;

static CURRENCY_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$€£]\s*\d+(?:[.,]\d+)*").expect("valid regex"));
static SEPARATED_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)+").expect("valid regex"));

/// Pulls the first price-looking token out of scraped text and parses it.
///
/// Currency-anchored tokens (`$ 1.500`) win over bare separated numbers
/// (`8.000,50`); a bare integer is never treated as a price, since product
/// titles are full of model numbers and capacities. `None` when nothing
/// price-like appears or the token parses to zero.
#[must_use]
pub fn first_price_in(text: &str) -> Option<Decimal> {
    let token = CURRENCY_PRICE_RE
        .find(text)
        .or_else(|| SEPARATED_NUMBER_RE.find(text))?
        .as_str();

    let price = parse_price(token);
    (price > Decimal::ZERO).then_some(price)
}
