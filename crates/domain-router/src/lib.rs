//! Component C: assigns one of eleven domain tags per record from parsed
//! hints and resolved signals. Decision procedure is rule-numbered; the
//! first matching rule wins (spec §4.C). Misclassification never panics —
//! the worst case is an unknown physical unit falling through to
//! `Counts` with a reduced-confidence parse upstream.

use econ_core::{Domain, InputRecord, ParsedUnit, ResolvedSignals, TimeBasis, UnitTypeHint};
use once_cell::sync::Lazy;
use regex::Regex;

const FLOW_CATEGORIES: &[&str] = &["labour", "wages", "consumer", "trade-flow", "consumption"];

static ENERGY_COMMODITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(gwh|mwh|terajoule|mw|bcf|tcf|barrels?|bbl)\b").unwrap()
});
static ENERGY_CONTEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(electricity|generation|capacity|demand)\b").unwrap());

static AGRI_UNIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(tonnes?|bushels?|head|hectares?)\b").unwrap());
static AGRI_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(wheat|corn|maize|soybeans?|rice|cotton|livestock|crop|grain|coffee|cocoa|sugar|cattle|poultry|dairy)\b")
        .unwrap()
});

static METAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(gold|silver|copper|iron|steel|aluminum|aluminium|zinc|nickel|lithium)\b").unwrap()
});

const CRYPTO_TICKERS: &[&str] = &[
    "btc", "eth", "sol", "ada", "xrp", "bnb", "dot", "doge", "ltc", "trx", "matic", "gwei",
];

/// Route one record to its domain tag.
pub fn route(record: &InputRecord, parsed: &ParsedUnit, resolved: &ResolvedSignals) -> Domain {
    if parsed.unit_type_hint == UnitTypeHint::Percentage {
        return Domain::Percentages;
    }
    if parsed.unit_type_hint == UnitTypeHint::Index {
        return Domain::Indices;
    }
    if parsed.unit_type_hint == UnitTypeHint::Ratio && resolved.currency.is_none() {
        return Domain::Ratios;
    }

    let has_currency = resolved.currency.is_some();
    let flow_category = record
        .category_group
        .as_deref()
        .map(|c| FLOW_CATEGORIES.contains(&c.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if has_currency && (parsed.time_token != TimeBasis::None || flow_category) {
        return Domain::MonetaryFlow;
    }
    if has_currency {
        return Domain::MonetaryStock;
    }

    let haystack = format!(
        "{} {}",
        record.name.as_deref().unwrap_or(""),
        record.unit
    );

    if ENERGY_COMMODITY_RE.is_match(&haystack) {
        return if ENERGY_CONTEXT_RE.is_match(&haystack) {
            Domain::Energy
        } else {
            Domain::Commodities
        };
    }

    if AGRI_UNIT_RE.is_match(&haystack) && AGRI_KEYWORD_RE.is_match(&haystack) {
        return Domain::Agriculture;
    }

    if METAL_RE.is_match(&haystack) {
        return Domain::Metals;
    }

    let lower_name = record.name.as_deref().unwrap_or("").to_ascii_lowercase();
    let token_hit = lower_name
        .split(|c: char| !c.is_alphanumeric())
        .any(|tok| CRYPTO_TICKERS.contains(&tok));
    if token_hit {
        return Domain::Crypto;
    }

    Domain::Counts
}
