//! Component A: tokenizes a free-text unit string into currency, scale,
//! time, and type-hint signals.
//!
//! The parser is rule-based, case-insensitive, and whitespace-tolerant.
//! It never rejects a unit string outright except for unparseable binary
//! or control characters — every other input gets a best-effort parse,
//! possibly with reduced `parsing_confidence`.

use econ_core::{CurrencyCode, NormalizeError, ParsedUnit, Scale, TimeBasis, UnitTypeHint};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static ISO_CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "CNY", "INR", "BRL", "RUB", "ZAR",
        "MXN", "KRW", "SGD", "HKD", "SEK", "NOK", "DKK", "PLN", "TRY", "THB", "IDR", "MYR", "PHP",
        "VND", "AED", "SAR", "ILS", "EGP", "NGN", "KES", "GHS", "ARS", "CLP", "COP", "PEN", "PKR",
        "BDT", "LKR", "UAH", "CZK", "HUF", "RON", "BGN", "ISK", "TWD", "QAR", "KWD", "BHD", "OMR",
        "JOD", "MAD", "TND", "DZD", "IQD", "IRR", "AFN", "KZT", "UZS", "MNT", "NPR", "MMK", "KHR",
        "LAK", "XOF", "XAF", "ETB", "TZS", "UGX", "ZMW", "MWK", "BWP", "NAD", "MUR", "FJD", "LBP",
        "AMD", "AZN", "GEL", "BYN", "MDL", "RSD", "MKD", "BAM", "HRK", "VEF", "YER", "LYD",
        "SDG", "SSP", "SYP",
    ]
    .into_iter()
    .collect()
});

static ISO_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z]{3}\b").unwrap());

struct ScaleMatch {
    scale: Scale,
    pattern: &'static str,
}

fn match_scale(lower: &str, original: &str) -> Option<ScaleMatch> {
    static THOUSANDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(thousands?|ths?|k)\b").unwrap());
    static MILLIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(millions?|mil|m)\b").unwrap());
    static BILLIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(billions?|bil|b)\b").unwrap());
    static TRILLIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(trillions?|t)\b").unwrap());
    static HUNDRED_MILLIONS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\bhundred\s+millions?\b").unwrap());
    static CRORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcrores?\b").unwrap());
    // `Scale` has no 10^2 variant (spec §3's fixed list stops at
    // hundred_millions/crores); a bare "hundred" folds into `Ones` with a
    // dedicated pattern tag so the caller can penalize confidence for it
    // (see `parse_unit`'s `bare_hundred` check).
    static HUNDRED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhundred\b").unwrap());

    let mut found = Vec::new();
    if HUNDRED_MILLIONS.is_match(lower) || original.contains('\u{5104}') {
        found.push(ScaleMatch {
            scale: Scale::HundredMillions,
            pattern: "hundred_million",
        });
    }
    if CRORES.is_match(lower) {
        found.push(ScaleMatch {
            scale: Scale::Crores,
            pattern: "crore",
        });
    }
    if TRILLIONS.is_match(lower) {
        found.push(ScaleMatch {
            scale: Scale::Trillions,
            pattern: "trillion",
        });
    }
    if BILLIONS.is_match(lower) {
        found.push(ScaleMatch {
            scale: Scale::Billions,
            pattern: "billion",
        });
    }
    if MILLIONS.is_match(lower) {
        found.push(ScaleMatch {
            scale: Scale::Millions,
            pattern: "million",
        });
    }
    if THOUSANDS.is_match(lower) {
        found.push(ScaleMatch {
            scale: Scale::Thousands,
            pattern: "thousand",
        });
    }
    if HUNDRED.is_match(lower) {
        found.push(ScaleMatch {
            scale: Scale::Ones,
            pattern: "bare_hundred",
        });
    }

    // Most specific (largest explicit magnitude) wins.
    found.into_iter().max_by_key(|m| m.scale.exponent())
}

fn match_currency_token(lower: &str, original: &str) -> Option<(CurrencyCode, &'static str)> {
    if lower.contains("national currency")
        || lower.contains("local currency")
        || Regex::new(r"\blcu\b").unwrap().is_match(lower)
    {
        return Some((CurrencyCode::Lcu, "lcu_sentinel"));
    }
    if lower.contains("current international dollar")
        || Regex::new(r"\bppp\b").unwrap().is_match(lower)
    {
        return Some((CurrencyCode::PppIntl, "ppp_sentinel"));
    }

    for mat in ISO_TOKEN_RE.find_iter(original) {
        let upper = mat.as_str().to_ascii_uppercase();
        if ISO_CODES.contains(upper.as_str()) {
            return Some((CurrencyCode::Iso(upper), "iso_code"));
        }
    }

    if original.contains('€') {
        return Some((CurrencyCode::Iso("EUR".to_string()), "symbol"));
    }
    if original.contains('£') {
        return Some((CurrencyCode::Iso("GBP".to_string()), "symbol"));
    }
    if original.contains('¥') {
        return Some((CurrencyCode::Iso("JPY".to_string()), "symbol"));
    }
    if original.contains('$') {
        return Some((CurrencyCode::Iso("USD".to_string()), "symbol"));
    }

    None
}

fn match_time_token(lower: &str) -> Option<(TimeBasis, &'static str)> {
    static HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"per\s+hours?|\bhr\b").unwrap());
    static DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"per\s+days?|/d\b|/day\b").unwrap());
    static WEEK: Lazy<Regex> = Lazy::new(|| Regex::new(r"per\s+weeks?|/wk\b").unwrap());
    static MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"per\s+months?|/mo\b").unwrap());
    static QUARTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"per\s+quarters?|/qtr\b").unwrap());
    static YEAR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"per\s+years?|per\s+annum|/yr\b").unwrap());

    if YEAR.is_match(lower) {
        Some((TimeBasis::Year, "per_year"))
    } else if QUARTER.is_match(lower) {
        Some((TimeBasis::Quarter, "per_quarter"))
    } else if MONTH.is_match(lower) {
        Some((TimeBasis::Month, "per_month"))
    } else if WEEK.is_match(lower) {
        Some((TimeBasis::Week, "per_week"))
    } else if DAY.is_match(lower) {
        Some((TimeBasis::Day, "per_day"))
    } else if HOUR.is_match(lower) {
        Some((TimeBasis::Hour, "per_hour"))
    } else {
        None
    }
}

/// Growth-rate markers. Informational only: they signal a YoY/QoQ/MoM
/// comparison, not a flow's time basis, so they never set `time_token`.
fn has_growth_marker(lower: &str) -> bool {
    lower.contains("yoy") || lower.contains("qoq") || lower.contains("mom")
}

static PHYSICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(years|hours|kg|celsius|mm|doses|tonnes?|barrels?|bbl|gwh|mwh|tcf|bcf|kt|mt|sq\.?\s*metre|square\s*metre)\b",
    )
    .unwrap()
});

static COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(units|persons|people|households|companies|vehicles)\b").unwrap()
});

fn match_type_hints(lower: &str) -> Vec<UnitTypeHint> {
    let mut hints = Vec::new();

    let is_percentage = lower.contains('%')
        || lower.contains("percent")
        || Regex::new(r"\bpp\b").unwrap().is_match(lower)
        || lower.contains("basis points")
        || Regex::new(r"\bbps\b").unwrap().is_match(lower);
    if is_percentage {
        hints.push(UnitTypeHint::Percentage);
    }

    let is_index = Regex::new(r"\bindex\b|\bpoints?\b|\bpts\b")
        .unwrap()
        .is_match(lower);
    if is_index {
        hints.push(UnitTypeHint::Index);
    }

    let is_ratio = Regex::new(r"\bratio\b|\btimes\b").unwrap().is_match(lower);
    if is_ratio {
        hints.push(UnitTypeHint::Ratio);
    }

    let is_rate = lower.contains("per 1000")
        || lower.contains("per 100")
        || lower.contains("per one million")
        || lower.contains("per 1,000");
    if is_rate {
        hints.push(UnitTypeHint::Rate);
    }

    if PHYSICAL_RE.is_match(lower) {
        hints.push(UnitTypeHint::Physical);
    }

    if COUNT_RE.is_match(lower) {
        hints.push(UnitTypeHint::Count);
    }

    hints
}

/// Parse a free-text unit string into its component signals.
///
/// Returns `Err(NormalizeError::MalformedUnit)` only when the input
/// contains unparseable control characters; every other input — however
/// strange — produces a best-effort `ParsedUnit`.
pub fn parse_unit(unit: &str) -> Result<ParsedUnit, NormalizeError> {
    if unit
        .chars()
        .any(|c| c.is_control() && c != '\t' && c != '\n' && c != '\r')
    {
        return Err(NormalizeError::MalformedUnit(format!(
            "unit string contains unparseable control characters: {unit:?}"
        )));
    }

    if unit.trim().is_empty() {
        return Ok(ParsedUnit::empty());
    }

    let lower = unit.to_lowercase();

    let scale_match = match_scale(&lower, unit);
    let currency_match = match_currency_token(&lower, unit);
    let time_match = match_time_token(&lower);
    let growth_marker = has_growth_marker(&lower);
    let mut type_hints = match_type_hints(&lower);

    // Composite physical price: "USD/barrel", "EUR/MWh" carry a currency
    // token *and* behave as a per-unit ratio rather than a plain physical
    // quantity (spec §4.A).
    let is_composite_physical_price = currency_match.is_some()
        && (lower.contains('/') || lower.contains(" per "))
        && type_hints.contains(&UnitTypeHint::Physical);
    if is_composite_physical_price {
        type_hints.retain(|h| *h != UnitTypeHint::Physical);
        if !type_hints.contains(&UnitTypeHint::Ratio) {
            type_hints.push(UnitTypeHint::Ratio);
        }
    }

    let unit_type_hint = if currency_match.is_some() && !is_composite_physical_price {
        UnitTypeHint::Currency
    } else {
        type_hints.first().copied().unwrap_or(UnitTypeHint::Unknown)
    };

    let mut parsing_confidence: f64 = 1.0;
    let no_scale_and_no_type = scale_match.is_none() && type_hints.is_empty() && currency_match.is_none();
    if no_scale_and_no_type {
        parsing_confidence -= 0.1;
    }
    let distinct_hints: HashSet<_> = type_hints.iter().collect();
    if distinct_hints.len() > 1 {
        parsing_confidence -= 0.1;
    }
    if scale_match.as_ref().map(|m| m.pattern) == Some("bare_hundred") {
        parsing_confidence -= 0.1;
    }
    let parsing_confidence = parsing_confidence.clamp(0.0, 1.0);

    let mut matched_pattern_parts = Vec::new();
    if let Some(m) = &scale_match {
        matched_pattern_parts.push(m.pattern);
    }
    if let Some((_, p)) = &currency_match {
        matched_pattern_parts.push(p);
    }
    if let Some((_, p)) = &time_match {
        matched_pattern_parts.push(p);
    }
    if growth_marker {
        matched_pattern_parts.push("growth_marker");
    }
    if is_composite_physical_price {
        matched_pattern_parts.push("composite_physical_price");
    }
    if matched_pattern_parts.is_empty() {
        matched_pattern_parts.push("no_match");
    }

    Ok(ParsedUnit {
        currency_token: currency_match.map(|(c, _)| c),
        scale_token: scale_match.map(|m| m.scale).unwrap_or(Scale::Ones),
        time_token: time_match.map(|(t, _)| t).unwrap_or(TimeBasis::None),
        unit_type_hint,
        matched_pattern: matched_pattern_parts.join("+"),
        parsing_confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_usd_million() {
        let parsed = parse_unit("USD Million").unwrap();
        assert_eq!(parsed.currency_token, Some(CurrencyCode::Iso("USD".into())));
        assert_eq!(parsed.scale_token, Scale::Millions);
        assert_eq!(parsed.time_token, TimeBasis::None);
    }

    #[test]
    fn parses_eur_billion() {
        let parsed = parse_unit("EUR Billion").unwrap();
        assert_eq!(parsed.currency_token, Some(CurrencyCode::Iso("EUR".into())));
        assert_eq!(parsed.scale_token, Scale::Billions);
    }

    #[test]
    fn parses_flow_with_time_basis() {
        let parsed = parse_unit("USD per year").unwrap();
        assert_eq!(parsed.currency_token, Some(CurrencyCode::Iso("USD".into())));
        assert_eq!(parsed.time_token, TimeBasis::Year);
    }

    #[test]
    fn parses_percentage() {
        let parsed = parse_unit("percent").unwrap();
        assert_eq!(parsed.unit_type_hint, UnitTypeHint::Percentage);
        assert_eq!(parsed.currency_token, None);
    }

    #[test]
    fn parses_percent_of_gdp() {
        let parsed = parse_unit("% of GDP").unwrap();
        assert_eq!(parsed.unit_type_hint, UnitTypeHint::Percentage);
    }

    #[test]
    fn parses_index_points() {
        let parsed = parse_unit("Index Points").unwrap();
        assert_eq!(parsed.unit_type_hint, UnitTypeHint::Index);
    }

    #[test]
    fn parses_count_millions_of_items() {
        let parsed = parse_unit("Million items").unwrap();
        assert_eq!(parsed.scale_token, Scale::Millions);
        assert_eq!(parsed.currency_token, None);
    }

    #[test]
    fn parses_composite_physical_price_as_ratio() {
        let parsed = parse_unit("USD/barrel").unwrap();
        assert_eq!(parsed.currency_token, Some(CurrencyCode::Iso("USD".into())));
        assert_eq!(parsed.unit_type_hint, UnitTypeHint::Ratio);
    }

    #[test]
    fn parses_lcu_sentinel() {
        let parsed = parse_unit("National Currency Million").unwrap();
        assert_eq!(parsed.currency_token, Some(CurrencyCode::Lcu));
    }

    #[test]
    fn parses_ppp_sentinel() {
        let parsed = parse_unit("Current International Dollar").unwrap();
        assert_eq!(parsed.currency_token, Some(CurrencyCode::PppIntl));
    }

    #[test]
    fn empty_unit_is_all_null_with_reduced_confidence() {
        let parsed = parse_unit("").unwrap();
        assert_eq!(parsed.currency_token, None);
        assert_eq!(parsed.scale_token, Scale::Ones);
        assert_eq!(parsed.unit_type_hint, UnitTypeHint::Unknown);
        assert!((parsed.parsing_confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn rejects_control_characters() {
        let err = parse_unit("USD\u{0007}Million").unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedUnit(_)));
    }

    #[test]
    fn physical_unit_tonnes() {
        let parsed = parse_unit("tonnes").unwrap();
        assert_eq!(parsed.unit_type_hint, UnitTypeHint::Physical);
    }

    #[test]
    fn rate_per_1000_people() {
        let parsed = parse_unit("per 1000 people").unwrap();
        assert_eq!(parsed.unit_type_hint, UnitTypeHint::Rate);
    }

    #[test]
    fn bare_hundred_folds_into_ones_with_reduced_confidence() {
        let parsed = parse_unit("hundred units").unwrap();
        assert_eq!(parsed.scale_token, Scale::Ones);
        assert!(parsed.parsing_confidence < 1.0);
    }

    #[test]
    fn hundred_million_is_not_confused_with_bare_hundred() {
        let parsed = parse_unit("USD hundred million").unwrap();
        assert_eq!(parsed.scale_token, Scale::HundredMillions);
    }
}
