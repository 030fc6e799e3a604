//! Component B: merges the unit parse with an input record's structured
//! hints into canonical `(currency, scale, time, is_cumulative)` signals,
//! applying the conflict-resolution precedence from spec §4.B.

use econ_core::{
    CurrencyCode, InputRecord, NormalizeConfig, NormalizeError, ParsedUnit, Periodicity,
    ResolvedSignals, Scale, SignalSource, TimeBasis,
};

const SCALE_PATTERN_MARKERS: &[(&str, Scale)] = &[
    ("hundred_million", Scale::HundredMillions),
    ("crore", Scale::Crores),
    ("trillion", Scale::Trillions),
    ("billion", Scale::Billions),
    ("million", Scale::Millions),
    ("thousand", Scale::Thousands),
];

/// Whether the unit string itself carried an explicit scale token, as
/// opposed to `ParsedUnit::scale_token` defaulting to `Ones` for lack of
/// one. `matched_pattern` is the debugging breadcrumb the parser leaves
/// for exactly this kind of downstream disambiguation.
fn scale_is_explicit_in_unit(parsed: &ParsedUnit) -> bool {
    SCALE_PATTERN_MARKERS
        .iter()
        .any(|(marker, _)| parsed.matched_pattern.contains(marker))
}

fn periodicity_to_time_basis(periodicity: Periodicity) -> TimeBasis {
    match periodicity {
        Periodicity::Daily => TimeBasis::Day,
        Periodicity::Weekly => TimeBasis::Week,
        Periodicity::Monthly => TimeBasis::Month,
        Periodicity::Quarterly => TimeBasis::Quarter,
        Periodicity::Yearly => TimeBasis::Year,
    }
}

/// Heuristic used only to pick the default time basis (spec §4.B rule 1
/// requires knowing whether a record is a monetary flow, which is the
/// Domain Router's job and runs *after* signal resolution in the
/// documented dataflow). Resolved as an Open Question in DESIGN.md: the
/// resolver reimplements the cheap half of the Domain Router's rule 4
/// condition locally rather than depending on `domain-router`, keeping
/// component layering acyclic.
fn looks_like_monetary_flow(record: &InputRecord, parsed: &ParsedUnit) -> bool {
    let has_currency = parsed.currency_token.is_some() || record.currency_code.is_some();
    let has_time_signal = parsed.time_token != TimeBasis::None || record.periodicity.is_some();
    let flow_category = record
        .category_group
        .as_deref()
        .map(|c| {
            matches!(
                c.to_ascii_lowercase().as_str(),
                "labour" | "wages" | "consumer" | "trade-flow" | "consumption"
            )
        })
        .unwrap_or(false);
    has_currency && (has_time_signal || flow_category)
}

fn is_cumulative_by_name(record: &InputRecord, parsed_unit_text: &str) -> bool {
    let haystack = format!(
        "{} {}",
        record.name.as_deref().unwrap_or(""),
        parsed_unit_text
    )
    .to_ascii_lowercase();
    haystack.contains("ytd")
        || haystack.contains("cumulative")
        || haystack.contains("year-to-date")
        || haystack.contains("running total")
}

fn is_cumulative_by_samples(record: &InputRecord) -> bool {
    if record.sample_values.len() < 6 {
        return false;
    }
    let mut sorted = record.sample_values.clone();
    sorted.sort_by_key(|(date, _)| *date);
    sorted
        .windows(6)
        .any(|w| w.windows(2).all(|pair| pair[1].1 >= pair[0].1))
}

/// Resolve canonical signals for one record from its unit parse and
/// structured hints.
pub fn resolve_signals(
    record: &InputRecord,
    parsed: &ParsedUnit,
    config: &NormalizeConfig,
) -> Result<ResolvedSignals, NormalizeError> {
    let mut notes = Vec::new();

    // --- Currency ---
    let unit_currency = parsed.currency_token.clone();
    let field_currency = record.currency_code.as_deref().map(CurrencyCode::parse);

    if let (Some(CurrencyCode::Iso(u)), Some(CurrencyCode::Iso(f))) = (&unit_currency, &field_currency) {
        if u != f && config.strict {
            return Err(NormalizeError::AmbiguousSignal(format!(
                "unit declares currency {u} but currency_code field declares {f}"
            )));
        }
        if u != f {
            notes.push(format!("currency_conflict: unit={u} field={f}, unit wins"));
        }
    }

    let (currency, currency_source) = match (&unit_currency, &field_currency) {
        (Some(c), _) => (Some(c.clone()), SignalSource::Unit),
        (None, Some(c)) => (Some(c.clone()), SignalSource::Structured),
        (None, None) => (None, SignalSource::Default),
    };

    // --- Scale ---
    let explicit_unit_scale = scale_is_explicit_in_unit(parsed);
    let (scale, scale_source) = match (explicit_unit_scale, record.scale) {
        (true, Some(field_scale)) => {
            if field_scale != parsed.scale_token {
                notes.push(format!(
                    "scale_conflict: unit={:?} field={:?}, unit wins",
                    parsed.scale_token, field_scale
                ));
            }
            (parsed.scale_token, SignalSource::Unit)
        }
        (true, None) => (parsed.scale_token, SignalSource::Unit),
        (false, Some(field_scale)) => (field_scale, SignalSource::Structured),
        (false, None) => (Scale::Ones, SignalSource::Default),
    };

    // --- Time basis ---
    let (time, time_source) = if parsed.time_token != TimeBasis::None {
        (parsed.time_token, SignalSource::Unit)
    } else if let Some(periodicity) = record.periodicity {
        (periodicity_to_time_basis(periodicity), SignalSource::Structured)
    } else if looks_like_monetary_flow(record, parsed) {
        (TimeBasis::Month, SignalSource::Default)
    } else {
        (TimeBasis::None, SignalSource::Default)
    };

    // --- Cumulative ---
    let is_cumulative =
        is_cumulative_by_name(record, &record.unit) || is_cumulative_by_samples(record);

    Ok(ResolvedSignals {
        currency,
        currency_source,
        scale,
        scale_source,
        time,
        time_source,
        is_cumulative,
        notes,
    })
}
