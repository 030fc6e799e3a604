//! Component D: loading and lookup helpers for the read-only FX rate
//! table. The table type itself (`FxTable`) lives in `econ-core` as part
//! of the shared data model; this crate owns the narrow concern of
//! getting one from wire formats into memory and answering the two
//! questions the Conversion Engine asks of it.

use std::collections::HashMap;

use chrono::NaiveDate;
use econ_core::{CurrencyCode, FxTable, NormalizeError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FxTableWire {
    base: String,
    rates: HashMap<String, f64>,
    #[serde(default)]
    dates: HashMap<String, NaiveDate>,
}

/// Parse an FX table from the spec §3 JSON shape: `{base, rates, dates}`.
pub fn from_json(json: &str) -> Result<FxTable, NormalizeError> {
    let wire: FxTableWire = serde_json::from_str(json)
        .map_err(|e| NormalizeError::InvalidConfiguration(format!("malformed fx table json: {e}")))?;
    FxTable::new(wire.base, wire.rates, wire.dates)
}

/// Whether a currency can ever appear in an FX table. The two sentinels
/// (local-currency-unit, PPP-international-dollar) are facts about the
/// source series, not tradeable currencies, and never get a rate.
pub fn is_convertible(currency: &CurrencyCode) -> bool {
    !currency.is_sentinel()
}

/// Look up a rate for an ISO currency, distinguishing "sentinel, don't
/// even ask" from "ISO code the table doesn't carry".
pub fn rate_for(table: &FxTable, currency: &CurrencyCode) -> Result<f64, NormalizeError> {
    match currency {
        CurrencyCode::Iso(code) => table.rate(code),
        CurrencyCode::Lcu | CurrencyCode::PppIntl => Err(NormalizeError::UnknownCurrency(
            currency.to_string(),
        )),
    }
}

/// Build a table from a fixed set of rates as-of a single date, useful
/// for the static `fx_fallback` table a `NormalizeConfig` can carry.
pub fn from_fixed_rates(
    base: impl Into<String>,
    rates: HashMap<String, f64>,
    as_of: NaiveDate,
) -> Result<FxTable, NormalizeError> {
    let dates = rates.keys().map(|k| (k.clone(), as_of)).collect();
    FxTable::new(base, rates, dates)
}
