use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

/// A currency code, or one of the two non-convertible sentinels this
/// domain treats as facts rather than errors (see `FxTable`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code")]
pub enum CurrencyCode {
    Iso(String),
    /// Local-currency-unit sentinel ("LCU" in the source metadata).
    Lcu,
    /// Current-international-dollar / purchasing-power-parity sentinel.
    PppIntl,
}

impl CurrencyCode {
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "LCU" => CurrencyCode::Lcu,
            "PPP_INTL" => CurrencyCode::PppIntl,
            other => CurrencyCode::Iso(other.to_string()),
        }
    }

    pub fn as_iso(&self) -> Option<&str> {
        match self {
            CurrencyCode::Iso(code) => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, CurrencyCode::Lcu | CurrencyCode::PppIntl)
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurrencyCode::Iso(code) => write!(f, "{code}"),
            CurrencyCode::Lcu => write!(f, "LCU"),
            CurrencyCode::PppIntl => write!(f, "PPP_INTL"),
        }
    }
}

/// Reporting periodicity carried on an input record's structured hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// Magnitude scale applied to a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Ones,
    Thousands,
    Millions,
    Billions,
    Trillions,
    HundredMillions,
    Crores,
}

impl Scale {
    /// Base-10 exponent for this scale, per spec §4.F.
    pub fn exponent(&self) -> i32 {
        match self {
            Scale::Ones => 0,
            Scale::Thousands => 3,
            Scale::Millions => 6,
            Scale::Billions => 9,
            Scale::Trillions => 12,
            Scale::HundredMillions => 8,
            Scale::Crores => 7,
        }
    }

    /// Lowercase canonical word used in normalized unit strings.
    pub fn word(&self) -> &'static str {
        match self {
            Scale::Ones => "ones",
            Scale::Thousands => "thousands",
            Scale::Millions => "millions",
            Scale::Billions => "billions",
            Scale::Trillions => "trillions",
            Scale::HundredMillions => "hundred millions",
            Scale::Crores => "crores",
        }
    }
}

/// Per-unit time denominator for a flow, or `None` for a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    None,
}

impl TimeBasis {
    /// Canonical hour-count constants from spec §4.F.
    pub fn hours(&self) -> f64 {
        match self {
            TimeBasis::Hour => 1.0,
            TimeBasis::Day => 24.0,
            TimeBasis::Week => 168.0,
            TimeBasis::Month => 730.44,
            TimeBasis::Quarter => 2191.32,
            TimeBasis::Year => 8766.0,
            TimeBasis::None => 0.0,
        }
    }

    pub fn word(&self) -> &'static str {
        match self {
            TimeBasis::Hour => "hour",
            TimeBasis::Day => "day",
            TimeBasis::Week => "week",
            TimeBasis::Month => "month",
            TimeBasis::Quarter => "quarter",
            TimeBasis::Year => "year",
            TimeBasis::None => "none",
        }
    }
}

/// Coarse classification hint produced by the unit parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitTypeHint {
    Currency,
    Percentage,
    Index,
    Ratio,
    Count,
    Rate,
    Duration,
    Physical,
    Unknown,
}

/// One of the eleven domain tags a record can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    MonetaryStock,
    MonetaryFlow,
    Counts,
    Percentages,
    Indices,
    Ratios,
    Energy,
    Commodities,
    Agriculture,
    Metals,
    Crypto,
}

impl Domain {
    pub fn is_monetary(&self) -> bool {
        matches!(self, Domain::MonetaryStock | Domain::MonetaryFlow)
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, Domain::MonetaryFlow)
    }
}

/// Output of the Unit Parser (component A).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedUnit {
    pub currency_token: Option<CurrencyCode>,
    pub scale_token: Scale,
    pub time_token: TimeBasis,
    pub unit_type_hint: UnitTypeHint,
    pub matched_pattern: String,
    pub parsing_confidence: f64,
}

impl ParsedUnit {
    /// The all-null parse returned for an empty unit string (spec §4.A).
    pub fn empty() -> Self {
        ParsedUnit {
            currency_token: None,
            scale_token: Scale::Ones,
            time_token: TimeBasis::None,
            unit_type_hint: UnitTypeHint::Unknown,
            matched_pattern: "empty".to_string(),
            parsing_confidence: 0.3,
        }
    }
}

/// One input indicator observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub id: String,
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub periodicity: Option<Periodicity>,
    #[serde(default)]
    pub scale: Option<Scale>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub category_group: Option<String>,
    #[serde(default)]
    pub sample_values: Vec<(NaiveDate, f64)>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Records which of `unit`, `structured` hint, or `default` won for a
/// resolved-signal field, per spec §4.B's conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Unit,
    Structured,
    Default,
}

/// Output of the Signal Resolver (component B).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSignals {
    pub currency: Option<CurrencyCode>,
    pub currency_source: SignalSource,
    pub scale: Scale,
    pub scale_source: SignalSource,
    pub time: TimeBasis,
    pub time_source: SignalSource,
    pub is_cumulative: bool,
    /// Structured notes such as `scale_conflict`, appended to `explain`.
    pub notes: Vec<String>,
}

/// Which source won a batch-level target selection (spec §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    Auto,
    Fallback,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetValue<T> {
    pub value: T,
    pub source: TargetSource,
}

/// Batch-level frozen targets selected once by the Auto-Target Selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub currency: TargetValue<String>,
    pub magnitude: TargetValue<Scale>,
    pub time: TargetValue<TimeBasis>,
}

/// In-memory, read-only FX rate table (component D).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxTable {
    pub base: String,
    pub rates: HashMap<String, f64>,
    pub dates: HashMap<String, NaiveDate>,
}

impl FxTable {
    /// Validate the invariant `rates[base] == 1` and construct the table.
    pub fn new(
        base: impl Into<String>,
        rates: HashMap<String, f64>,
        dates: HashMap<String, NaiveDate>,
    ) -> Result<Self, NormalizeError> {
        let base = base.into();
        match rates.get(&base) {
            Some(r) if (*r - 1.0).abs() < 1e-12 => {}
            Some(r) => {
                return Err(NormalizeError::InvalidConfiguration(format!(
                    "fx base {base} must have rate 1, got {r}"
                )))
            }
            None => {
                return Err(NormalizeError::InvalidConfiguration(format!(
                    "fx base {base} missing from rates"
                )))
            }
        }
        Ok(FxTable { base, rates, dates })
    }

    pub fn rate(&self, code: &str) -> Result<f64, NormalizeError> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| NormalizeError::UnknownCurrency(code.to_string()))
    }

    pub fn as_of(&self, code: &str) -> Option<NaiveDate> {
        self.dates.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FxRateSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeStep {
    pub source: Scale,
    pub target: Scale,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxStep {
    pub source_currency: String,
    pub target_currency: String,
    pub rate: f64,
    pub source: FxRateSource,
    pub as_of: Option<NaiveDate>,
    pub skipped_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    pub source: TimeBasis,
    pub target: TimeBasis,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalExplain {
    pub currency: TargetValue<String>,
    pub scale: TargetValue<String>,
    pub time: TargetValue<String>,
}

/// Machine-readable provenance for one record's transformation (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explain {
    pub original_unit: String,
    pub normalized_unit: String,
    pub domain: Domain,
    pub conversion_applied: bool,
    pub conversion_summary: String,
    pub signals: SignalExplain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<MagnitudeStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<FxStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeStep>,
    pub targets: Targets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

/// Output record after routing + conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub normalized_value: f64,
    pub normalized_unit: String,
    pub domain: Domain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<Explain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

/// A record that failed during batch normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub id: String,
    pub error_kind: String,
    pub detail: String,
}

/// Summary report emitted by the Batch Normalizer (component G).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub records_processed: usize,
    pub records_failed: usize,
    pub failures: Vec<RecordFailure>,
    pub targets: Targets,
}

/// A single `(date, value)` observation in an indicator's time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Expected reporting cadence, used by the staleness detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
    PointInTime,
}

impl ExpectedFrequency {
    pub fn expected_gap_days(&self) -> f64 {
        match self {
            ExpectedFrequency::Daily => 1.0,
            ExpectedFrequency::Weekly => 7.0,
            ExpectedFrequency::Monthly => 30.0,
            ExpectedFrequency::Quarterly => 90.0,
            ExpectedFrequency::Annual => 365.0,
            ExpectedFrequency::PointInTime => 30.0,
        }
    }
}

/// Nature of the underlying indicator, used by the false-reading detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    Stock,
    Capacity,
    Price,
    Flow,
    Other(String),
}

/// How a series value aggregates over its reporting period, used by the
/// consistency detector's interval check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalAggregation {
    PeriodTotal,
    PeriodAverage,
    PointInTime,
}

/// Classification hints passed alongside a time series to the quality
/// detector suite (spec §4.H).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorHints {
    pub expected_frequency: ExpectedFrequency,
    pub indicator_type: IndicatorType,
    pub is_cumulative: bool,
    #[serde(default)]
    pub expected_scale: Option<Scale>,
    #[serde(default)]
    pub temporal_aggregation: Option<TemporalAggregation>,
}

/// Verdict bucket for a single quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Passed,
    Flagged,
    Critical,
}

/// One finding from a single detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFlag {
    pub check_type: String,
    pub status: QualityStatus,
    pub severity: u8,
    pub message: String,
    pub details: String,
    pub affected_dates: Vec<NaiveDate>,
}

/// Overall verdict across all five detectors (spec §4.H consolidator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Clean,
    MinorIssues,
    MajorIssues,
    Unusable,
}

/// Output of `run_quality_checks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedQualityReport {
    pub indicator_id: String,
    pub total_checks: u8,
    pub passed: u8,
    pub flagged: u8,
    pub critical: u8,
    pub all_flags: Vec<QualityFlag>,
    pub overall_score: f64,
    pub status: OverallStatus,
}
