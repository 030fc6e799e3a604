use crate::error::NormalizeError;
use crate::types::{FxTable, Scale, TimeBasis};

/// Recognized batch-normalization options (spec §6).
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub target_currency: Option<String>,
    pub target_magnitude: Scale,
    pub target_time_scale: TimeBasis,
    pub auto_target_currency: bool,
    pub auto_target_magnitude: bool,
    pub dominance_threshold: f64,
    /// Informational only: the core only ever consumes the FX table it is
    /// handed, live or not (spec §6 `use_live_fx`).
    pub use_live_fx: bool,
    /// Secondary FX table consulted when the primary table lacks a rate.
    pub fx_fallback: Option<FxTable>,
    pub explain: bool,
    pub fail_fast: bool,
    /// When true, a currency contradiction between the unit and
    /// `currency_code` raises `AmbiguousSignal` instead of picking a
    /// precedence (spec §4.B).
    pub strict: bool,
}

impl NormalizeConfig {
    pub fn builder() -> NormalizeConfigBuilder {
        NormalizeConfigBuilder::default()
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeConfigBuilder {
    target_currency: Option<String>,
    target_magnitude: Scale,
    target_time_scale: TimeBasis,
    auto_target_currency: bool,
    auto_target_magnitude: bool,
    dominance_threshold: f64,
    use_live_fx: bool,
    fx_fallback: Option<FxTable>,
    explain: bool,
    fail_fast: bool,
    strict: bool,
}

impl Default for NormalizeConfigBuilder {
    fn default() -> Self {
        Self {
            target_currency: None,
            target_magnitude: Scale::Millions,
            target_time_scale: TimeBasis::Month,
            auto_target_currency: false,
            auto_target_magnitude: false,
            dominance_threshold: 0.6,
            use_live_fx: false,
            fx_fallback: None,
            explain: true,
            fail_fast: false,
            strict: false,
        }
    }
}

impl NormalizeConfigBuilder {
    pub fn target_currency(mut self, code: impl Into<String>) -> Self {
        self.target_currency = Some(code.into());
        self
    }

    pub fn target_magnitude(mut self, scale: Scale) -> Self {
        self.target_magnitude = scale;
        self
    }

    pub fn target_time_scale(mut self, time: TimeBasis) -> Self {
        self.target_time_scale = time;
        self
    }

    pub fn auto_target_currency(mut self, enabled: bool) -> Self {
        self.auto_target_currency = enabled;
        self
    }

    pub fn auto_target_magnitude(mut self, enabled: bool) -> Self {
        self.auto_target_magnitude = enabled;
        self
    }

    pub fn dominance_threshold(mut self, threshold: f64) -> Self {
        self.dominance_threshold = threshold;
        self
    }

    pub fn use_live_fx(mut self, enabled: bool) -> Self {
        self.use_live_fx = enabled;
        self
    }

    pub fn fx_fallback(mut self, table: FxTable) -> Self {
        self.fx_fallback = Some(table);
        self
    }

    pub fn explain(mut self, enabled: bool) -> Self {
        self.explain = enabled;
        self
    }

    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Validate and freeze the configuration. `InvalidConfiguration` is
    /// raised here, before any record is processed, per spec §7.
    pub fn build(self) -> Result<NormalizeConfig, NormalizeError> {
        if !(0.5..=1.0).contains(&self.dominance_threshold) {
            return Err(NormalizeError::InvalidConfiguration(format!(
                "dominance_threshold {} out of range [0.5, 1.0]",
                self.dominance_threshold
            )));
        }
        if !self.auto_target_currency && self.target_currency.is_none() {
            return Err(NormalizeError::InvalidConfiguration(
                "target_currency must be set unless auto_target_currency is enabled".to_string(),
            ));
        }

        Ok(NormalizeConfig {
            target_currency: self.target_currency,
            target_magnitude: self.target_magnitude,
            target_time_scale: self.target_time_scale,
            auto_target_currency: self.auto_target_currency,
            auto_target_magnitude: self.auto_target_magnitude,
            dominance_threshold: self.dominance_threshold,
            use_live_fx: self.use_live_fx,
            fx_fallback: self.fx_fallback,
            explain: self.explain,
            fail_fast: self.fail_fast,
            strict: self.strict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dominance_threshold_out_of_range() {
        let err = NormalizeConfig::builder()
            .target_currency("USD")
            .dominance_threshold(0.2)
            .build()
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidConfiguration(_)));
    }

    #[test]
    fn requires_a_currency_target_or_auto_target() {
        let err = NormalizeConfig::builder().build().unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidConfiguration(_)));
    }

    #[test]
    fn builds_with_explicit_target() {
        let config = NormalizeConfig::builder()
            .target_currency("USD")
            .target_magnitude(Scale::Millions)
            .build()
            .unwrap();
        assert_eq!(config.target_currency.as_deref(), Some("USD"));
    }
}
