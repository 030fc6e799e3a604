//! Component F: the per-record (magnitude, fx, time) conversion chain.
//! Every step is a pure multiplication; order matters only for the
//! explain trail, never for the arithmetic (spec §4.F).

use econ_core::{
    CurrencyCode, Domain, Explain, FxRateSource, FxStep, FxTable, InputRecord, MagnitudeStep,
    NormalizeConfig, NormalizeError, NormalizedRecord, ParsedUnit, ResolvedSignals, Scale,
    SignalExplain, TargetValue, Targets, TimeBasis, TimeStep,
};

/// Convert one record's value into the batch's frozen targets, producing
/// the normalized value/unit and (optionally) its explain trail.
pub fn convert(
    record: &InputRecord,
    parsed: &ParsedUnit,
    resolved: &ResolvedSignals,
    domain: Domain,
    targets: &Targets,
    fx_table: &FxTable,
    config: &NormalizeConfig,
) -> Result<NormalizedRecord, NormalizeError> {
    let mut value = record.value;
    let mut magnitude_step = None;
    let mut fx_step = None;
    let mut time_step = None;
    let mut conversion_applied = false;
    let mut summary_parts: Vec<String> = Vec::new();

    let normalized_unit = match domain {
        Domain::MonetaryStock | Domain::MonetaryFlow => {
            let target_currency = CurrencyCode::parse(&targets.currency.value);

            let mstep = magnitude_step_for(resolved.scale, targets.magnitude.value)?;
            value *= mstep.factor;
            summary_parts.push(format!("scaled x{:.6}", mstep.factor));
            magnitude_step = Some(mstep);
            conversion_applied = true;

            if let Some(source_currency) = &resolved.currency {
                let fstep = fx_step_for(source_currency, &target_currency, fx_table, config)?;
                if let Some(fstep) = fstep {
                    if fstep.skipped_reason.is_none() {
                        value *= fstep.rate;
                        summary_parts.push(format!(
                            "converted {}->{} at {:.6}",
                            fstep.source_currency, fstep.target_currency, fstep.rate
                        ));
                    } else {
                        summary_parts.push(format!(
                            "fx skipped: {}",
                            fstep.skipped_reason.as_deref().unwrap_or("")
                        ));
                    }
                    fx_step = Some(fstep);
                }
            }

            if domain == Domain::MonetaryFlow {
                let tstep = time_step_for(resolved.time, targets.time.value)?;
                value *= tstep.factor;
                summary_parts.push(format!(
                    "rescaled {}->{} x{:.6}",
                    tstep.source.word(),
                    tstep.target.word(),
                    tstep.factor
                ));
                time_step = Some(tstep);
                format!("{} {} per {}", target_currency, targets.magnitude.value.word(), targets.time.value.word())
            } else {
                format!("{} {}", target_currency, targets.magnitude.value.word())
            }
        }
        Domain::Counts => {
            let mstep = magnitude_step_for(resolved.scale, Scale::Ones)?;
            value *= mstep.factor;
            summary_parts.push(format!("scaled x{:.6}", mstep.factor));
            magnitude_step = Some(mstep);
            conversion_applied = true;
            "ones".to_string()
        }
        Domain::Percentages => {
            summary_parts.push("no numeric change".to_string());
            percentage_unit(&record.unit)
        }
        Domain::Crypto => {
            if let Some(source_currency) = &resolved.currency {
                if source_currency.as_iso() == Some("USD") {
                    let mstep = magnitude_step_for(resolved.scale, targets.magnitude.value)?;
                    value *= mstep.factor;
                    summary_parts.push(format!("scaled x{:.6}", mstep.factor));
                    magnitude_step = Some(mstep);
                    conversion_applied = true;
                } else {
                    summary_parts.push("no numeric change".to_string());
                }
            } else {
                summary_parts.push("no numeric change".to_string());
            }
            original_unit_trimmed(&record.unit)
        }
        Domain::Indices | Domain::Ratios | Domain::Energy | Domain::Commodities | Domain::Agriculture
        | Domain::Metals => {
            summary_parts.push("no numeric change".to_string());
            original_unit_trimmed(&record.unit)
        }
    };

    if !value.is_finite() {
        return Err(NormalizeError::InfiniteResult(format!(
            "record {} produced a non-finite normalized value",
            record.id
        )));
    }

    let explain = if config.explain {
        Some(Explain {
            original_unit: record.unit.clone(),
            normalized_unit: normalized_unit.clone(),
            domain,
            conversion_applied,
            conversion_summary: summary_parts.join("; "),
            signals: SignalExplain {
                currency: TargetValue {
                    value: resolved
                        .currency
                        .as_ref()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                    source: resolved.currency_source,
                },
                scale: TargetValue {
                    value: resolved.scale.word().to_string(),
                    source: resolved.scale_source,
                },
                time: TargetValue {
                    value: resolved.time.word().to_string(),
                    source: resolved.time_source,
                },
            },
            magnitude: magnitude_step,
            fx: fx_step,
            time: time_step,
            targets: targets.clone(),
            quality_score: None,
        })
    } else {
        None
    };

    Ok(NormalizedRecord {
        id: record.id.clone(),
        normalized_value: value,
        normalized_unit,
        domain,
        explain,
        quality_score: None,
    })
}

fn magnitude_step_for(source: Scale, target: Scale) -> Result<MagnitudeStep, NormalizeError> {
    let factor = 10f64.powi(source.exponent() - target.exponent());
    if !factor.is_finite() {
        return Err(NormalizeError::InfiniteResult(
            "magnitude factor overflowed".to_string(),
        ));
    }
    Ok(MagnitudeStep { source, target, factor })
}

fn time_step_for(source: TimeBasis, target: TimeBasis) -> Result<TimeStep, NormalizeError> {
    let factor = target.hours() / source.hours();
    if !factor.is_finite() {
        return Err(NormalizeError::InfiniteResult(format!(
            "time factor {}/{} is non-finite (source time basis is likely none)",
            target.hours(),
            source.hours()
        )));
    }
    Ok(TimeStep { source, target, factor })
}

/// Resolve the FX step for a monetary record, honoring sentinel skip
/// rules and the identity-currency omission invariant (spec §8 #2).
/// Returns `Ok(None)` only when no step applies at all (identity case).
fn fx_step_for(
    source: &CurrencyCode,
    target: &CurrencyCode,
    fx_table: &FxTable,
    config: &NormalizeConfig,
) -> Result<Option<FxStep>, NormalizeError> {
    if source == target {
        return Ok(None);
    }

    if source.is_sentinel() {
        let reason = match source {
            CurrencyCode::Lcu => "local-currency-unit",
            CurrencyCode::PppIntl => "ppp-international-dollar",
            CurrencyCode::Iso(_) => unreachable!(),
        };
        return Ok(Some(FxStep {
            source_currency: source.to_string(),
            target_currency: target.to_string(),
            rate: 1.0,
            source: FxRateSource::Live,
            as_of: None,
            skipped_reason: Some(reason.to_string()),
        }));
    }

    let source_iso = source.as_iso().expect("non-sentinel currency is always ISO");
    let target_iso = target.as_iso().ok_or_else(|| {
        NormalizeError::InvalidConfiguration(format!(
            "target currency {target} must be an ISO code"
        ))
    })?;

    let (source_rate, target_rate, rate_source, as_of) =
        if fx_table.contains(source_iso) && fx_table.contains(target_iso) {
            (
                fx_table.rate(source_iso)?,
                fx_table.rate(target_iso)?,
                FxRateSource::Live,
                fx_table.as_of(source_iso),
            )
        } else if let Some(fallback) = &config.fx_fallback {
            if fallback.contains(source_iso) && fallback.contains(target_iso) {
                (
                    fallback.rate(source_iso)?,
                    fallback.rate(target_iso)?,
                    FxRateSource::Fallback,
                    fallback.as_of(source_iso),
                )
            } else {
                return Err(NormalizeError::UnknownCurrency(source_iso.to_string()));
            }
        } else {
            return Err(NormalizeError::UnknownCurrency(source_iso.to_string()));
        };

    let rate = source_rate / target_rate;
    if !rate.is_finite() {
        return Err(NormalizeError::InfiniteResult(format!(
            "fx rate {source_iso}/{target_iso} is non-finite"
        )));
    }

    Ok(Some(FxStep {
        source_currency: source_iso.to_string(),
        target_currency: target_iso.to_string(),
        rate,
        source: rate_source,
        as_of,
        skipped_reason: None,
    }))
}

fn percentage_unit(unit: &str) -> String {
    let lower = unit.to_ascii_lowercase();
    if lower.contains("bps") || lower.contains("basis point") {
        "bps".to_string()
    } else if lower.contains("gdp") {
        "% of GDP".to_string()
    } else if lower.contains("pp") || lower.contains("percentage point") {
        "pp".to_string()
    } else {
        "%".to_string()
    }
}

fn original_unit_trimmed(unit: &str) -> String {
    unit.trim().to_string()
}
