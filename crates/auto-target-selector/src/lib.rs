//! Component E: the batch's one cross-record reduction. Computes a
//! majority-vote target currency and magnitude over monetary records,
//! falling back to the caller-configured default when no value clears
//! `dominance_threshold`. Time basis is never auto-selected (spec §4.E).

use std::collections::HashMap;
use std::hash::Hash;

use econ_core::{
    CurrencyCode, Domain, NormalizeConfig, NormalizeError, ResolvedSignals, Scale, TargetSource,
    TargetValue, Targets,
};

fn mode_with_dominance<T: Eq + Hash + Clone>(
    values: impl Iterator<Item = T>,
    total: usize,
    threshold: f64,
) -> Option<T> {
    if total == 0 {
        return None;
    }
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let (mode, count) = counts.into_iter().max_by_key(|(_, c)| *c)?;
    if count as f64 / total as f64 >= threshold {
        Some(mode)
    } else {
        None
    }
}

/// Select and freeze per-batch targets from every record's routed domain
/// and resolved signals. Must run after components A–C have produced
/// `domains`/`resolved` for the whole batch (spec §5's reduction phase).
pub fn select_targets(
    domains: &[Domain],
    resolved: &[ResolvedSignals],
    config: &NormalizeConfig,
) -> Result<Targets, NormalizeError> {
    let monetary: Vec<&ResolvedSignals> = domains
        .iter()
        .zip(resolved.iter())
        .filter(|(d, _)| d.is_monetary())
        .map(|(_, r)| r)
        .collect();
    let total = monetary.len();

    let currency = select_currency(&monetary, total, config)?;
    let magnitude = select_magnitude(&monetary, total, config)?;
    let time = TargetValue {
        value: config.target_time_scale,
        source: TargetSource::Explicit,
    };

    Ok(Targets { currency, magnitude, time })
}

fn select_currency(
    monetary: &[&ResolvedSignals],
    total: usize,
    config: &NormalizeConfig,
) -> Result<TargetValue<String>, NormalizeError> {
    if config.auto_target_currency {
        let mode = mode_with_dominance(
            monetary.iter().filter_map(|r| r.currency.clone()),
            total,
            config.dominance_threshold,
        );
        if let Some(winner) = mode {
            return Ok(TargetValue {
                value: currency_label(&winner),
                source: TargetSource::Auto,
            });
        }
    }
    match &config.target_currency {
        Some(code) => Ok(TargetValue {
            value: code.clone(),
            source: TargetSource::Fallback,
        }),
        None => Err(NormalizeError::InsufficientData(
            "no currency cleared the dominance threshold and no fallback target_currency was configured".to_string(),
        )),
    }
}

fn select_magnitude(
    monetary: &[&ResolvedSignals],
    total: usize,
    config: &NormalizeConfig,
) -> Result<TargetValue<Scale>, NormalizeError> {
    if config.auto_target_magnitude {
        let mode = mode_with_dominance(
            monetary.iter().map(|r| r.scale),
            total,
            config.dominance_threshold,
        );
        if let Some(winner) = mode {
            return Ok(TargetValue {
                value: winner,
                source: TargetSource::Auto,
            });
        }
    }
    Ok(TargetValue {
        value: config.target_magnitude,
        source: TargetSource::Fallback,
    })
}

fn currency_label(code: &CurrencyCode) -> String {
    match code {
        CurrencyCode::Iso(iso) => iso.clone(),
        CurrencyCode::Lcu => "LCU".to_string(),
        CurrencyCode::PppIntl => "PPP_INTL".to_string(),
    }
}
