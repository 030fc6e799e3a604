//! Component G: the batch normalizer. Orchestrates A (unit-parser), B
//! (signal-resolver), C (domain-router), E (auto-target-selector) and F
//! (conversion-engine) across a batch, per the map-reduce-map pipeline
//! in spec §5: parallel classify, single target reduction, parallel
//! convert. Component H (quality-detectors) is re-exported unchanged —
//! it runs over per-indicator time series independently of this batch
//! pipeline.

use std::collections::HashMap;

use econ_core::{
    BatchReport, Domain, FxTable, InputRecord, NormalizeConfig, NormalizeError, NormalizedRecord,
    ParsedUnit, RecordFailure, ResolvedSignals,
};
use rayon::prelude::*;

pub use quality_detectors::run_quality_checks;

/// Output of `classify_record`: everything components A–C produce for
/// one record, ahead of target selection and conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub domain: Domain,
    pub signals: ResolvedSignals,
    pub parsed_unit: ParsedUnit,
}

/// Run the unit parser, signal resolver and domain router on one record.
pub fn classify_record(
    record: &InputRecord,
    config: &NormalizeConfig,
) -> Result<Classification, NormalizeError> {
    let parsed_unit = unit_parser::parse_unit(&record.unit)?;
    tracing::debug!(id = %record.id, ?parsed_unit, "parsed unit");
    let signals = signal_resolver::resolve_signals(record, &parsed_unit, config)?;
    tracing::debug!(id = %record.id, ?signals, "resolved signals");
    let domain = domain_router::route(record, &parsed_unit, &signals);
    tracing::debug!(id = %record.id, ?domain, "routed domain");
    Ok(Classification { domain, signals, parsed_unit })
}

/// Normalize a batch of records against a shared FX table, producing
/// normalized records (input order preserved) and a summary report.
/// `quality_scores`, when supplied, attaches a precomputed per-indicator
/// score (from [`run_quality_checks`]) to the matching output records.
pub fn normalize_batch(
    records: &[InputRecord],
    config: &NormalizeConfig,
    fx_table: &FxTable,
    quality_scores: Option<&HashMap<String, f64>>,
) -> Result<(Vec<NormalizedRecord>, BatchReport), NormalizeError> {
    let classified: Vec<Result<Classification, NormalizeError>> =
        records.par_iter().map(|r| classify_record(r, config)).collect();

    let domains: Vec<Domain> = classified.iter().filter_map(|r| r.as_ref().ok().map(|c| c.domain)).collect();
    let signals: Vec<ResolvedSignals> = classified
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|c| c.signals.clone()))
        .collect();
    let targets = auto_target_selector::select_targets(&domains, &signals, config)?;

    // Index-aligned with `records`/`classified`: `None` where classification
    // failed (nothing to convert), `Some(result)` otherwise.
    let converted: Vec<Option<Result<NormalizedRecord, NormalizeError>>> = records
        .par_iter()
        .zip(classified.par_iter())
        .map(|(record, result)| {
            result.as_ref().ok().map(|c| {
                conversion_engine::convert(record, &c.parsed_unit, &c.signals, c.domain, &targets, fx_table, config)
            })
        })
        .collect();

    // `fail_fast` escalates the first error in *input order*, regardless of
    // which phase produced it — a classify failure on record 5 must not hide
    // a conversion failure on record 2.
    if config.fail_fast {
        for (record, (classify_result, convert_result)) in
            records.iter().zip(classified.iter().zip(converted.iter()))
        {
            if let Err(e) = classify_result {
                tracing::warn!(id = %record.id, error = %e, "record failed classification");
                return Err(e.clone());
            }
            if let Some(Err(e)) = convert_result {
                tracing::warn!(id = %record.id, error = %e, "record failed conversion");
                return Err(e.clone());
            }
        }
    }

    let mut failures = Vec::new();
    let mut normalized = Vec::new();
    for (record, (classify_result, convert_result)) in
        records.iter().zip(classified.into_iter().zip(converted.into_iter()))
    {
        match (classify_result, convert_result) {
            (Err(e), _) => {
                tracing::warn!(id = %record.id, error = %e, "record failed classification");
                failures.push(failure_of(&record.id, &e));
            }
            (Ok(_), Some(Err(e))) => {
                tracing::warn!(id = %record.id, error = %e, "record failed conversion");
                failures.push(failure_of(&record.id, &e));
            }
            (Ok(_), Some(Ok(mut normalized_record))) => {
                if let Some(scores) = quality_scores {
                    if let Some(&score) = scores.get(&record.id) {
                        normalized_record.quality_score = Some(score);
                        if let Some(explain) = normalized_record.explain.as_mut() {
                            explain.quality_score = Some(score);
                        }
                    }
                }
                normalized.push(normalized_record);
            }
            (Ok(_), None) => unreachable!("a successful classification always has a conversion outcome"),
        }
    }

    let report = BatchReport {
        records_processed: normalized.len(),
        records_failed: failures.len(),
        failures,
        targets,
    };

    tracing::info!(
        records_processed = report.records_processed,
        records_failed = report.records_failed,
        target_currency = %report.targets.currency.value,
        target_magnitude = ?report.targets.magnitude.value,
        target_time = ?report.targets.time.value,
        "batch normalization complete"
    );

    Ok((normalized, report))
}

fn failure_of(id: &str, error: &NormalizeError) -> RecordFailure {
    RecordFailure {
        id: id.to_string(),
        error_kind: error_kind_name(error),
        detail: error.to_string(),
    }
}

fn error_kind_name(error: &NormalizeError) -> String {
    match error {
        NormalizeError::MalformedUnit(_) => "MalformedUnit",
        NormalizeError::AmbiguousSignal(_) => "AmbiguousSignal",
        NormalizeError::UnknownCurrency(_) => "UnknownCurrency",
        NormalizeError::InfiniteResult(_) => "InfiniteResult",
        NormalizeError::InsufficientData(_) => "InsufficientData",
        NormalizeError::InvalidConfiguration(_) => "InvalidConfiguration",
    }
    .to_string()
}
