//! 4.H.5 — monotonicity for cumulative series, duplicate-date detection,
//! and reporting-interval regularity.

use std::collections::HashMap;

use econ_core::{DetectorHints, QualityFlag, QualityStatus, TemporalAggregation, TimeSeriesPoint};

use crate::stats::{mean, population_stdev};

pub fn detect(points: &[TimeSeriesPoint], hints: &DetectorHints) -> Vec<QualityFlag> {
    if points.is_empty() {
        return vec![insufficient("no points provided")];
    }

    let mut flags = Vec::new();
    if hints.is_cumulative {
        flags.extend(monotonicity(points));
    }
    flags.extend(duplicate_dates(points));
    flags.extend(interval_consistency(points, hints.temporal_aggregation));

    if flags.is_empty() {
        flags.push(passed("consistent"));
    }
    flags
}

fn monotonicity(points: &[TimeSeriesPoint]) -> Vec<QualityFlag> {
    let violations: Vec<_> = points
        .windows(2)
        .filter(|w| w[1].value < w[0].value - w[0].value.abs() * 1e-4)
        .map(|w| w[1].date)
        .collect();

    if violations.is_empty() {
        return Vec::new();
    }
    let ratio = violations.len() as f64 / points.len() as f64;
    let (severity, status) = if ratio > 0.1 {
        (5, QualityStatus::Critical)
    } else {
        (3, QualityStatus::Flagged)
    };
    vec![QualityFlag {
        check_type: "consistency:monotonicity".to_string(),
        status,
        severity,
        message: format!("{} monotonicity violation(s) in a cumulative series", violations.len()),
        details: format!("{:.1}% of points affected", ratio * 100.0),
        affected_dates: violations,
    }]
}

fn duplicate_dates(points: &[TimeSeriesPoint]) -> Vec<QualityFlag> {
    let mut by_date: HashMap<chrono::NaiveDate, Vec<f64>> = HashMap::new();
    for p in points {
        by_date.entry(p.date).or_default().push(p.value);
    }

    let mut offenders: Vec<_> = by_date
        .into_iter()
        .filter(|(_, values)| values.iter().any(|v| (v - values[0]).abs() > 1e-9))
        .collect();
    offenders.sort_by_key(|(date, _)| *date);

    offenders
        .into_iter()
        .map(|(date, values)| QualityFlag {
            check_type: "consistency:temporal".to_string(),
            status: QualityStatus::Critical,
            severity: 5,
            message: format!("date {date} carries {} distinct values", values.len()),
            details: format!("{values:?}"),
            affected_dates: vec![date],
        })
        .collect()
}

fn interval_consistency(points: &[TimeSeriesPoint], aggregation: Option<TemporalAggregation>) -> Vec<QualityFlag> {
    let applies = matches!(
        aggregation,
        Some(TemporalAggregation::PeriodTotal) | Some(TemporalAggregation::PeriodAverage)
    );
    if !applies || points.len() <= 5 {
        return Vec::new();
    }

    let gaps: Vec<f64> = points.windows(2).map(|w| (w[1].date - w[0].date).num_days() as f64).collect();
    let mu = mean(&gaps);
    if mu == 0.0 {
        return Vec::new();
    }
    let sigma = population_stdev(&gaps);
    let cv = sigma / mu * 100.0;

    if cv > 30.0 {
        vec![QualityFlag {
            check_type: "consistency:interval".to_string(),
            status: QualityStatus::Flagged,
            severity: 2,
            message: format!("reporting interval coefficient of variation {cv:.1}% exceeds 30%"),
            details: format!("mean_gap_days={mu:.2}, stdev_days={sigma:.2}"),
            affected_dates: vec![],
        }]
    } else {
        Vec::new()
    }
}

fn insufficient(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "consistency".to_string(),
        status: QualityStatus::Passed,
        severity: 0,
        message: "insufficient data".to_string(),
        details: reason.to_string(),
        affected_dates: vec![],
    }
}

fn passed(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "consistency".to_string(),
        status: QualityStatus::Passed,
        severity: 0,
        message: "passed".to_string(),
        details: reason.to_string(),
        affected_dates: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hints(is_cumulative: bool, aggregation: Option<TemporalAggregation>) -> DetectorHints {
        DetectorHints {
            expected_frequency: econ_core::ExpectedFrequency::Monthly,
            indicator_type: econ_core::IndicatorType::Flow,
            is_cumulative,
            expected_scale: None,
            temporal_aggregation: aggregation,
        }
    }

    fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| TimeSeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(30 * i as i64),
                value: v,
            })
            .collect()
    }

    #[test]
    fn cumulative_dip_is_one_monotonicity_violation() {
        // 11 points, 1 violation = ~9.1% of the series, under the 10%
        // severity-5 cutoff, so this should land at severity 3.
        let points = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 9.0]);
        let flags = detect(&points, &hints(true, None));
        let violations: Vec<_> = flags.iter().filter(|f| f.check_type == "consistency:monotonicity").collect();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, 3);
    }

    #[test]
    fn non_cumulative_dip_is_not_a_violation() {
        let points = series(&[1.0, 2.0, 3.0, 4.0, 3.0]);
        let flags = detect(&points, &hints(false, None));
        assert!(!flags.iter().any(|f| f.check_type == "consistency:monotonicity"));
    }

    #[test]
    fn duplicate_date_with_distinct_values_is_critical() {
        let mut points = series(&[1.0, 2.0, 3.0]);
        points.push(TimeSeriesPoint { date: points[1].date, value: 99.0 });
        let flags = detect(&points, &hints(false, None));
        assert!(flags.iter().any(|f| f.check_type == "consistency:temporal" && f.severity == 5));
    }

    #[test]
    fn irregular_intervals_flagged_when_aggregation_applies() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = [0, 30, 35, 95, 100, 200];
        let points: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, &d)| TimeSeriesPoint { date: base + chrono::Duration::days(d), value: i as f64 })
            .collect();
        let flags = detect(&points, &hints(false, Some(TemporalAggregation::PeriodTotal)));
        assert!(flags.iter().any(|f| f.check_type == "consistency:interval"));
    }
}
