//! 4.H.2 — flags statistical outliers (z-score) and sudden period-over-
//! period changes in a series' magnitude.

use econ_core::{DetectorHints, QualityFlag, QualityStatus, TimeSeriesPoint};

use crate::stats::{mean, population_stdev};

pub fn detect(points: &[TimeSeriesPoint], hints: &DetectorHints) -> Vec<QualityFlag> {
    if points.len() < 2 {
        return vec![insufficient("fewer than 2 points")];
    }

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let mut flags = Vec::new();

    flags.extend(outliers(points, &values, hints.is_cumulative));
    flags.extend(sudden_changes(points, hints.is_cumulative));

    if flags.is_empty() {
        flags.push(passed("no anomalies detected"));
    }
    flags
}

fn outliers(points: &[TimeSeriesPoint], values: &[f64], is_cumulative: bool) -> Vec<QualityFlag> {
    let sigma = population_stdev(values);
    if sigma == 0.0 {
        return Vec::new();
    }
    let mu = mean(values);
    let threshold = if is_cumulative { 4.0 } else { 3.0 };

    points
        .iter()
        .zip(values.iter())
        .filter_map(|(point, &v)| {
            let z = (v - mu) / sigma;
            if z.abs() <= threshold {
                return None;
            }
            let (severity, status) = if z.abs() > 5.0 {
                (5, QualityStatus::Critical)
            } else {
                (2, QualityStatus::Flagged)
            };
            Some(QualityFlag {
                check_type: "magnitude_anomaly:outlier".to_string(),
                status,
                severity,
                message: format!("z-score {z:.2} exceeds threshold {threshold}"),
                details: format!("value={v}, mean={mu:.4}, stdev={sigma:.4}"),
                affected_dates: vec![point.date],
            })
        })
        .collect()
}

fn sudden_changes(points: &[TimeSeriesPoint], is_cumulative: bool) -> Vec<QualityFlag> {
    let sudden = if is_cumulative { 50.0 } else { 100.0 };
    let extreme = 1000.0;

    points
        .windows(2)
        .filter_map(|w| {
            let (prev, next) = (w[0], w[1]);
            let change_percent = if prev.value == 0.0 {
                f64::INFINITY
            } else {
                (next.value - prev.value).abs() / prev.value.abs() * 100.0
            };

            let (severity, status) = if change_percent > extreme {
                (5, QualityStatus::Critical)
            } else if change_percent > 3.0 * sudden {
                (4, QualityStatus::Critical)
            } else if change_percent > sudden {
                (3, QualityStatus::Flagged)
            } else {
                return None;
            };

            Some(QualityFlag {
                check_type: "magnitude_anomaly:sudden_change".to_string(),
                status,
                severity,
                message: format!("changed {change_percent:.1}% between consecutive points"),
                details: format!("{} -> {}", prev.value, next.value),
                affected_dates: vec![prev.date, next.date],
            })
        })
        .collect()
}

fn insufficient(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "magnitude_anomaly".to_string(),
        status: QualityStatus::Passed,
        severity: 0,
        message: "insufficient data".to_string(),
        details: reason.to_string(),
        affected_dates: vec![],
    }
}

fn passed(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "magnitude_anomaly".to_string(),
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
    use econ_core::IndicatorType;

    fn hints(is_cumulative: bool) -> DetectorHints {
        DetectorHints {
            expected_frequency: econ_core::ExpectedFrequency::Monthly,
            indicator_type: IndicatorType::Flow,
            is_cumulative,
            expected_scale: None,
            temporal_aggregation: None,
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
    fn detects_extreme_z_score_outlier() {
        // A tightly clustered baseline keeps population stdev small so the
        // lone outlier's z-score can clear 5 (the ceiling for a single
        // self-inclusive outlier is sqrt(n-1), so the baseline needs to be
        // long enough relative to the outlier's pull).
        let mut values: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
        values.push(1_000_000_000.0);
        let points = series(&values);
        let flags = detect(&points, &hints(false));
        assert!(flags.iter().any(|f| f.check_type == "magnitude_anomaly:outlier" && f.severity == 5));
    }

    #[test]
    fn detects_sudden_change_above_threshold() {
        let points = series(&[100.0, 105.0, 250.0, 255.0]);
        let flags = detect(&points, &hints(false));
        assert!(flags.iter().any(|f| f.check_type == "magnitude_anomaly:sudden_change"));
    }

    #[test]
    fn zero_division_in_change_percent_is_treated_as_infinite() {
        let points = series(&[0.0, 5.0]);
        let flags = detect(&points, &hints(false));
        assert!(flags.iter().any(|f| f.severity == 5));
    }

    #[test]
    fn stable_series_passes() {
        let points = series(&[100.0, 101.0, 99.0, 100.5, 100.2]);
        let flags = detect(&points, &hints(false));
        assert!(flags.iter().all(|f| f.status == QualityStatus::Passed));
    }
}
