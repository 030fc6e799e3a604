//! 4.H.4 — detects a step change in reporting unit/scale (e.g. a series
//! silently switching from thousands to millions) via a rolling-window
//! mean-ratio test against canonical magnitude factors.

use econ_core::{QualityFlag, QualityStatus, TimeSeriesPoint};

use crate::stats::mean;

const CANONICAL_FACTORS: [f64; 3] = [1_000.0, 1_000_000.0, 1_000_000_000.0];
const TOLERANCE: f64 = 0.2;

pub fn detect(points: &[TimeSeriesPoint]) -> Vec<QualityFlag> {
    let n = points.len();
    let window = (n / 4).min(10);
    if window < 3 {
        return vec![insufficient("fewer than 12 points (window < 3)")];
    }

    let abs_values: Vec<f64> = points.iter().map(|p| p.value.abs()).collect();
    let mut flags = Vec::new();

    for i in window..=(n - window) {
        let before = &abs_values[i - window..i];
        let after = &abs_values[i..(i + window).min(n)];
        let mean_before = mean(before);
        let mean_after = mean(after);
        if mean_before == 0.0 {
            continue;
        }
        let ratio = mean_after / mean_before;

        if let Some(factor) = matching_canonical_factor(ratio) {
            let severity = if factor >= 1_000_000.0 { 5 } else if factor >= 1_000.0 { 4 } else { 3 };
            let status = if severity >= 4 { QualityStatus::Critical } else { QualityStatus::Flagged };
            flags.push(QualityFlag {
                check_type: "unit_change".to_string(),
                status,
                severity,
                message: format!("possible regime shift near factor {factor:.0} (ratio {ratio:.4})"),
                details: format!("mean_before={mean_before:.4}, mean_after={mean_after:.4}"),
                affected_dates: vec![points[i].date],
            });
        }
    }

    if flags.is_empty() {
        flags.push(passed("no regime shift detected"));
    }
    flags
}

fn matching_canonical_factor(ratio: f64) -> Option<f64> {
    if ratio == 0.0 || !ratio.is_finite() {
        return None;
    }
    CANONICAL_FACTORS.into_iter().find(|&f| {
        within_tolerance(ratio, f) || within_tolerance(1.0 / ratio, f)
    })
}

fn within_tolerance(value: f64, factor: f64) -> bool {
    (value - factor).abs() / factor <= TOLERANCE
}

fn insufficient(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "unit_change".to_string(),
        status: QualityStatus::Passed,
        severity: 0,
        message: "insufficient data".to_string(),
        details: reason.to_string(),
        affected_dates: vec![],
    }
}

fn passed(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "unit_change".to_string(),
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
    fn detects_thousand_fold_step_change() {
        let mut values: Vec<f64> = vec![10.0; 20];
        values.extend(vec![10_000.0; 20]);
        let points = series(&values);
        let flags = detect(&points);
        assert!(flags.iter().any(|f| f.check_type == "unit_change" && f.severity == 4));
    }

    #[test]
    fn stable_series_has_no_regime_shift() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + (i % 5) as f64).collect();
        let points = series(&values);
        let flags = detect(&points);
        assert!(flags.iter().all(|f| f.status == QualityStatus::Passed));
    }

    #[test]
    fn short_series_is_insufficient() {
        let points = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let flags = detect(&points);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].status, QualityStatus::Passed);
    }
}
