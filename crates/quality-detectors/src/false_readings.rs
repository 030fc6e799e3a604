//! 4.H.3 — four independent sub-detectors for readings that are
//! structurally implausible rather than merely unusual: impossible
//! values, flat periods, repeating patterns, and likely decimal-point
//! transcription errors.

use std::collections::HashMap;

use econ_core::{DetectorHints, IndicatorType, QualityFlag, QualityStatus, TimeSeriesPoint};

use crate::stats::{median, min_max};

const DECIMAL_SCALES: [f64; 8] = [10.0, 100.0, 1000.0, 10000.0, 0.1, 0.01, 0.001, 0.0001];

pub fn detect(points: &[TimeSeriesPoint], hints: &DetectorHints) -> Vec<QualityFlag> {
    if points.is_empty() {
        return vec![insufficient("no points provided")];
    }

    let mut flags = Vec::new();
    flags.extend(impossible_values(points, &hints.indicator_type));
    flags.extend(flat_periods(points));
    flags.extend(repeating_patterns(points));
    flags.extend(decimal_errors(points));

    if flags.is_empty() {
        flags.push(passed("no false readings detected"));
    }
    flags
}

fn impossible_values(points: &[TimeSeriesPoint], indicator_type: &IndicatorType) -> Vec<QualityFlag> {
    if !matches!(indicator_type, IndicatorType::Stock | IndicatorType::Capacity | IndicatorType::Price) {
        return Vec::new();
    }
    points
        .iter()
        .filter(|p| p.value < 0.0)
        .map(|p| QualityFlag {
            check_type: "false_reading:impossible_value".to_string(),
            status: QualityStatus::Critical,
            severity: 5,
            message: format!("negative value {} is impossible for this indicator type", p.value),
            details: format!("date={}", p.date),
            affected_dates: vec![p.date],
        })
        .collect()
}

fn flat_periods(points: &[TimeSeriesPoint]) -> Vec<QualityFlag> {
    let mut flags = Vec::new();
    let mut run_start = 0;
    for i in 1..=points.len() {
        let run_continues = i < points.len() && (points[i].value - points[run_start].value).abs() < 1e-9;
        if !run_continues {
            let run_len = i - run_start;
            if run_len >= 5 {
                flags.push(QualityFlag {
                    check_type: "false_reading:flat_period".to_string(),
                    status: QualityStatus::Flagged,
                    severity: 3,
                    message: format!("{run_len} consecutive equal values"),
                    details: format!("value={}", points[run_start].value),
                    affected_dates: vec![points[run_start].date, points[i - 1].date],
                });
            }
            run_start = i;
        }
    }
    flags
}

fn repeating_patterns(points: &[TimeSeriesPoint]) -> Vec<QualityFlag> {
    if points.len() < 3 {
        return Vec::new();
    }
    let mut signatures: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (i, window) in points.windows(3).enumerate() {
        let key = (
            (window[0].value / 1e-4).round() as i64,
            (window[1].value / 1e-4).round() as i64,
            (window[2].value / 1e-4).round() as i64,
        );
        signatures.entry(key).or_default().push(i);
    }

    let mut recurring: Vec<_> = signatures.into_iter().filter(|(_, occurrences)| occurrences.len() >= 3).collect();
    recurring.sort_by_key(|(_, occurrences)| occurrences[0]);

    recurring
        .into_iter()
        .map(|(_, occurrences)| {
            let dates: Vec<_> = occurrences.iter().map(|&i| points[i].date).collect();
            QualityFlag {
                check_type: "false_reading:repeating_pattern".to_string(),
                status: QualityStatus::Flagged,
                severity: 4,
                message: format!("a 3-value pattern recurs {} times", occurrences.len()),
                details: "exact match within 1e-4".to_string(),
                affected_dates: dates,
            }
        })
        .collect()
}

fn decimal_errors(points: &[TimeSeriesPoint]) -> Vec<QualityFlag> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let med = median(&values);
    let (min, max) = min_max(&values);

    points
        .iter()
        .filter_map(|p| {
            if p.value == 0.0 {
                return None;
            }
            DECIMAL_SCALES.iter().find_map(|&s| {
                let candidate = p.value / s;
                let in_range = candidate >= min * 0.5 && candidate <= max * 2.0;
                let closer_to_median = (candidate - med).abs() < (p.value - med).abs();
                if in_range && closer_to_median {
                    Some(QualityFlag {
                        check_type: "false_reading:decimal_error".to_string(),
                        status: QualityStatus::Critical,
                        severity: 5,
                        message: format!("value {} looks like a decimal-point error (x{s})", p.value),
                        details: format!("suspected_correct_value={candidate}"),
                        affected_dates: vec![p.date],
                    })
                } else {
                    None
                }
            })
        })
        .collect()
}

fn insufficient(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "false_reading".to_string(),
        status: QualityStatus::Passed,
        severity: 0,
        message: "insufficient data".to_string(),
        details: reason.to_string(),
        affected_dates: vec![],
    }
}

fn passed(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "false_reading".to_string(),
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

    fn hints(indicator_type: IndicatorType) -> DetectorHints {
        DetectorHints {
            expected_frequency: econ_core::ExpectedFrequency::Monthly,
            indicator_type,
            is_cumulative: false,
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
    fn negative_stock_value_is_impossible() {
        let points = series(&[100.0, -5.0, 110.0]);
        let flags = detect(&points, &hints(IndicatorType::Stock));
        assert!(flags.iter().any(|f| f.check_type == "false_reading:impossible_value"));
    }

    #[test]
    fn negative_flow_value_is_not_impossible() {
        let points = series(&[100.0, -5.0, 110.0]);
        let flags = detect(&points, &hints(IndicatorType::Flow));
        assert!(!flags.iter().any(|f| f.check_type == "false_reading:impossible_value"));
    }

    #[test]
    fn twelve_identical_values_is_one_flat_period_flag() {
        let points = series(&[50.0; 12]);
        let flags = detect(&points, &hints(IndicatorType::Flow));
        let flat: Vec<_> = flags.iter().filter(|f| f.check_type == "false_reading:flat_period").collect();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].severity, 3);
    }

    #[test]
    fn recurring_three_value_window_is_flagged() {
        let points = series(&[1.0, 2.0, 3.0, 9.0, 1.0, 2.0, 3.0, 8.0, 1.0, 2.0, 3.0]);
        let flags = detect(&points, &hints(IndicatorType::Flow));
        assert!(flags.iter().any(|f| f.check_type == "false_reading:repeating_pattern"));
    }

    #[test]
    fn decimal_point_error_is_detected() {
        let mut values = vec![100.0, 102.0, 98.0, 101.0, 99.0, 103.0];
        values.push(10100.0);
        let points = series(&values);
        let flags = detect(&points, &hints(IndicatorType::Flow));
        assert!(flags.iter().any(|f| f.check_type == "false_reading:decimal_error"));
    }
}
