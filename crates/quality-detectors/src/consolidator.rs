use econ_core::{ConsolidatedQualityReport, DetectorHints, OverallStatus, QualityFlag, QualityStatus, TimeSeriesPoint};

use crate::stats::severity_weight;
use crate::{consistency, false_readings, magnitude_anomaly, staleness, unit_change};

/// Run all five detectors over one indicator's time series and fold
/// their findings into a single verdict. Detectors are independent pure
/// functions (spec §4.H); nothing here prevents running them in
/// parallel, but five cheap passes over one series rarely justify it.
pub fn run_quality_checks(
    indicator_id: &str,
    points: &[TimeSeriesPoint],
    hints: &DetectorHints,
    now: chrono::NaiveDate,
) -> ConsolidatedQualityReport {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);

    let per_detector = [
        staleness::detect(&sorted, hints, now),
        magnitude_anomaly::detect(&sorted, hints),
        false_readings::detect(&sorted, hints),
        unit_change::detect(&sorted),
        consistency::detect(&sorted, hints),
    ];

    let mut passed = 0u8;
    let mut flagged = 0u8;
    let mut critical = 0u8;
    let mut all_flags: Vec<QualityFlag> = Vec::new();

    for detector_flags in per_detector {
        match bucket(&detector_flags) {
            QualityStatus::Critical => critical += 1,
            QualityStatus::Flagged => flagged += 1,
            QualityStatus::Passed => passed += 1,
        }
        all_flags.extend(detector_flags);
    }

    let overall_score = (100.0
        - all_flags
            .iter()
            .filter(|f| f.status != QualityStatus::Passed)
            .map(|f| severity_weight(f.severity))
            .sum::<f64>())
    .clamp(0.0, 100.0);

    let max_severity = all_flags
        .iter()
        .filter(|f| f.status != QualityStatus::Passed)
        .map(|f| f.severity)
        .max()
        .unwrap_or(0);

    let status = match max_severity {
        0 => OverallStatus::Clean,
        5 => OverallStatus::Unusable,
        3 | 4 => OverallStatus::MajorIssues,
        _ => OverallStatus::MinorIssues,
    };

    ConsolidatedQualityReport {
        indicator_id: indicator_id.to_string(),
        total_checks: 5,
        passed,
        flagged,
        critical,
        all_flags,
        overall_score,
        status,
    }
}

fn bucket(flags: &[QualityFlag]) -> QualityStatus {
    if flags.iter().any(|f| f.status == QualityStatus::Critical) {
        QualityStatus::Critical
    } else if flags.iter().any(|f| f.status == QualityStatus::Flagged) {
        QualityStatus::Flagged
    } else {
        QualityStatus::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use econ_core::{ExpectedFrequency, IndicatorType};
    use chrono::NaiveDate;

    fn hints() -> DetectorHints {
        DetectorHints {
            expected_frequency: ExpectedFrequency::Monthly,
            indicator_type: IndicatorType::Flow,
            is_cumulative: false,
            expected_scale: None,
            temporal_aggregation: None,
        }
    }

    #[test]
    fn clean_series_scores_100_and_is_clean() {
        let points: Vec<_> = (0..6)
            .map(|i| TimeSeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(30 * i),
                value: 100.0 + i as f64,
            })
            .collect();
        let now = points.last().unwrap().date;
        let report = run_quality_checks("ind-1", &points, &hints(), now);
        assert_eq!(report.total_checks, 5);
        assert_eq!(report.status, OverallStatus::Clean);
        assert_eq!(report.overall_score, 100.0);
    }

    #[test]
    fn determinism_running_twice_yields_identical_report() {
        let points: Vec<_> = (0..6)
            .map(|i| TimeSeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(30 * i),
                value: 100.0 + i as f64,
            })
            .collect();
        let now = points.last().unwrap().date;
        let a = run_quality_checks("ind-1", &points, &hints(), now);
        let b = run_quality_checks("ind-1", &points, &hints(), now);
        assert_eq!(a, b);
    }

    #[test]
    fn unsorted_input_is_sorted_before_analysis() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut points = vec![
            TimeSeriesPoint { date: d0 + chrono::Duration::days(60), value: 102.0 },
            TimeSeriesPoint { date: d0, value: 100.0 },
            TimeSeriesPoint { date: d0 + chrono::Duration::days(30), value: 101.0 },
        ];
        let shuffled_report = run_quality_checks("ind-1", &points, &hints(), d0 + chrono::Duration::days(60));
        points.sort_by_key(|p| p.date);
        let sorted_report = run_quality_checks("ind-1", &points, &hints(), d0 + chrono::Duration::days(60));
        assert_eq!(shuffled_report, sorted_report);
    }
}
