//! 4.H.1 — flags an indicator whose most recent point is older than
//! expected, or whose history contains an unusually large reporting gap.

use chrono::NaiveDate;
use econ_core::{DetectorHints, QualityFlag, QualityStatus};

pub fn detect(points: &[econ_core::TimeSeriesPoint], hints: &DetectorHints, now: NaiveDate) -> Vec<QualityFlag> {
    if points.is_empty() {
        return vec![insufficient("no points provided")];
    }

    let expected = hints.expected_frequency.expected_gap_days();
    let threshold = expected * 1.5;

    let last = points.last().unwrap().date;
    let days_since = (now - last).num_days() as f64;

    let max_hist_gap = points
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days() as f64)
        .fold(0.0_f64, f64::max);

    let mut flags = Vec::new();

    if days_since > threshold {
        let (severity, status) = if days_since <= expected * 3.0 {
            (3, QualityStatus::Flagged)
        } else {
            (5, QualityStatus::Critical)
        };
        flags.push(QualityFlag {
            check_type: "staleness".to_string(),
            status,
            severity,
            message: format!("no data for {days_since:.0} days"),
            details: format!("expected gap {expected:.0}d, threshold {threshold:.0}d, last observed {last}"),
            affected_dates: vec![last],
        });
    }

    if max_hist_gap > threshold && (max_hist_gap - days_since).abs() > 1e-9 {
        flags.push(QualityFlag {
            check_type: "staleness".to_string(),
            status: QualityStatus::Flagged,
            severity: 2,
            message: format!("historical gap of {max_hist_gap:.0} days"),
            details: format!("largest observed gap exceeded threshold {threshold:.0}d"),
            affected_dates: vec![],
        });
    }

    if flags.is_empty() {
        flags.push(passed("within expected reporting cadence"));
    }

    flags
}

fn insufficient(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "staleness".to_string(),
        status: QualityStatus::Passed,
        severity: 0,
        message: "insufficient data".to_string(),
        details: reason.to_string(),
        affected_dates: vec![],
    }
}

fn passed(reason: &str) -> QualityFlag {
    QualityFlag {
        check_type: "staleness".to_string(),
        status: QualityStatus::Passed,
        severity: 0,
        message: "passed".to_string(),
        details: reason.to_string(),
        affected_dates: vec![],
    }
}
