//! Component H: the time-series quality detector suite. Five detectors,
//! each a pure function over a sorted series plus classification hints,
//! folded into one consolidated verdict.

mod consistency;
mod consolidator;
mod false_readings;
mod magnitude_anomaly;
mod staleness;
mod stats;
mod unit_change;

pub use consolidator::run_quality_checks;
