use thiserror::Error;

/// Closed set of error kinds the normalization core can produce.
///
/// Per-record errors are collected into a batch report rather than
/// aborting the batch; only `InvalidConfiguration` is raised ahead of
/// any record-level work.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("malformed unit: {0}")]
    MalformedUnit(String),

    #[error("ambiguous signal: {0}")]
    AmbiguousSignal(String),

    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("infinite result: {0}")]
    InfiniteResult(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
