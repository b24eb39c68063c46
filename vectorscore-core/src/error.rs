//! Error taxonomy
//!
//! Every expected failure on caller input is one of four tagged kinds and
//! carries the offending metric codes where they are known. Scheme
//! misconfiguration is reported separately through [`SchemeError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error tag surfaced verbatim to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingMandatoryMetric,
    IllegalValue,
    MalformedVector,
    DuplicateMetric,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingMandatoryMetric => "MissingMandatoryMetric",
            ErrorKind::IllegalValue => "IllegalValue",
            ErrorKind::MalformedVector => "MalformedVector",
            ErrorKind::DuplicateMetric => "DuplicateMetric",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure while turning a vector string into metric values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed vector string")]
    MalformedVector,

    #[error("metric defined more than once: {}", .metrics.join(", "))]
    DuplicateMetric { metrics: Vec<String> },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::MalformedVector => ErrorKind::MalformedVector,
            DecodeError::DuplicateMetric { .. } => ErrorKind::DuplicateMetric,
        }
    }

    /// Offending metric codes (empty for a malformed string)
    pub fn metrics(&self) -> &[String] {
        match self {
            DecodeError::MalformedVector => &[],
            DecodeError::DuplicateMetric { metrics } => metrics,
        }
    }
}

/// Failure while checking metric values against a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing mandatory metric(s): {}", .metrics.join(", "))]
    MissingMandatoryMetric { metrics: Vec<String> },

    #[error("illegal value for metric(s): {}", .metrics.join(", "))]
    IllegalValue { metrics: Vec<String> },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::MissingMandatoryMetric { .. } => ErrorKind::MissingMandatoryMetric,
            ValidationError::IllegalValue { .. } => ErrorKind::IllegalValue,
        }
    }

    pub fn metrics(&self) -> &[String] {
        match self {
            ValidationError::MissingMandatoryMetric { metrics }
            | ValidationError::IllegalValue { metrics } => metrics,
        }
    }
}

/// Any failure a scoring call can return for bad input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ScoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScoringError::Decode(err) => err.kind(),
            ScoringError::Validation(err) => err.kind(),
        }
    }

    pub fn metrics(&self) -> &[String] {
        match self {
            ScoringError::Decode(err) => err.metrics(),
            ScoringError::Validation(err) => err.metrics(),
        }
    }
}

/// A scheme definition that cannot be used for scoring
///
/// These are programming errors in schema data, caught once when the scheme
/// is built rather than on every call.
#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("metric `{0}` is declared more than once")]
    DuplicateMetricCode(String),

    #[error("metric `{metric}` declares value `{value}` more than once")]
    DuplicateValueCode { metric: String, value: String },

    #[error("metric `{0}` has no legal values")]
    EmptyMetric(String),

    #[error("`{0}` is not a valid vector token")]
    InvalidToken(String),

    #[error("metric `{0}` uses the reserved not-defined code as a regular value")]
    ReservedValue(String),

    #[error("optional metric `{0}` does not define how a not-defined value resolves")]
    MissingNotDefined(String),

    #[error("metric `{metric}` cannot inherit from `{target}`: {reason}")]
    InvalidInheritance {
        metric: String,
        target: String,
        reason: String,
    },

    #[error("scheme `{0}` has no mandatory metric group")]
    NoMandatoryGroup(String),

    #[error("scoring model references unknown metric `{0}`")]
    UnknownModelMetric(String),

    #[error("invalid severity scale: {0}")]
    InvalidSeverityScale(String),

    #[error("invalid vector prefix `{prefix}`")]
    InvalidPrefix {
        prefix: String,
        #[source]
        source: regex::Error,
    },
}
