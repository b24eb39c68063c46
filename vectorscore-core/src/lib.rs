//! vectorscore core library - vector string scoring for CVSS v3.1 and process maturity ratings

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Schemes are plain data, built and checked once, immutable afterwards
// - No global mutable state
// - No clocks, randomness, or I/O on the scoring path
// - Metric order comes from schema declaration order, never from hashing
// - Identical input yields byte-for-byte identical output

pub mod builtin;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod report;
pub mod schema;
pub mod scheme;
pub mod score;
pub mod severity;
pub mod validate;
pub mod values;

pub use config::ResolvedConfig;
pub use error::{DecodeError, ErrorKind, SchemeError, ScoringError, ValidationError};
pub use report::{render_json, render_json_line, render_text, CalculationRecord, ScoreResult};
pub use scheme::{Scheme, SchemeId};
pub use values::MetricValues;

/// Score a vector string and wrap the outcome in a caller-facing record
pub fn score_vector(scheme: &Scheme, vector: &str) -> CalculationRecord {
    CalculationRecord::from_result(&scheme.calculate_from_vector(vector))
}

/// Score discrete metric values and wrap the outcome in a caller-facing record
pub fn score_metrics(scheme: &Scheme, values: &MetricValues) -> CalculationRecord {
    CalculationRecord::from_result(&scheme.calculate_from_metrics(values))
}
