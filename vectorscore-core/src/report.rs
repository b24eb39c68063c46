//! Result records and output rendering
//!
//! Global invariants enforced:
//! - Scores are formatted with exactly one decimal
//! - Score and sub-score ordering follows the scoring model
//! - Byte-for-byte identical output across runs

use crate::document::UNDEFINED_SEVERITY;
use crate::error::{ErrorKind, ScoringError};
use crate::schema::ScoreKind;
use crate::score::SubScore;
use serde::{Deserialize, Serialize};

/// A rounded score and its severity band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub kind: ScoreKind,
    pub value: f64,
    /// `None` when the score lies outside every band
    pub severity: Option<String>,
}

/// Outcome of a successful calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub scores: Vec<Score>,
    pub sub_scores: Vec<SubScore>,
    /// Canonical vector string of the scored values
    pub vector: String,
}

impl ScoreResult {
    pub fn score(&self, kind: ScoreKind) -> Option<&Score> {
        self.scores.iter().find(|s| s.kind == kind)
    }
}

/// Caller-facing record with a `success` flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalculationRecord {
    Success(SuccessRecord),
    Failure(FailureRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessRecord {
    pub success: bool,
    pub scores: Vec<ScoreRecord>,
    pub sub_scores: Vec<SubScore>,
    pub vector_string: String,
}

/// A score as one-decimal text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub kind: ScoreKind,
    pub score: String,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub success: bool,
    pub error_type: ErrorKind,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub error_metrics: Vec<String>,
}

impl CalculationRecord {
    pub fn from_result(result: &Result<ScoreResult, ScoringError>) -> Self {
        match result {
            Ok(result) => CalculationRecord::Success(SuccessRecord {
                success: true,
                scores: result
                    .scores
                    .iter()
                    .map(|s| ScoreRecord {
                        kind: s.kind,
                        score: format!("{:.1}", s.value),
                        severity: s
                            .severity
                            .clone()
                            .unwrap_or_else(|| UNDEFINED_SEVERITY.to_string()),
                    })
                    .collect(),
                sub_scores: result.sub_scores.clone(),
                vector_string: result.vector.clone(),
            }),
            Err(err) => CalculationRecord::Failure(FailureRecord {
                success: false,
                error_type: err.kind(),
                error_metrics: err.metrics().to_vec(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CalculationRecord::Success(_))
    }
}

/// Render a record as text output
pub fn render_text(record: &CalculationRecord) -> String {
    let mut output = String::new();

    match record {
        CalculationRecord::Success(success) => {
            output.push_str(&format!("{}\n", success.vector_string));
            output.push_str(&format!("{:<15} {:<6} {}\n", "KIND", "SCORE", "SEVERITY"));
            for score in &success.scores {
                output.push_str(&format!(
                    "{:<15} {:<6} {}\n",
                    score.kind.as_str(),
                    score.score,
                    score.severity
                ));
            }
        }
        CalculationRecord::Failure(failure) => {
            if failure.error_metrics.is_empty() {
                output.push_str(&format!("error: {}\n", failure.error_type));
            } else {
                output.push_str(&format!(
                    "error: {} ({})\n",
                    failure.error_type,
                    failure.error_metrics.join(", ")
                ));
            }
        }
    }

    output
}

/// Render a record as pretty JSON
pub fn render_json(record: &CalculationRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
}

/// Render a record as a single JSON line
pub fn render_json_line(record: &CalculationRecord) -> String {
    serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
}
