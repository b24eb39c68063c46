//! Scoring schemes
//!
//! A `Scheme` bundles everything needed to score one vector family: schema,
//! codec, scoring model, severity scale and document layout. It is built and
//! checked once, then shared by reference; nothing in it changes afterwards.
//!
//! Global invariants enforced:
//! - Every metric the model reads exists in the schema
//! - Severity bands cover exactly `[0, max]` of the model
//! - Every operation is a pure function of its inputs

use crate::builtin;
use crate::codec::VectorCodec;
use crate::document::{self, DocumentLayout};
use crate::error::{DecodeError, SchemeError, ScoringError, ValidationError};
use crate::report::{Score, ScoreResult};
use crate::schema::Schema;
use crate::score::ScoringModel;
use crate::severity::SeverityScale;
use crate::validate::validate;
use crate::values::MetricValues;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifier of a built-in scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeId {
    #[default]
    Cvss31,
    Reifegrad,
}

impl SchemeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeId::Cvss31 => "cvss31",
            SchemeId::Reifegrad => "reifegrad",
        }
    }

    pub fn all() -> [SchemeId; 2] {
        [SchemeId::Cvss31, SchemeId::Reifegrad]
    }
}

impl std::str::FromStr for SchemeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cvss31" => Ok(SchemeId::Cvss31),
            "reifegrad" => Ok(SchemeId::Reifegrad),
            other => Err(format!(
                "unknown scheme `{other}` (expected `cvss31` or `reifegrad`)"
            )),
        }
    }
}

impl std::fmt::Display for SchemeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Scheme {
    schema: Schema,
    codec: VectorCodec,
    model: ScoringModel,
    severity: SeverityScale,
    document: DocumentLayout,
}

impl Scheme {
    pub fn new(
        schema: Schema,
        model: ScoringModel,
        severity: SeverityScale,
        document: DocumentLayout,
    ) -> Result<Self, SchemeError> {
        let codec = VectorCodec::new(schema.prefix())?;

        if let Some(unknown) = model
            .referenced_metrics()
            .into_iter()
            .find(|code| schema.get(code).is_none())
        {
            return Err(SchemeError::UnknownModelMetric(unknown.to_string()));
        }
        severity.check_covers(model.max_score())?;

        Ok(Scheme {
            schema,
            codec,
            model,
            severity,
            document,
        })
    }

    /// Build one of the built-in schemes
    pub fn builtin(id: SchemeId) -> Result<Self, SchemeError> {
        match id {
            SchemeId::Cvss31 => builtin::cvss31(),
            SchemeId::Reifegrad => builtin::reifegrad(),
        }
    }

    /// Replace the severity scale, keeping everything else
    pub fn with_severity(self, severity: SeverityScale) -> Result<Self, SchemeError> {
        severity.check_covers(self.model.max_score())?;
        Ok(Scheme { severity, ..self })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn codec(&self) -> &VectorCodec {
        &self.codec
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    pub fn severity(&self) -> &SeverityScale {
        &self.severity
    }

    pub fn document_layout(&self) -> &DocumentLayout {
        &self.document
    }

    pub fn decode(&self, vector: &str) -> Result<MetricValues, DecodeError> {
        self.codec.decode(vector)
    }

    pub fn encode(&self, values: &MetricValues) -> String {
        self.codec.encode(&self.schema, values)
    }

    pub fn validate(&self, values: &MetricValues) -> Result<(), ValidationError> {
        validate(values, &self.schema)
    }

    /// Validate, score and classify metric values
    pub fn calculate_from_metrics(&self, values: &MetricValues) -> Result<ScoreResult, ScoringError> {
        self.validate(values)?;

        let calculation = self.model.compute(&self.schema, values);
        let scores = calculation
            .scores
            .into_iter()
            .map(|(kind, value)| Score {
                kind,
                value,
                severity: self.severity.classify(value).map(str::to_string),
            })
            .collect();
        let vector = self.encode(values);
        debug!(vector = %vector, "scored vector");

        Ok(ScoreResult {
            scores,
            sub_scores: calculation.sub_scores,
            vector,
        })
    }

    /// Decode a vector string, then score it
    pub fn calculate_from_vector(&self, vector: &str) -> Result<ScoreResult, ScoringError> {
        let values = self.decode(vector)?;
        self.calculate_from_metrics(&values)
    }

    /// Score many vector strings in parallel, keeping input order
    pub fn calculate_many<S>(&self, vectors: &[S]) -> Vec<Result<ScoreResult, ScoringError>>
    where
        S: AsRef<str> + Sync,
    {
        vectors
            .par_iter()
            .map(|v| self.calculate_from_vector(v.as_ref()))
            .collect()
    }

    /// Validate and score metric values, then render them as XML
    pub fn export_xml_from_metrics(&self, values: &MetricValues) -> Result<String, ScoringError> {
        let result = self.calculate_from_metrics(values)?;
        let xml = document::render(&self.document, &self.schema, values, &result.scores)?;
        Ok(xml)
    }

    /// Decode a vector string, then render it as XML
    pub fn export_xml_from_vector(&self, vector: &str) -> Result<String, ScoringError> {
        let values = self.decode(vector)?;
        self.export_xml_from_metrics(&values)
    }
}
