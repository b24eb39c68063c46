//! Vector string codec
//!
//! Grammar: `<prefix>(/<CODE>:<VALUE>)+`, anchored at both ends, where
//! `CODE = [A-Z][A-Z0-9]*` and `VALUE = [A-Z0-9]+`.
//!
//! The grammar checks shape only. Metric codes unknown to the schema decode
//! fine and are rejected later by validation as illegal values.

use crate::error::{DecodeError, SchemeError};
use crate::schema::{Schema, NOT_DEFINED};
use crate::values::MetricValues;
use regex::Regex;
use tracing::debug;

/// Check that `s` can appear as a metric code in a vector
pub(crate) fn is_code_token(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Check that `s` can appear as a value code in a vector
pub(crate) fn is_value_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Parser and printer for one scheme's vector strings
#[derive(Debug, Clone)]
pub struct VectorCodec {
    prefix: String,
    grammar: Regex,
}

impl VectorCodec {
    pub fn new(prefix: &str) -> Result<Self, SchemeError> {
        let pattern = format!(r"^{}(?:/[A-Z][A-Z0-9]*:[A-Z0-9]+)+$", regex::escape(prefix));
        let grammar = Regex::new(&pattern).map_err(|source| SchemeError::InvalidPrefix {
            prefix: prefix.to_string(),
            source,
        })?;
        Ok(VectorCodec {
            prefix: prefix.to_string(),
            grammar,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_well_formed(&self, text: &str) -> bool {
        self.grammar.is_match(text)
    }

    /// Parse a vector string into metric values
    ///
    /// Reports all repeated metric codes together, even when the repeated
    /// occurrences carry identical values.
    pub fn decode(&self, text: &str) -> Result<MetricValues, DecodeError> {
        if !self.is_well_formed(text) {
            debug!(vector = text, "rejected malformed vector string");
            return Err(DecodeError::MalformedVector);
        }

        let body = &text[self.prefix.len()..];
        let mut pairs = Vec::new();
        for segment in body.split('/').skip(1) {
            let (code, value) = segment
                .split_once(':')
                .ok_or(DecodeError::MalformedVector)?;
            pairs.push((code, value));
        }

        let decoded = MetricValues::try_from_pairs(pairs);
        if let Err(err) = &decoded {
            debug!(vector = text, %err, "rejected vector string");
        }
        decoded
    }

    /// Print metric values in canonical form
    ///
    /// Metrics come out in schema declaration order. Mandatory metrics are
    /// always printed; optional ones only when defined. Codes the schema does
    /// not know are never printed.
    pub fn encode(&self, schema: &Schema, values: &MetricValues) -> String {
        let mut vector = self.prefix.clone();
        for group in schema.groups() {
            for metric in &group.metrics {
                let Some(value) = values.get(&metric.code) else {
                    continue;
                };
                if !group.mandatory && (value.is_empty() || value == NOT_DEFINED) {
                    continue;
                }
                vector.push('/');
                vector.push_str(&metric.code);
                vector.push(':');
                vector.push_str(value);
            }
        }
        vector
    }
}
