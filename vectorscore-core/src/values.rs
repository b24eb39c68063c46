//! Metric value maps
//!
//! A `MetricValues` maps metric codes to the single value code selected for
//! each. Keys are unique: building a map from pairs reports repeated codes
//! instead of overwriting them.

use crate::error::DecodeError;
use crate::schema::{Schema, NOT_DEFINED};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricValues {
    values: BTreeMap<String, String>,
}

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from one slot per schema metric, in declaration order
    ///
    /// `None` leaves the metric out. An empty string in an optional slot is
    /// also left out (it means "not defined"); in a mandatory slot it is kept
    /// so validation reports the metric as missing. Slots beyond the schema's
    /// metric count are ignored.
    pub fn from_ordered(schema: &Schema, inputs: &[Option<&str>]) -> Self {
        let mut values = MetricValues::new();
        for (metric, input) in schema.metrics().zip(inputs) {
            let Some(value) = input else { continue };
            if value.is_empty() && !schema.is_mandatory(&metric.code) {
                continue;
            }
            values.insert(&metric.code, value);
        }
        values
    }

    /// Build from `(code, value)` pairs, rejecting repeated codes
    ///
    /// Every repeated code is reported once, in the order its first repeat
    /// was seen.
    pub fn try_from_pairs<I, K, V>(pairs: I) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values = MetricValues::new();
        let mut duplicates: Vec<String> = Vec::new();

        for (code, value) in pairs {
            let code = code.as_ref();
            if values.contains(code) {
                if !duplicates.iter().any(|d| d == code) {
                    duplicates.push(code.to_string());
                }
            } else {
                values.insert(code, value.as_ref());
            }
        }

        if duplicates.is_empty() {
            Ok(values)
        } else {
            Err(DecodeError::DuplicateMetric {
                metrics: duplicates,
            })
        }
    }

    /// Set a value, returning the previous one
    pub fn insert(&mut self, code: &str, value: &str) -> Option<String> {
        self.values.insert(code.to_string(), value.to_string())
    }

    pub fn with(mut self, code: &str, value: &str) -> Self {
        self.insert(code, value);
        self
    }

    pub fn remove(&mut self, code: &str) -> Option<String> {
        self.values.remove(code)
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.values.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.values.contains_key(code)
    }

    /// Entries ordered by metric code
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop optional metrics that are explicitly not defined
    ///
    /// This is the form a map takes after a trip through the vector codec.
    pub fn normalized(&self, schema: &Schema) -> Self {
        let values = self
            .values
            .iter()
            .filter(|(code, value)| schema.is_mandatory(code) || value.as_str() != NOT_DEFINED)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        MetricValues { values }
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for MetricValues {
    /// Collect pairs; later pairs overwrite earlier ones
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = MetricValues::new();
        for (code, value) in iter {
            values.insert(code.as_ref(), value.as_ref());
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn test_try_from_pairs_collects_every_duplicate() {
        let err = MetricValues::try_from_pairs([
            ("AV", "N"),
            ("AC", "L"),
            ("AV", "N"),
            ("AC", "H"),
            ("AV", "L"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DecodeError::DuplicateMetric {
                metrics: vec!["AV".to_string(), "AC".to_string()]
            }
        );
    }

    #[test]
    fn test_try_from_pairs_keeps_unique_entries() {
        let values = MetricValues::try_from_pairs([("AV", "N"), ("Z", "X")]).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("AV"), Some("N"));
        assert_eq!(values.get("Z"), Some("X"));
    }

    #[test]
    fn test_from_ordered_follows_declaration_order() {
        let scheme = builtin::cvss31().unwrap();
        let inputs = [
            Some("N"),
            Some("L"),
            Some("N"),
            Some("N"),
            Some("U"),
            Some("H"),
            Some(""),
            None,
            Some(""),
            Some("O"),
        ];
        let values = MetricValues::from_ordered(scheme.schema(), &inputs);

        assert_eq!(values.get("AV"), Some("N"));
        assert_eq!(values.get("S"), Some("U"));
        // empty mandatory slot is kept so it is reported as missing
        assert_eq!(values.get("I"), Some(""));
        assert_eq!(values.get("A"), None);
        // empty optional slot means not defined
        assert_eq!(values.get("E"), None);
        assert_eq!(values.get("RL"), Some("O"));
    }

    #[test]
    fn test_normalized_drops_only_optional_sentinels() {
        let scheme = builtin::cvss31().unwrap();
        let values = MetricValues::new()
            .with("AV", "N")
            .with("E", "X")
            .with("MAV", "X")
            .with("RL", "O");
        let normalized = values.normalized(scheme.schema());
        assert_eq!(normalized.len(), 2);
        assert!(normalized.contains("AV"));
        assert!(normalized.contains("RL"));
    }
}
