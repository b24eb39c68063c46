//! Metric schema
//!
//! A schema is plain configuration data: ordered metric groups, each holding
//! metrics with their legal value codes, display labels and weights.
//!
//! Global invariants enforced:
//! - Built once, never mutated afterwards
//! - Declaration order is the canonical order for vectors and documents
//! - Every code is a valid vector token, so anything the schema accepts can be
//!   emitted and decoded again

use crate::codec::{is_code_token, is_value_token};
use crate::error::SchemeError;
use serde::Serialize;

/// Sentinel value code meaning "not defined" in optional groups
pub const NOT_DEFINED: &str = "X";

/// Display label rendered for [`NOT_DEFINED`]
pub const NOT_DEFINED_LABEL: &str = "NOT_DEFINED";

/// Which score a metric group reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Base,
    Temporal,
    Environmental,
    Maturity,
}

impl ScoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Base => "base",
            ScoreKind::Temporal => "temporal",
            ScoreKind::Environmental => "environmental",
            ScoreKind::Maturity => "maturity",
        }
    }
}

/// Numeric contribution of a single metric value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Fixed(f64),
    /// Weight that differs when the vector's scope is changed
    ScopeDependent { unchanged: f64, changed: f64 },
}

impl Weight {
    pub fn resolve(&self, scope_changed: bool) -> f64 {
        match *self {
            Weight::Fixed(w) => w,
            Weight::ScopeDependent { unchanged, changed } => {
                if scope_changed {
                    changed
                } else {
                    unchanged
                }
            }
        }
    }
}

/// One legal value of a metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub code: String,
    pub label: String,
    pub weight: Weight,
}

/// How the not-defined sentinel resolves for an optional metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotDefined {
    /// Scores as a constant weight
    Neutral(f64),
    /// Scores as whatever the named mandatory metric selected
    Inherit(String),
}

/// A categorical scoring dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub code: String,
    pub name: String,
    /// Element name used in exported documents
    pub element: String,
    pub values: Vec<MetricValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_defined: Option<NotDefined>,
}

impl Metric {
    pub fn new(code: &str, name: &str, element: &str) -> Self {
        Metric {
            code: code.to_string(),
            name: name.to_string(),
            element: element.to_string(),
            values: Vec::new(),
            not_defined: None,
        }
    }

    /// Add a legal value with a fixed weight
    pub fn value(mut self, code: &str, label: &str, weight: f64) -> Self {
        self.values.push(MetricValue {
            code: code.to_string(),
            label: label.to_string(),
            weight: Weight::Fixed(weight),
        });
        self
    }

    /// Add a legal value whose weight depends on scope
    pub fn scoped_value(mut self, code: &str, label: &str, unchanged: f64, changed: f64) -> Self {
        self.values.push(MetricValue {
            code: code.to_string(),
            label: label.to_string(),
            weight: Weight::ScopeDependent { unchanged, changed },
        });
        self
    }

    pub fn neutral_when_undefined(mut self, weight: f64) -> Self {
        self.not_defined = Some(NotDefined::Neutral(weight));
        self
    }

    pub fn inherits(mut self, base: &str) -> Self {
        self.not_defined = Some(NotDefined::Inherit(base.to_string()));
        self
    }

    pub fn get(&self, value: &str) -> Option<&MetricValue> {
        self.values.iter().find(|v| v.code == value)
    }

    /// Check a value code; optional metrics also accept the sentinel
    pub fn accepts(&self, value: &str, optional: bool) -> bool {
        (optional && value == NOT_DEFINED) || self.get(value).is_some()
    }

    /// Human-readable label for a value code
    pub fn label(&self, value: &str) -> Option<&str> {
        if value == NOT_DEFINED && self.not_defined.is_some() {
            return Some(NOT_DEFINED_LABEL);
        }
        self.get(value).map(|v| v.label.as_str())
    }

    fn check(&self, optional: bool) -> Result<(), SchemeError> {
        if !is_code_token(&self.code) {
            return Err(SchemeError::InvalidToken(self.code.clone()));
        }
        if self.values.is_empty() {
            return Err(SchemeError::EmptyMetric(self.code.clone()));
        }
        for (i, value) in self.values.iter().enumerate() {
            if value.code == NOT_DEFINED {
                return Err(SchemeError::ReservedValue(self.code.clone()));
            }
            if !is_value_token(&value.code) {
                return Err(SchemeError::InvalidToken(value.code.clone()));
            }
            if self.values[..i].iter().any(|v| v.code == value.code) {
                return Err(SchemeError::DuplicateValueCode {
                    metric: self.code.clone(),
                    value: value.code.clone(),
                });
            }
        }
        if optional && self.not_defined.is_none() {
            return Err(SchemeError::MissingNotDefined(self.code.clone()));
        }
        Ok(())
    }
}

/// Named, ordered collection of metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricGroup {
    pub name: String,
    pub element: String,
    /// Mandatory groups must be complete; optional ones default to [`NOT_DEFINED`]
    pub mandatory: bool,
    pub score: ScoreKind,
    pub metrics: Vec<Metric>,
}

impl MetricGroup {
    pub fn mandatory(name: &str, element: &str, score: ScoreKind, metrics: Vec<Metric>) -> Self {
        MetricGroup {
            name: name.to_string(),
            element: element.to_string(),
            mandatory: true,
            score,
            metrics,
        }
    }

    pub fn optional(name: &str, element: &str, score: ScoreKind, metrics: Vec<Metric>) -> Self {
        MetricGroup {
            mandatory: false,
            ..MetricGroup::mandatory(name, element, score, metrics)
        }
    }
}

/// Read-only registry of every metric a scheme knows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    name: String,
    prefix: String,
    groups: Vec<MetricGroup>,
}

impl Schema {
    /// Build a schema, rejecting inconsistent definitions
    pub fn new(name: &str, prefix: &str, groups: Vec<MetricGroup>) -> Result<Self, SchemeError> {
        let schema = Schema {
            name: name.to_string(),
            prefix: prefix.to_string(),
            groups,
        };
        schema.check()?;
        Ok(schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version literal every vector string starts with
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn groups(&self) -> &[MetricGroup] {
        &self.groups
    }

    /// All metrics in declaration order
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.groups.iter().flat_map(|g| g.metrics.iter())
    }

    pub fn mandatory_metrics(&self) -> impl Iterator<Item = &Metric> {
        self.groups
            .iter()
            .filter(|g| g.mandatory)
            .flat_map(|g| g.metrics.iter())
    }

    pub fn get(&self, code: &str) -> Option<&Metric> {
        self.metrics().find(|m| m.code == code)
    }

    /// Look up a metric the caller knows exists
    ///
    /// # Panics
    ///
    /// Panics on an unknown code. Internal references are checked when the
    /// scheme is built, so reaching this panic means the schema data is wrong.
    pub fn metric(&self, code: &str) -> &Metric {
        self.get(code)
            .unwrap_or_else(|| panic!("unknown metric identifier `{code}` in schema `{}`", self.name))
    }

    pub fn group_of(&self, code: &str) -> Option<&MetricGroup> {
        self.groups
            .iter()
            .find(|g| g.metrics.iter().any(|m| m.code == code))
    }

    pub fn is_mandatory(&self, code: &str) -> bool {
        self.group_of(code).is_some_and(|g| g.mandatory)
    }

    fn check(&self) -> Result<(), SchemeError> {
        if !self.groups.iter().any(|g| g.mandatory) {
            return Err(SchemeError::NoMandatoryGroup(self.name.clone()));
        }

        let mut seen: Vec<&str> = Vec::new();
        for group in &self.groups {
            for metric in &group.metrics {
                if seen.contains(&metric.code.as_str()) {
                    return Err(SchemeError::DuplicateMetricCode(metric.code.clone()));
                }
                seen.push(&metric.code);
                metric.check(!group.mandatory)?;
            }
        }

        for metric in self.metrics() {
            if let Some(NotDefined::Inherit(target)) = &metric.not_defined {
                self.check_inheritance(metric, target)?;
            }
        }

        Ok(())
    }

    fn check_inheritance(&self, metric: &Metric, target: &str) -> Result<(), SchemeError> {
        let invalid = |reason: &str| SchemeError::InvalidInheritance {
            metric: metric.code.clone(),
            target: target.to_string(),
            reason: reason.to_string(),
        };

        let base = self.get(target).ok_or_else(|| invalid("no such metric"))?;
        if !self.is_mandatory(target) {
            return Err(invalid("target is not mandatory"));
        }
        // Fallback weights are read from the inheriting metric's own table.
        if let Some(missing) = base.values.iter().find(|v| metric.get(&v.code).is_none()) {
            return Err(invalid(&format!("value `{}` has no weight", missing.code)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_group() -> MetricGroup {
        MetricGroup::mandatory(
            "Base",
            "base_metrics",
            ScoreKind::Base,
            vec![Metric::new("AV", "Attack Vector", "attack-vector")
                .value("N", "NETWORK", 0.85)
                .value("L", "LOCAL", 0.55)],
        )
    }

    #[test]
    fn test_weight_resolve_by_scope() {
        let w = Weight::ScopeDependent {
            unchanged: 0.62,
            changed: 0.68,
        };
        assert_eq!(w.resolve(false), 0.62);
        assert_eq!(w.resolve(true), 0.68);
        assert_eq!(Weight::Fixed(0.5).resolve(true), 0.5);
    }

    #[test]
    fn test_lookup_in_declaration_order() {
        let schema = Schema::new(
            "demo",
            "DEMO:1",
            vec![
                base_group(),
                MetricGroup::optional(
                    "Env",
                    "environmental_metrics",
                    ScoreKind::Environmental,
                    vec![Metric::new("MAV", "Modified Attack Vector", "modified-attack-vector")
                        .value("N", "NETWORK", 0.85)
                        .value("L", "LOCAL", 0.55)
                        .inherits("AV")],
                ),
            ],
        )
        .unwrap();

        let codes: Vec<&str> = schema.metrics().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, ["AV", "MAV"]);
        assert!(schema.is_mandatory("AV"));
        assert!(!schema.is_mandatory("MAV"));
        assert!(!schema.is_mandatory("ZZ"));
        assert_eq!(schema.metric("MAV").label("X"), Some(NOT_DEFINED_LABEL));
        assert_eq!(schema.metric("AV").label("X"), None);
        assert_eq!(schema.metric("AV").label("L"), Some("LOCAL"));
    }

    #[test]
    #[should_panic(expected = "unknown metric identifier")]
    fn test_unknown_metric_is_a_programming_error() {
        let schema = Schema::new("demo", "DEMO:1", vec![base_group()]).unwrap();
        schema.metric("NOPE");
    }

    #[test]
    fn test_reject_duplicate_metric_code() {
        let mut group = base_group();
        group.metrics.push(group.metrics[0].clone());
        let err = Schema::new("demo", "DEMO:1", vec![group]).unwrap_err();
        assert!(matches!(err, SchemeError::DuplicateMetricCode(code) if code == "AV"));
    }

    #[test]
    fn test_reject_reserved_and_malformed_values() {
        let reserved = MetricGroup::mandatory(
            "Base",
            "base",
            ScoreKind::Base,
            vec![Metric::new("A", "A", "a").value("X", "X", 1.0)],
        );
        assert!(matches!(
            Schema::new("demo", "D", vec![reserved]),
            Err(SchemeError::ReservedValue(_))
        ));

        let lowercase = MetricGroup::mandatory(
            "Base",
            "base",
            ScoreKind::Base,
            vec![Metric::new("A", "A", "a").value("n", "NONE", 1.0)],
        );
        assert!(matches!(
            Schema::new("demo", "D", vec![lowercase]),
            Err(SchemeError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_reject_optional_metric_without_fallback() {
        let optional = MetricGroup::optional(
            "Temporal",
            "temporal_metrics",
            ScoreKind::Temporal,
            vec![Metric::new("E", "Exploit Code Maturity", "exploit-code-maturity")
                .value("U", "UNPROVEN", 0.91)],
        );
        let err = Schema::new("demo", "D", vec![base_group(), optional]).unwrap_err();
        assert!(matches!(err, SchemeError::MissingNotDefined(code) if code == "E"));
    }

    #[test]
    fn test_reject_inheritance_with_missing_weights() {
        let optional = MetricGroup::optional(
            "Env",
            "env",
            ScoreKind::Environmental,
            vec![Metric::new("MAV", "Modified Attack Vector", "modified-attack-vector")
                .value("N", "NETWORK", 0.85)
                .inherits("AV")],
        );
        let err = Schema::new("demo", "D", vec![base_group(), optional]).unwrap_err();
        assert!(matches!(err, SchemeError::InvalidInheritance { .. }));
    }

    #[test]
    fn test_reject_schema_without_mandatory_group() {
        let optional = MetricGroup::optional(
            "Temporal",
            "temporal",
            ScoreKind::Temporal,
            vec![Metric::new("E", "E", "e")
                .value("U", "UNPROVEN", 0.91)
                .neutral_when_undefined(1.0)],
        );
        assert!(matches!(
            Schema::new("demo", "D", vec![optional]),
            Err(SchemeError::NoMandatoryGroup(_))
        ));
    }
}
