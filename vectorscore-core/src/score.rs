//! Score calculation
//!
//! Global invariants enforced:
//! - Deterministic: same schema and values always produce the same scores
//! - Every score is finite and within `[0, max]`
//! - Rounding goes through integer arithmetic so binary representation error
//!   never pushes a score up a tenth (4.000000000000001 rounds to 4.0)
//!
//! Calculation never fails. It expects values that already passed
//! validation; anything else is a programming error and panics.

use crate::schema::{Metric, NotDefined, ScoreKind, Schema, NOT_DEFINED};
use crate::values::MetricValues;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Round up to one decimal place
///
/// The input is first rounded to five decimals, so values that are a tenth
/// plus float noise stay on that tenth.
pub fn round_up_1(x: f64) -> f64 {
    let i = (x * 100_000.0).round() as i64;
    if i % 10_000 == 0 {
        i as f64 / 100_000.0
    } else {
        (i.div_euclid(10_000) + 1) as f64 / 10.0
    }
}

/// Intermediate formula value exposed next to the final scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub name: String,
    pub value: f64,
}

impl SubScore {
    fn new(name: &str, value: f64) -> Self {
        SubScore {
            name: name.to_string(),
            value,
        }
    }
}

/// Output of a scoring model
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    /// Rounded scores, in the order the model defines them
    pub scores: Vec<(ScoreKind, f64)>,
    pub sub_scores: Vec<SubScore>,
}

/// How metric weights combine into scores
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ScoringModel {
    Linear(LinearModel),
    ImpactExploitability(ImpactModel),
}

impl ScoringModel {
    /// Upper bound of every score this model produces
    pub fn max_score(&self) -> f64 {
        match self {
            ScoringModel::Linear(model) => model.max_score,
            ScoringModel::ImpactExploitability(model) => model.coefficients.max_score,
        }
    }

    /// Metric codes the model reads
    pub fn referenced_metrics(&self) -> Vec<&str> {
        match self {
            ScoringModel::Linear(model) => model.metrics.iter().map(String::as_str).collect(),
            ScoringModel::ImpactExploitability(model) => model.referenced_metrics(),
        }
    }

    pub fn compute(&self, schema: &Schema, values: &MetricValues) -> Calculation {
        let selection = Selection { schema, values };
        let calculation = match self {
            ScoringModel::Linear(model) => model.compute(&selection),
            ScoringModel::ImpactExploitability(model) => model.compute(&selection),
        };
        for sub in &calculation.sub_scores {
            trace!(name = %sub.name, value = sub.value, "sub-score");
        }
        calculation
    }
}

/// Capped sum of metric weights, reported as a single score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearModel {
    pub kind: ScoreKind,
    pub metrics: Vec<String>,
    pub max_score: f64,
}

impl LinearModel {
    fn compute(&self, selection: &Selection<'_>) -> Calculation {
        let mut sub_scores = Vec::with_capacity(self.metrics.len());
        let mut total = 0.0;
        for code in &self.metrics {
            let weight = selection.weight(code, false);
            sub_scores.push(SubScore::new(code, weight));
            total += weight;
        }

        Calculation {
            scores: vec![(self.kind, round_up_1(total.min(self.max_score)))],
            sub_scores,
        }
    }
}

/// Metric codes filling each role of the impact/exploitability formulas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRoles {
    pub attack_vector: String,
    pub attack_complexity: String,
    pub privileges_required: String,
    pub user_interaction: String,
    pub scope: String,
    pub confidentiality: String,
    pub integrity: String,
    pub availability: String,
}

impl ImpactRoles {
    fn codes(&self) -> [&str; 8] {
        [
            self.attack_vector.as_str(),
            self.attack_complexity.as_str(),
            self.privileges_required.as_str(),
            self.user_interaction.as_str(),
            self.scope.as_str(),
            self.confidentiality.as_str(),
            self.integrity.as_str(),
            self.availability.as_str(),
        ]
    }
}

/// Numeric constants of the impact/exploitability formulas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactCoefficients {
    pub exploitability: f64,
    /// Multiplier on impact plus exploitability when scope is changed
    pub scope_changed_factor: f64,
    pub max_score: f64,
    /// Upper bound of the modified impact sub-score
    pub miss_cap: f64,
    pub changed_offset: f64,
    pub changed_penalty: f64,
    pub changed_shift: f64,
    pub base_changed_exponent: i32,
    pub modified_changed_exponent: i32,
    pub modified_changed_scale: f64,
}

impl ImpactCoefficients {
    /// Constants of CVSS v3.1
    pub fn cvss31() -> Self {
        ImpactCoefficients {
            exploitability: 8.22,
            scope_changed_factor: 1.08,
            max_score: 10.0,
            miss_cap: 0.915,
            changed_offset: 0.029,
            changed_penalty: 3.25,
            changed_shift: 0.02,
            base_changed_exponent: 15,
            modified_changed_exponent: 13,
            modified_changed_scale: 0.9731,
        }
    }
}

/// Base, temporal and environmental scores built from impact and
/// exploitability sub-formulas
///
/// The impact factor for each scope comes from the scope metric's weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactModel {
    pub base: ImpactRoles,
    /// Multipliers applied to the base score (E, RL, RC)
    pub temporal: Vec<String>,
    /// Security requirements, in confidentiality/integrity/availability order
    pub requirements: [String; 3],
    pub modified: ImpactRoles,
    /// Scope value code meaning "changed"
    pub scope_changed: String,
    pub coefficients: ImpactCoefficients,
}

impl ImpactModel {
    fn referenced_metrics(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.base.codes().to_vec();
        codes.extend(self.temporal.iter().map(String::as_str));
        codes.extend(self.requirements.iter().map(String::as_str));
        codes.extend(self.modified.codes());
        codes
    }

    fn compute(&self, selection: &Selection<'_>) -> Calculation {
        let k = &self.coefficients;

        // Base
        let changed = selection.value(&self.base.scope) == self.scope_changed;
        let scope_weight = selection.weight(&self.base.scope, changed);
        let iss = 1.0
            - (1.0 - selection.weight(&self.base.confidentiality, changed))
                * (1.0 - selection.weight(&self.base.integrity, changed))
                * (1.0 - selection.weight(&self.base.availability, changed));
        let impact = if changed {
            scope_weight * (iss - k.changed_offset)
                - k.changed_penalty * (iss - k.changed_shift).powi(k.base_changed_exponent)
        } else {
            scope_weight * iss
        };
        let exploitability = self.exploitability(selection, &self.base, changed);
        let base = self.combine(impact, exploitability, changed);

        // Temporal
        let temporal_factor: f64 = self
            .temporal
            .iter()
            .map(|code| selection.weight(code, changed))
            .product();
        let temporal = round_up_1(base * temporal_factor);

        // Environmental
        let m = &self.modified;
        let m_changed = selection.value(&m.scope) == self.scope_changed;
        let m_scope_weight = selection.weight(&m.scope, m_changed);
        let [cr, ir, ar] = &self.requirements;
        let weighted = |impact: &str, requirement: &str| {
            selection.weight(impact, m_changed) * selection.weight(requirement, m_changed)
        };
        let miss = (1.0
            - (1.0 - weighted(m.confidentiality.as_str(), cr.as_str()))
                * (1.0 - weighted(m.integrity.as_str(), ir.as_str()))
                * (1.0 - weighted(m.availability.as_str(), ar.as_str())))
            .min(k.miss_cap);
        let modified_impact = if m_changed {
            m_scope_weight * (miss - k.changed_offset)
                - k.changed_penalty
                    * (miss * k.modified_changed_scale - k.changed_shift)
                        .powi(k.modified_changed_exponent)
        } else {
            m_scope_weight * miss
        };
        let modified_exploitability = self.exploitability(selection, m, m_changed);
        let environmental = round_up_1(
            self.combine(modified_impact, modified_exploitability, m_changed) * temporal_factor,
        );

        Calculation {
            scores: vec![
                (ScoreKind::Base, base),
                (ScoreKind::Temporal, temporal),
                (ScoreKind::Environmental, environmental),
            ],
            sub_scores: vec![
                SubScore::new("base_iss", iss),
                SubScore::new("base_impact", impact),
                SubScore::new("base_exploitability", exploitability),
                SubScore::new("environmental_miss", miss),
                SubScore::new("environmental_modified_impact", modified_impact),
                SubScore::new(
                    "environmental_modified_exploitability",
                    modified_exploitability,
                ),
            ],
        }
    }

    fn exploitability(&self, selection: &Selection<'_>, roles: &ImpactRoles, changed: bool) -> f64 {
        self.coefficients.exploitability
            * selection.weight(&roles.attack_vector, changed)
            * selection.weight(&roles.attack_complexity, changed)
            * selection.weight(&roles.privileges_required, changed)
            * selection.weight(&roles.user_interaction, changed)
    }

    /// Rounded, capped sum of impact and exploitability; zero without impact
    fn combine(&self, impact: f64, exploitability: f64, changed: bool) -> f64 {
        if impact <= 0.0 {
            return 0.0;
        }
        let factor = if changed {
            self.coefficients.scope_changed_factor
        } else {
            1.0
        };
        round_up_1((factor * (impact + exploitability)).min(self.coefficients.max_score))
    }
}

/// Weight lookup over validated values
struct Selection<'a> {
    schema: &'a Schema,
    values: &'a MetricValues,
}

impl Selection<'_> {
    /// Selected value code after resolving inheritance; absent means not defined
    fn value(&self, code: &str) -> &str {
        let raw = self.raw(code);
        if raw != NOT_DEFINED {
            return raw;
        }
        match &self.schema.metric(code).not_defined {
            Some(NotDefined::Inherit(target)) => self.raw(target),
            _ => raw,
        }
    }

    fn raw(&self, code: &str) -> &str {
        self.values
            .get(code)
            .filter(|v| !v.is_empty())
            .unwrap_or(NOT_DEFINED)
    }

    fn weight(&self, code: &str, scope_changed: bool) -> f64 {
        let metric: &Metric = self.schema.metric(code);
        let value = self.value(code);
        if value == NOT_DEFINED {
            return match metric.not_defined {
                Some(NotDefined::Neutral(weight)) => weight,
                _ => panic!("metric `{code}` has no value and no neutral weight"),
            };
        }
        match metric.get(value) {
            Some(v) => v.weight.resolve(scope_changed),
            None => panic!("metric `{code}` has unvalidated value `{value}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    fn cvss(vector: &str) -> Calculation {
        let scheme = builtin::cvss31().unwrap();
        let values = scheme.decode(vector).unwrap();
        scheme.model().compute(scheme.schema(), &values)
    }

    fn score_of(calc: &Calculation, kind: ScoreKind) -> f64 {
        calc.scores
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| *v)
            .unwrap()
    }

    fn sub_of(calc: &Calculation, name: &str) -> f64 {
        calc.sub_scores
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value)
            .unwrap()
    }

    #[test]
    fn test_round_up_1_exact_tenths() {
        assert_eq!(round_up_1(0.0), 0.0);
        assert_eq!(round_up_1(4.0), 4.0);
        assert_eq!(round_up_1(4.000000000000001), 4.0);
        assert_eq!(round_up_1(4.02), 4.1);
        assert_eq!(round_up_1(4.1), 4.1);
        assert_eq!(round_up_1(9.76), 9.8);
        assert_eq!(round_up_1(10.0), 10.0);
    }

    #[test]
    fn test_base_critical() {
        let calc = cvss("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H");
        assert_eq!(score_of(&calc, ScoreKind::Base), 9.8);
        assert_eq!(score_of(&calc, ScoreKind::Temporal), 9.8);
        assert_eq!(score_of(&calc, ScoreKind::Environmental), 9.8);
        assert!((sub_of(&calc, "base_iss") - 0.914816).abs() < 1e-9);
    }

    #[test]
    fn test_scope_changed_uses_changed_weights() {
        let calc = cvss("CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:C/C:L/I:L/A:N");
        assert_eq!(score_of(&calc, ScoreKind::Base), 6.1);

        let calc = cvss("CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:U/C:L/I:L/A:N");
        assert_eq!(score_of(&calc, ScoreKind::Base), 5.4);
    }

    #[test]
    fn test_no_impact_scores_zero() {
        let calc = cvss("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:N/I:N/A:N");
        assert_eq!(score_of(&calc, ScoreKind::Base), 0.0);
        assert_eq!(score_of(&calc, ScoreKind::Temporal), 0.0);
        assert_eq!(score_of(&calc, ScoreKind::Environmental), 0.0);
    }

    #[test]
    fn test_temporal_multipliers() {
        let calc = cvss("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/E:U/RL:O/RC:U");
        assert_eq!(score_of(&calc, ScoreKind::Base), 9.8);
        assert_eq!(score_of(&calc, ScoreKind::Temporal), 7.8);
    }

    #[test]
    fn test_modified_metrics_inherit_base_values() {
        let plain = cvss("CVSS:3.1/AV:L/AC:L/PR:L/UI:N/S:U/C:H/I:H/A:H");
        let explicit = cvss(
            "CVSS:3.1/AV:L/AC:L/PR:L/UI:N/S:U/C:H/I:H/A:H/MAV:L/MAC:L/MPR:L/MUI:N/MS:U/MC:H/MI:H/MA:H",
        );
        assert_eq!(
            score_of(&plain, ScoreKind::Environmental),
            score_of(&explicit, ScoreKind::Environmental)
        );
        assert_eq!(score_of(&plain, ScoreKind::Environmental), 7.8);
    }

    #[test]
    fn test_miss_is_capped() {
        let calc = cvss("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/CR:H/IR:H/AR:H");
        assert_eq!(sub_of(&calc, "environmental_miss"), 0.915);
        assert_eq!(score_of(&calc, ScoreKind::Environmental), 9.8);
    }

    #[test]
    fn test_modified_scope_changed() {
        let calc = cvss("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/MS:C");
        assert_eq!(score_of(&calc, ScoreKind::Base), 9.8);
        assert_eq!(score_of(&calc, ScoreKind::Environmental), 10.0);
    }

    #[test]
    fn test_linear_model_sums_weights() {
        let scheme = builtin::reifegrad().unwrap();
        let values = scheme.decode("Reifegrad/U:F/D:F/G:L/E:N/V:N").unwrap();
        let calc = scheme.model().compute(scheme.schema(), &values);
        assert_eq!(calc.scores, vec![(ScoreKind::Maturity, 2.1)]);
        assert_eq!(calc.sub_scores.len(), 5);
        assert_eq!(calc.sub_scores[0], SubScore::new("U", 0.8));
    }

    #[test]
    fn test_referenced_metrics_cover_every_role() {
        let scheme = builtin::cvss31().unwrap();
        let codes = scheme.model().referenced_metrics();
        assert_eq!(codes.len(), 22);
        assert!(codes.contains(&"MPR"));
        assert!(codes.contains(&"RC"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_up_1_is_monotonic(a in 0.0..10.0f64, b in 0.0..10.0f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            assert!(round_up_1(lo) <= round_up_1(hi));
        }

        #[test]
        fn round_up_1_lands_on_a_tenth(x in 0.0..10.0f64) {
            let r = round_up_1(x);
            assert_eq!((r * 10.0).round() / 10.0, r);
            assert!(r >= x - 1e-5);
            assert!(r - x < 0.1 + 1e-9);
        }

        #[test]
        fn round_up_1_keeps_exact_tenths(t in 0u32..=100) {
            let x = t as f64 / 10.0;
            assert_eq!(round_up_1(x), x);
        }
    }
}
