//! Built-in scheme definitions
//!
//! Both schemes are pure data fed through the same constructors any caller
//! could use.

use crate::document::DocumentLayout;
use crate::error::SchemeError;
use crate::scheme::Scheme;
use crate::schema::{Metric, MetricGroup, Schema, ScoreKind};
use crate::score::{ImpactCoefficients, ImpactModel, ImpactRoles, LinearModel, ScoringModel};
use crate::severity::SeverityScale;

const CVSS31_NAMESPACE: &str = "https://www.first.org/cvss/cvss-v3.1.xsd";

/// CVSS v3.1 with base, temporal and environmental groups
pub fn cvss31() -> Result<Scheme, SchemeError> {
    let schema = Schema::new(
        "CVSS v3.1",
        "CVSS:3.1",
        vec![
            MetricGroup::mandatory(
                "Base",
                "base_metrics",
                ScoreKind::Base,
                vec![
                    attack_vector("AV", "Attack Vector", "attack-vector"),
                    attack_complexity("AC", "Attack Complexity", "attack-complexity"),
                    privileges_required("PR", "Privileges Required", "privileges-required"),
                    user_interaction("UI", "User Interaction", "user-interaction"),
                    scope("S", "Scope", "scope"),
                    impact("C", "Confidentiality", "confidentiality-impact"),
                    impact("I", "Integrity", "integrity-impact"),
                    impact("A", "Availability", "availability-impact"),
                ],
            ),
            MetricGroup::optional(
                "Temporal",
                "temporal_metrics",
                ScoreKind::Temporal,
                vec![
                    Metric::new("E", "Exploit Code Maturity", "exploit-code-maturity")
                        .value("U", "UNPROVEN", 0.91)
                        .value("P", "PROOF_OF_CONCEPT", 0.94)
                        .value("F", "FUNCTIONAL", 0.97)
                        .value("H", "HIGH", 1.0)
                        .neutral_when_undefined(1.0),
                    Metric::new("RL", "Remediation Level", "remediation-level")
                        .value("O", "OFFICIAL_FIX", 0.95)
                        .value("T", "TEMPORARY_FIX", 0.96)
                        .value("W", "WORKAROUND", 0.97)
                        .value("U", "UNAVAILABLE", 1.0)
                        .neutral_when_undefined(1.0),
                    Metric::new("RC", "Report Confidence", "report-confidence")
                        .value("U", "UNKNOWN", 0.92)
                        .value("R", "REASONABLE", 0.96)
                        .value("C", "CONFIRMED", 1.0)
                        .neutral_when_undefined(1.0),
                ],
            ),
            MetricGroup::optional(
                "Environmental",
                "environmental_metrics",
                ScoreKind::Environmental,
                vec![
                    requirement("CR", "Confidentiality Requirement", "confidentiality-requirement"),
                    requirement("IR", "Integrity Requirement", "integrity-requirement"),
                    requirement("AR", "Availability Requirement", "availability-requirement"),
                    attack_vector("MAV", "Modified Attack Vector", "modified-attack-vector")
                        .inherits("AV"),
                    attack_complexity(
                        "MAC",
                        "Modified Attack Complexity",
                        "modified-attack-complexity",
                    )
                    .inherits("AC"),
                    privileges_required(
                        "MPR",
                        "Modified Privileges Required",
                        "modified-privileges-required",
                    )
                    .inherits("PR"),
                    user_interaction(
                        "MUI",
                        "Modified User Interaction",
                        "modified-user-interaction",
                    )
                    .inherits("UI"),
                    scope("MS", "Modified Scope", "modified-scope").inherits("S"),
                    impact(
                        "MC",
                        "Modified Confidentiality",
                        "modified-confidentiality-impact",
                    )
                    .inherits("C"),
                    impact("MI", "Modified Integrity", "modified-integrity-impact")
                        .inherits("I"),
                    impact("MA", "Modified Availability", "modified-availability-impact")
                        .inherits("A"),
                ],
            ),
        ],
    )?;

    let model = ScoringModel::ImpactExploitability(ImpactModel {
        base: roles(["AV", "AC", "PR", "UI", "S", "C", "I", "A"]),
        temporal: vec!["E".to_string(), "RL".to_string(), "RC".to_string()],
        requirements: ["CR".to_string(), "IR".to_string(), "AR".to_string()],
        modified: roles(["MAV", "MAC", "MPR", "MUI", "MS", "MC", "MI", "MA"]),
        scope_changed: "C".to_string(),
        coefficients: ImpactCoefficients::cvss31(),
    });

    let severity = SeverityScale::from_upper_bounds([
        ("None", 0.0),
        ("Low", 3.9),
        ("Medium", 6.9),
        ("High", 8.9),
        ("Critical", 10.0),
    ])?;

    let document = DocumentLayout {
        root: "cvssv3.1".to_string(),
        namespace: CVSS31_NAMESPACE.to_string(),
        schema_location: Some(format!("{CVSS31_NAMESPACE} {CVSS31_NAMESPACE}")),
    };

    Scheme::new(schema, model, severity, document)
}

/// Five-level process maturity rating
///
/// Each level is rated on the N/P/L/F attainment scale; the maturity score
/// is the sum of the level ratings.
pub fn reifegrad() -> Result<Scheme, SchemeError> {
    let levels = [
        ("U", "Unvollständig", "incomplete"),
        ("D", "Durchgeführt", "performed"),
        ("G", "Gesteuert", "managed"),
        ("E", "Etabliert", "established"),
        ("V", "Vorhersagbar", "predictable"),
    ];

    let metrics: Vec<Metric> = levels
        .iter()
        .map(|(code, name, element)| {
            Metric::new(code, name, element)
                .value("N", "NOT_ACHIEVED", 0.0)
                .value("P", "PARTIALLY_ACHIEVED", 0.3)
                .value("L", "LARGELY_ACHIEVED", 0.5)
                .value("F", "FULLY_ACHIEVED", 0.8)
        })
        .collect();

    let schema = Schema::new(
        "Reifegrad",
        "Reifegrad",
        vec![MetricGroup::mandatory(
            "Maturity",
            "maturity_metrics",
            ScoreKind::Maturity,
            metrics,
        )],
    )?;

    let model = ScoringModel::Linear(LinearModel {
        kind: ScoreKind::Maturity,
        metrics: levels.iter().map(|(code, _, _)| code.to_string()).collect(),
        max_score: 4.0,
    });

    let severity = SeverityScale::from_upper_bounds([
        ("Unvollständig", 0.0),
        ("Durchgeführt", 1.0),
        ("Gesteuert", 2.0),
        ("Etabliert", 3.0),
        ("Vorhersagbar", 4.0),
    ])?;

    let document = DocumentLayout {
        root: "reifegrad".to_string(),
        namespace: "urn:vectorscore:reifegrad:1.0".to_string(),
        schema_location: None,
    };

    Scheme::new(schema, model, severity, document)
}

fn roles(codes: [&str; 8]) -> ImpactRoles {
    let [av, ac, pr, ui, s, c, i, a] = codes.map(str::to_string);
    ImpactRoles {
        attack_vector: av,
        attack_complexity: ac,
        privileges_required: pr,
        user_interaction: ui,
        scope: s,
        confidentiality: c,
        integrity: i,
        availability: a,
    }
}

fn attack_vector(code: &str, name: &str, element: &str) -> Metric {
    Metric::new(code, name, element)
        .value("N", "NETWORK", 0.85)
        .value("A", "ADJACENT_NETWORK", 0.62)
        .value("L", "LOCAL", 0.55)
        .value("P", "PHYSICAL", 0.2)
}

fn attack_complexity(code: &str, name: &str, element: &str) -> Metric {
    Metric::new(code, name, element)
        .value("H", "HIGH", 0.44)
        .value("L", "LOW", 0.77)
}

fn privileges_required(code: &str, name: &str, element: &str) -> Metric {
    Metric::new(code, name, element)
        .scoped_value("N", "NONE", 0.85, 0.85)
        .scoped_value("L", "LOW", 0.62, 0.68)
        .scoped_value("H", "HIGH", 0.27, 0.5)
}

fn user_interaction(code: &str, name: &str, element: &str) -> Metric {
    Metric::new(code, name, element)
        .value("N", "NONE", 0.85)
        .value("R", "REQUIRED", 0.62)
}

/// Scope weights double as the impact factor
fn scope(code: &str, name: &str, element: &str) -> Metric {
    Metric::new(code, name, element)
        .value("U", "UNCHANGED", 6.42)
        .value("C", "CHANGED", 7.52)
}

fn impact(code: &str, name: &str, element: &str) -> Metric {
    Metric::new(code, name, element)
        .value("N", "NONE", 0.0)
        .value("L", "LOW", 0.22)
        .value("H", "HIGH", 0.56)
}

fn requirement(code: &str, name: &str, element: &str) -> Metric {
    Metric::new(code, name, element)
        .value("L", "LOW", 0.5)
        .value("M", "MEDIUM", 1.0)
        .value("H", "HIGH", 1.5)
        .neutral_when_undefined(1.0)
}
