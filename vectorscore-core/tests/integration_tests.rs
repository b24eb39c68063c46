//! Integration tests - known CVSS v3.1 and Reifegrad scores end to end

use vectorscore_core::schema::ScoreKind;
use vectorscore_core::{
    score_metrics, score_vector, CalculationRecord, ErrorKind, MetricValues, Scheme, SchemeId,
};

fn cvss() -> Scheme {
    Scheme::builtin(SchemeId::Cvss31).unwrap()
}

fn reifegrad() -> Scheme {
    Scheme::builtin(SchemeId::Reifegrad).unwrap()
}

/// Score and severity of one kind for a vector
fn scored(scheme: &Scheme, vector: &str, kind: ScoreKind) -> (f64, String) {
    let result = scheme
        .calculate_from_vector(vector)
        .unwrap_or_else(|e| panic!("{} failed: {}", vector, e));
    let score = result.score(kind).unwrap();
    (score.value, score.severity.clone().unwrap())
}

#[test]
fn test_cvss31_reference_base_scores() {
    let scheme = cvss();
    let cases = [
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H", 9.8, "Critical"),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:H/I:H/A:H", 10.0, "Critical"),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:C/C:L/I:L/A:N", 6.1, "Medium"),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:U/C:L/I:L/A:N", 5.4, "Medium"),
        ("CVSS:3.1/AV:L/AC:L/PR:L/UI:N/S:U/C:H/I:H/A:H", 7.8, "High"),
        ("CVSS:3.1/AV:N/AC:H/PR:N/UI:N/S:U/C:H/I:N/A:N", 5.9, "Medium"),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:N/A:H", 7.5, "High"),
        ("CVSS:3.1/AV:P/AC:H/PR:H/UI:R/S:U/C:L/I:N/A:N", 1.6, "Low"),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:N/A:N", 0.0, "None"),
    ];

    for (vector, score, severity) in cases {
        assert_eq!(
            scored(&scheme, vector, ScoreKind::Base),
            (score, severity.to_string()),
            "{}",
            vector
        );
    }
}

#[test]
fn test_cvss31_reference_temporal_scores() {
    let scheme = cvss();
    let cases = [
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H", 9.8),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/E:U/RL:O/RC:U", 7.8),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/E:F/RL:O/RC:C", 9.1),
    ];

    for (vector, score) in cases {
        assert_eq!(scored(&scheme, vector, ScoreKind::Temporal).0, score, "{}", vector);
    }
}

#[test]
fn test_cvss31_reference_environmental_scores() {
    let scheme = cvss();
    let cases = [
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H", 9.8),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/MS:C", 10.0),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/CR:H/IR:H/AR:H", 9.8),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/E:F/RL:O/RC:C/MAV:L", 7.8),
        ("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/MC:N/MI:N/MA:N", 0.0),
    ];

    for (vector, score) in cases {
        assert_eq!(
            scored(&scheme, vector, ScoreKind::Environmental).0,
            score,
            "{}",
            vector
        );
    }
}

#[test]
fn test_reifegrad_reference_scores() {
    let scheme = reifegrad();
    let cases = [
        ("Reifegrad/U:N/D:N/G:N/E:N/V:N", 0.0, "Unvollständig"),
        ("Reifegrad/U:F/D:N/G:N/E:N/V:N", 0.8, "Durchgeführt"),
        ("Reifegrad/U:F/D:F/G:N/E:N/V:N", 1.6, "Gesteuert"),
        ("Reifegrad/U:F/D:F/G:L/E:N/V:N", 2.1, "Etabliert"),
        ("Reifegrad/U:F/D:F/G:F/E:F/V:F", 4.0, "Vorhersagbar"),
    ];

    for (vector, score, severity) in cases {
        assert_eq!(
            scored(&scheme, vector, ScoreKind::Maturity),
            (score, severity.to_string()),
            "{}",
            vector
        );
    }
}

#[test]
fn test_discrete_and_vector_inputs_agree() {
    let scheme = cvss();
    let inputs = [
        Some("N"),
        Some("L"),
        Some("N"),
        Some("R"),
        Some("C"),
        Some("L"),
        Some("L"),
        Some("N"),
    ];
    let values = MetricValues::from_ordered(scheme.schema(), &inputs);
    let from_metrics = scheme.calculate_from_metrics(&values).unwrap();
    let from_vector = scheme
        .calculate_from_vector("CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:C/C:L/I:L/A:N")
        .unwrap();
    assert_eq!(from_metrics, from_vector);
}

#[test]
fn test_success_record_shape() {
    let record = score_vector(&cvss(), "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H");
    let json: serde_json::Value =
        serde_json::from_str(&vectorscore_core::render_json(&record)).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(
        json["vector_string"],
        "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"
    );
    assert_eq!(json["scores"][0]["kind"], "base");
    assert_eq!(json["scores"][0]["score"], "9.8");
    assert_eq!(json["scores"][0]["severity"], "Critical");
    assert_eq!(json["scores"][2]["kind"], "environmental");
    assert_eq!(json["sub_scores"][0]["name"], "base_iss");
}

#[test]
fn test_failure_records_carry_kind_and_metrics() {
    let scheme = cvss();

    let record = score_metrics(&scheme, &MetricValues::new().with("AV", "N"));
    let CalculationRecord::Failure(failure) = record else {
        panic!("expected failure");
    };
    assert_eq!(failure.error_type, ErrorKind::MissingMandatoryMetric);
    assert_eq!(
        failure.error_metrics,
        ["AC", "PR", "UI", "S", "C", "I", "A"]
    );

    let record = score_vector(&scheme, "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/E:Q");
    let CalculationRecord::Failure(failure) = record else {
        panic!("expected failure");
    };
    assert_eq!(failure.error_type, ErrorKind::IllegalValue);
    assert_eq!(failure.error_metrics, ["E"]);
}

#[test]
fn test_cross_scheme_vectors_are_malformed() {
    let err = reifegrad()
        .calculate_from_vector("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedVector);

    let err = cvss()
        .calculate_from_vector("Reifegrad/U:F/D:F/G:L/E:N/V:N")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedVector);
}
