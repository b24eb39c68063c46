//! Two-pass validation of metric values against a schema
//!
//! Pass 1 checks completeness of the mandatory groups, pass 2 checks that
//! every value is legal. Each pass reports every offending metric at once.

use crate::error::ValidationError;
use crate::schema::Schema;
use crate::values::MetricValues;
use tracing::debug;

/// Check metric values against a schema
///
/// Missing mandatory metrics (absent or empty) are reported in schema order.
/// Illegal values are reported in schema order, followed by any metric codes
/// the schema does not know.
pub fn validate(values: &MetricValues, schema: &Schema) -> Result<(), ValidationError> {
    let missing: Vec<String> = schema
        .mandatory_metrics()
        .filter(|m| values.get(&m.code).map_or(true, str::is_empty))
        .map(|m| m.code.clone())
        .collect();

    if !missing.is_empty() {
        debug!(metrics = ?missing, "missing mandatory metrics");
        return Err(ValidationError::MissingMandatoryMetric { metrics: missing });
    }

    let mut illegal: Vec<String> = Vec::new();
    for group in schema.groups() {
        for metric in &group.metrics {
            if let Some(value) = values.get(&metric.code) {
                if !metric.accepts(value, !group.mandatory) {
                    illegal.push(metric.code.clone());
                }
            }
        }
    }
    illegal.extend(
        values
            .iter()
            .filter(|(code, _)| schema.get(code).is_none())
            .map(|(code, _)| code.to_string()),
    );

    if !illegal.is_empty() {
        debug!(metrics = ?illegal, "illegal metric values");
        return Err(ValidationError::IllegalValue { metrics: illegal });
    }

    Ok(())
}
