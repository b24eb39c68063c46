//! XML document export
//!
//! Documents are assembled with a small element writer rather than by
//! filling a text template, so every metric and score goes through the same
//! escaping and indentation.

use crate::error::ValidationError;
use crate::report::Score;
use crate::schema::{Schema, NOT_DEFINED};
use crate::values::MetricValues;
use serde::Serialize;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Severity text for a score outside every band
pub const UNDEFINED_SEVERITY: &str = "undefined";

/// Root element naming for a scheme's documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub root: String,
    pub namespace: String,
    /// Value of `xsi:schemaLocation`, if the scheme publishes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_location: Option<String>,
}

/// Render validated values and their scores as an XML document
///
/// Optional metrics without a value render as `NOT_DEFINED`. A metric whose
/// value has no display label is reported as an illegal value.
pub fn render(
    layout: &DocumentLayout,
    schema: &Schema,
    values: &MetricValues,
    scores: &[Score],
) -> Result<String, ValidationError> {
    let mut unlabelled: Vec<String> = Vec::new();
    let mut xml = XmlWriter::new();
    xml.open_root(layout);

    for group in schema.groups() {
        xml.blank_line();
        xml.open(&group.element);

        for metric in &group.metrics {
            let value = values
                .get(&metric.code)
                .filter(|v| !v.is_empty())
                .unwrap_or(NOT_DEFINED);
            match metric.label(value) {
                Some(label) => xml.leaf(&metric.element, label),
                None => unlabelled.push(metric.code.clone()),
            }
        }

        if let Some(score) = scores.iter().find(|s| s.kind == group.score) {
            let kind = group.score.as_str();
            xml.leaf(&format!("{kind}-score"), &format!("{:.1}", score.value));
            xml.leaf(
                &format!("{kind}-severity"),
                score.severity.as_deref().unwrap_or(UNDEFINED_SEVERITY),
            );
        }

        xml.close(&group.element);
    }

    if !unlabelled.is_empty() {
        return Err(ValidationError::IllegalValue {
            metrics: unlabelled,
        });
    }

    xml.blank_line();
    Ok(xml.finish(&layout.root))
}

/// Indenting element writer
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        let mut out = String::with_capacity(2048);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        XmlWriter { out, depth: 0 }
    }

    fn open_root(&mut self, layout: &DocumentLayout) {
        let namespace = xml_escape(&layout.namespace);
        match &layout.schema_location {
            Some(location) => {
                self.out.push_str(&format!(
                    "<{root} xmlns=\"{namespace}\"\n  xmlns:xsi=\"{XSI_NAMESPACE}\"\n  xsi:schemaLocation=\"{location}\"\n  >\n",
                    root = layout.root,
                    location = xml_escape(location),
                ));
            }
            None => {
                self.out
                    .push_str(&format!("<{} xmlns=\"{namespace}\">\n", layout.root));
            }
        }
        self.depth = 1;
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn open(&mut self, name: &str) {
        self.indent();
        self.out.push_str(&format!("<{name}>\n"));
        self.depth += 1;
    }

    fn leaf(&mut self, name: &str, text: &str) {
        self.indent();
        self.out
            .push_str(&format!("<{name}>{}</{name}>\n", xml_escape(text)));
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str(&format!("</{name}>\n"));
    }

    fn blank_line(&mut self) {
        self.out.push('\n');
    }

    fn finish(mut self, root: &str) -> String {
        self.out.push_str(&format!("</{root}>\n"));
        self.out
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
