use serde::Serialize;

use crate::models::{ExtractionResult, FieldValue, Scalar, VisionField};

/// Keys starting with this are internal metadata and hidden at the top level.
const RESERVED_PREFIX: char = '_';

/// Display tree produced from a `FieldValue`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rendered {
    Text(String),
    Sequence(Vec<Rendered>),
    Fields(Vec<RenderedField>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    pub label: String,
    pub value: Rendered,
}

/// One row of a vision extraction, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionRow {
    pub field: String,
    pub value: String,
    pub confidence: String,
    pub high_confidence: bool,
}

/// Replaces underscores with spaces. No other normalization is applied.
pub fn humanize(key: &str) -> String {
    key.replace('_', " ")
}

pub fn render_leaf(scalar: &Scalar) -> String {
    scalar.to_string()
}

pub fn render(value: &FieldValue) -> Rendered {
    match value {
        FieldValue::List(items) => Rendered::Sequence(items.iter().map(render).collect()),
        FieldValue::Nested(inner) => Rendered::Fields(render_fields(inner, false)),
        FieldValue::Scalar(scalar) => Rendered::Text(render_leaf(scalar)),
    }
}

/// Renders a whole extraction result, dropping reserved top-level keys.
pub fn render_result(result: &ExtractionResult) -> Vec<RenderedField> {
    render_fields(result, true)
}

fn render_fields(result: &ExtractionResult, hide_reserved: bool) -> Vec<RenderedField> {
    result
        .iter()
        .filter(|(key, _)| !(hide_reserved && key.starts_with(RESERVED_PREFIX)))
        .map(|(key, value)| RenderedField {
            label: humanize(key),
            value: render(value),
        })
        .collect()
}

pub fn render_vision(fields: &[VisionField]) -> Vec<VisionRow> {
    fields
        .iter()
        .map(|f| VisionRow {
            field: f.field.clone(),
            value: f.value.clone(),
            confidence: f.confidence.to_string(),
            high_confidence: f.is_high_confidence(),
        })
        .collect()
}
