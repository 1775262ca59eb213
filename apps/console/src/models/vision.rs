use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Confidence strictly above this is shown as high.
pub const HIGH_CONFIDENCE: f64 = 90.0;

/// One field pulled out of a document, with the model's confidence on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionField {
    pub field: String,
    #[serde(deserialize_with = "display_string")]
    pub value: String,
    pub confidence: f64,
}

impl VisionField {
    pub fn is_high_confidence(&self) -> bool {
        self.confidence > HIGH_CONFIDENCE
    }
}

/// Result of a vision upload: the detected document type and its fields in server order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionExtraction {
    pub doc_type: String,
    pub fields: Vec<VisionField>,
}

/// Entry in the session's list of documents processed so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedDocument {
    pub name: String,
    pub doc_type: String,
    pub field_count: usize,
}

impl ProcessedDocument {
    pub fn from_extraction(name: impl Into<String>, extraction: &VisionExtraction) -> Self {
        Self {
            name: name.into(),
            doc_type: extraction.doc_type.clone(),
            field_count: extraction.fields.len(),
        }
    }
}

/// Vision models occasionally return numbers or booleans as field values.
fn display_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
