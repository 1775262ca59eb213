//! Intake requests and the schema-less extraction payload they resolve to.

use std::fmt;

use bytes::Bytes;
use serde_json::{Map, Number, Value};

use crate::errors::ValidationError;

/// A single intake submission, validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeRequest {
    TextInput { text: String },
    ImageInput(UploadFile),
}

impl IntakeRequest {
    /// Builds a text request. Whitespace-only text is rejected.
    pub fn text(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(IntakeRequest::TextInput { text })
    }

    pub fn image(file: UploadFile) -> Self {
        IntakeRequest::ImageInput(file)
    }

    /// Short label used in logs and records.
    pub fn mode(&self) -> &'static str {
        match self {
            IntakeRequest::TextInput { .. } => "text",
            IntakeRequest::ImageInput(_) => "image",
        }
    }
}

/// File content picked by the user, with the metadata the multipart encoder needs.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    bytes: Bytes,
    filename: String,
    mime_type: String,
}

impl UploadFile {
    /// Wraps file content. The mime type is derived from the filename extension.
    pub fn new(bytes: impl Into<Bytes>, filename: impl Into<String>) -> Result<Self, ValidationError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }
        let filename = filename.into();
        let mime_type = mime_for(&filename).to_string();
        Ok(Self {
            bytes,
            filename,
            mime_type,
        })
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Lowercased extension of `filename`, or `"unknown"` when there is none.
pub fn file_type(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "unknown".to_string(),
    }
}

pub fn mime_for(filename: &str) -> &'static str {
    match file_type(filename).as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Leaf value of an extraction payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<FieldValue>),
    Nested(ExtractionResult),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => FieldValue::List(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Nested(ExtractionResult::from(map)),
            Value::String(s) => FieldValue::Scalar(Scalar::Text(s)),
            Value::Number(n) => FieldValue::Scalar(Scalar::Number(n)),
            Value::Bool(b) => FieldValue::Scalar(Scalar::Bool(b)),
            Value::Null => FieldValue::Scalar(Scalar::Null),
        }
    }
}

/// Ordered mapping of field name to value, in the order the server sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    entries: Vec<(String, FieldValue)>,
}

impl ExtractionResult {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Map<String, Value>> for ExtractionResult {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect(),
        }
    }
}
