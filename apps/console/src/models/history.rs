use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::vision::VisionField;

/// A stored intake submission as returned by `GET /intake/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: u64,
    pub mode: String,
    pub parsed_data: Option<Value>,
    pub confidence: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl IntakeRecord {
    /// Role named in the parsed payload, if the extractor found one.
    pub fn job_title(&self) -> Option<&str> {
        self.parsed_data
            .as_ref()
            .and_then(|d| d.get("job_title"))
            .and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeHistory {
    pub intakes: Vec<IntakeRecord>,
    pub total: usize,
}

/// A processed document as returned by `POST /vision/upload` and `GET /vision/documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: u64,
    pub filename: String,
    pub file_type: String,
    pub doc_type: Option<String>,
    pub extracted_fields: Option<Vec<VisionField>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentRecord>,
    pub total: usize,
}
