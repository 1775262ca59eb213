use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::VisionField;

const BUILTIN_FIXTURES: &str = include_str!("../../fixtures/stub.json");

/// Canned payloads the stub backend answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixtures {
    /// Parsed hiring preferences returned for every intake.
    pub intake: Map<String, Value>,
    pub vision: VisionFixture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionFixture {
    /// Document type used when the filename gives no hint.
    pub doc_type: String,
    pub fields: Vec<VisionField>,
}

impl Fixtures {
    /// Fixtures shipped in `fixtures/stub.json`.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        serde_json::from_str(BUILTIN_FIXTURES)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading fixtures from {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing fixtures in {}", path.display()))
    }

    /// Confidence the extractor reported inside the payload, if any.
    pub fn intake_confidence(&self) -> Option<f64> {
        self.intake.get("_confidence").and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_builtin_fixtures_parse() {
        let fixtures = Fixtures::builtin().unwrap();
        assert_eq!(fixtures.intake.keys().next().map(String::as_str), Some("job_title"));
        assert_eq!(fixtures.intake_confidence(), Some(0.92));
        assert_eq!(fixtures.vision.fields.len(), 8);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"intake": {{"role": "Designer"}}, "vision": {{"doc_type": "Org Chart", "fields": []}}}}"#
        )
        .unwrap();

        let fixtures = Fixtures::load(file.path()).await.unwrap();
        assert_eq!(fixtures.intake_confidence(), None);
        assert_eq!(fixtures.vision.doc_type, "Org Chart");
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        assert!(Fixtures::load(Path::new("/nonexistent/fixtures.json")).await.is_err());
    }
}
