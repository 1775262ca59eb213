//! HTTP client for the pipeline API's intake and vision endpoints.
//!
//! A failed call is logged with its request id and handed back as
//! `RequestError::Unavailable`, whatever the cause. Nothing is retried.

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{DispatchFailure, RequestError};
use crate::models::history::{DocumentList, DocumentRecord, IntakeHistory};
use crate::models::{ExtractionResult, IntakeRequest, UploadFile, VisionExtraction, VisionField};

pub mod voice;

pub use voice::{simulate_voice_input, CANNED_TRANSCRIPT};

const DEFAULT_DOC_TYPE: &str = "Document";

/// The three submissions the intake and vision views can make.
#[async_trait]
pub trait IntakeBackend: Send + Sync {
    /// Submits a free-text hiring description. Blank text is rejected without a request.
    async fn submit_text(&self, text: &str) -> Result<ExtractionResult, RequestError>;

    /// Uploads an image or document for intake parsing.
    async fn submit_image(&self, file: UploadFile) -> Result<ExtractionResult, RequestError>;

    /// Uploads a document for field extraction.
    async fn submit_vision_document(&self, file: UploadFile) -> Result<VisionExtraction, RequestError>;
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    doc_type: Option<String>,
    extracted_fields: Option<Vec<VisionField>>,
}

/// HTTP implementation of `IntakeBackend` against a configured base endpoint.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: Client,
    base: String,
}

impl HttpDispatcher {
    /// Builds a client whose every request is bounded by `config.request_timeout`.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base: config.api_base.clone(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Sends an intake request and normalizes the response into an `ExtractionResult`.
    pub async fn dispatch_intake(&self, request: IntakeRequest) -> Result<ExtractionResult, RequestError> {
        let request_id = Uuid::new_v4();
        let mode = request.mode();
        debug!(%request_id, mode, "dispatching intake request");

        let builder = match request {
            IntakeRequest::TextInput { text } => self
                .client
                .post(self.url("/intake/text"))
                .json(&TextBody { text: &text }),
            IntakeRequest::ImageInput(file) => {
                let form = file_form(file).map_err(|e| unavailable(request_id, "intake", e))?;
                self.client.post(self.url("/intake/image")).multipart(form)
            }
        };

        let result = send_json(builder)
            .await
            .and_then(intake_result)
            .map_err(|e| unavailable(request_id, "intake", e))?;

        if result.is_empty() {
            warn!(%request_id, "intake response carried no fields");
        }
        debug!(%request_id, fields = result.len(), "intake request succeeded");
        Ok(result)
    }

    /// Most recent intakes, newest first.
    pub async fn intake_history(&self, limit: usize) -> Result<IntakeHistory, RequestError> {
        let request_id = Uuid::new_v4();
        let builder = self
            .client
            .get(self.url("/intake/history"))
            .query(&[("limit", limit)]);
        let body = send_json(builder)
            .await
            .map_err(|e| unavailable(request_id, "intake/history", e))?;
        serde_json::from_value(body)
            .map_err(|e| unavailable(request_id, "intake/history", e.into()))
    }

    /// Most recently processed documents, newest first.
    pub async fn list_documents(&self, limit: usize) -> Result<DocumentList, RequestError> {
        let request_id = Uuid::new_v4();
        let builder = self
            .client
            .get(self.url("/vision/documents"))
            .query(&[("limit", limit)]);
        let body = send_json(builder)
            .await
            .map_err(|e| unavailable(request_id, "vision/documents", e))?;
        serde_json::from_value(body)
            .map_err(|e| unavailable(request_id, "vision/documents", e.into()))
    }

    /// A single processed document by id. An unknown id is reported like any other failure.
    pub async fn get_document(&self, id: u64) -> Result<DocumentRecord, RequestError> {
        let request_id = Uuid::new_v4();
        let builder = self.client.get(self.url(&format!("/vision/documents/{id}")));
        let body = send_json(builder)
            .await
            .map_err(|e| unavailable(request_id, "vision/documents/{id}", e))?;
        serde_json::from_value(body)
            .map_err(|e| unavailable(request_id, "vision/documents/{id}", e.into()))
    }
}

#[async_trait]
impl IntakeBackend for HttpDispatcher {
    async fn submit_text(&self, text: &str) -> Result<ExtractionResult, RequestError> {
        let request = IntakeRequest::text(text)?;
        self.dispatch_intake(request).await
    }

    async fn submit_image(&self, file: UploadFile) -> Result<ExtractionResult, RequestError> {
        self.dispatch_intake(IntakeRequest::image(file)).await
    }

    async fn submit_vision_document(&self, file: UploadFile) -> Result<VisionExtraction, RequestError> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, filename = file.filename(), "dispatching vision upload");

        let form = file_form(file).map_err(|e| unavailable(request_id, "vision", e))?;
        let builder = self.client.post(self.url("/vision/upload")).multipart(form);

        let extraction = send_json(builder)
            .await
            .and_then(vision_result)
            .map_err(|e| unavailable(request_id, "vision", e))?;

        debug!(
            %request_id,
            doc_type = %extraction.doc_type,
            fields = extraction.fields.len(),
            "vision upload succeeded"
        );
        Ok(extraction)
    }
}

fn file_form(file: UploadFile) -> Result<multipart::Form, DispatchFailure> {
    let part = multipart::Part::bytes(file.bytes().to_vec())
        .file_name(file.filename().to_string())
        .mime_str(file.mime_type())?;
    Ok(multipart::Form::new().part("file", part))
}

async fn send_json(builder: RequestBuilder) -> Result<Value, DispatchFailure> {
    let response = builder.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DispatchFailure::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Picks the `parsed_data` object when present, otherwise the whole response object.
fn intake_result(body: Value) -> Result<ExtractionResult, DispatchFailure> {
    let mut map = match body {
        Value::Object(map) => map,
        other => {
            return Err(DispatchFailure::Format(format!(
                "intake response is not a JSON object: {other}"
            )))
        }
    };

    let parsed = match map.get_mut("parsed_data") {
        None | Some(Value::Null) => None,
        Some(value @ Value::Object(_)) => Some(value.take()),
        Some(other) => {
            return Err(DispatchFailure::Format(format!(
                "parsed_data is not an object: {other}"
            )))
        }
    };

    match parsed {
        Some(Value::Object(parsed)) => Ok(ExtractionResult::from(parsed)),
        _ => Ok(ExtractionResult::from(map)),
    }
}

fn vision_result(body: Value) -> Result<VisionExtraction, DispatchFailure> {
    let response: VisionResponse = serde_json::from_value(body)?;
    let fields = response
        .extracted_fields
        .ok_or_else(|| DispatchFailure::Format("vision response has no extracted_fields".into()))?;
    Ok(VisionExtraction {
        doc_type: response
            .doc_type
            .unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()),
        fields,
    })
}

fn unavailable(request_id: Uuid, endpoint: &str, failure: DispatchFailure) -> RequestError {
    warn!(%request_id, endpoint, "request failed: {failure}");
    RequestError::from(failure)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::{http::StatusCode, routing::post, Router};
    use serde_json::json;

    use super::*;
    use crate::stub::testing::spawn;
    use crate::stub::{build_router, Fixtures, StubState};

    fn dispatcher_for(addr: SocketAddr) -> HttpDispatcher {
        let config = Config {
            api_base: format!("http://{addr}/api/v1"),
            request_timeout: Duration::from_secs(5),
            stub_port: 0,
            rust_log: "info".into(),
        };
        HttpDispatcher::new(&config).unwrap()
    }

    async fn stub() -> (StubState, HttpDispatcher) {
        let state = StubState::new(Fixtures::builtin().unwrap());
        let addr = spawn(build_router(state.clone())).await;
        (state, dispatcher_for(addr))
    }

    #[test]
    fn test_intake_result_prefers_parsed_data() {
        let result = intake_result(json!({
            "id": 1,
            "parsed_data": {"job_title": "SRE", "skills": ["Go"]},
            "status": "processed"
        }))
        .unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["job_title", "skills"]);
    }

    #[test]
    fn test_intake_result_falls_back_to_whole_body() {
        let result = intake_result(json!({"job_title": "SRE", "parsed_data": null})).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["job_title", "parsed_data"]);

        let result = intake_result(json!({"job_title": "SRE"})).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_intake_result_with_empty_parsed_data() {
        let result = intake_result(json!({"id": 2, "parsed_data": {}})).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_intake_result_rejects_non_objects() {
        assert!(matches!(intake_result(json!(["a"])), Err(DispatchFailure::Format(_))));
        assert!(matches!(
            intake_result(json!({"parsed_data": "oops"})),
            Err(DispatchFailure::Format(_))
        ));
    }

    #[test]
    fn test_vision_result_defaults_doc_type() {
        let extraction = vision_result(json!({
            "extracted_fields": [{"field": "Name", "value": "Jane Doe", "confidence": 96}]
        }))
        .unwrap();
        assert_eq!(extraction.doc_type, "Document");
        assert_eq!(extraction.fields[0].confidence, 96.0);
    }

    #[test]
    fn test_vision_result_requires_fields() {
        assert!(matches!(
            vision_result(json!({"doc_type": "Resume"})),
            Err(DispatchFailure::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_text_issues_exactly_one_call() {
        let (state, dispatcher) = stub().await;

        let result = dispatcher
            .submit_text("Need a senior ML engineer, remote, 5+ years")
            .await
            .unwrap();

        assert_eq!(state.requests_served(), 1);
        let expected: Vec<String> = Fixtures::builtin().unwrap().intake.keys().cloned().collect();
        assert_eq!(result.keys().map(str::to_string).collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn test_blank_text_never_reaches_the_network() {
        let (state, dispatcher) = stub().await;

        let err = dispatcher.submit_text("   ").await.unwrap_err();

        assert!(matches!(err, RequestError::Validation(_)));
        assert_eq!(state.requests_served(), 0);
    }

    #[tokio::test]
    async fn test_submit_image_as_multipart() {
        let (state, dispatcher) = stub().await;
        let file = UploadFile::new(b"\x89PNG fake".to_vec(), "org_chart.png").unwrap();

        let result = dispatcher.submit_image(file).await.unwrap();

        assert!(result.get("job_title").is_some());
        let history = dispatcher.intake_history(10).await.unwrap();
        assert_eq!(history.intakes[0].mode, "image");
        assert_eq!(state.requests_served(), 2);
    }

    #[tokio::test]
    async fn test_voice_falls_back_to_canned_text() {
        let (_, dispatcher) = stub().await;

        simulate_voice_input(&dispatcher).await.unwrap();

        let history = dispatcher.intake_history(1).await.unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.intakes[0].mode, "text");
    }

    #[tokio::test]
    async fn test_vision_upload_round_trip() {
        let (_, dispatcher) = stub().await;
        let file = UploadFile::new(b"%PDF-1.7".to_vec(), "Jane_Resume.pdf").unwrap();

        let extraction = dispatcher.submit_vision_document(file).await.unwrap();

        assert_eq!(extraction.doc_type, "Resume");
        assert_eq!(extraction.fields, Fixtures::builtin().unwrap().vision.fields);

        let documents = dispatcher.list_documents(5).await.unwrap();
        assert_eq!(documents.documents[0].filename, "Jane_Resume.pdf");
        assert_eq!(documents.documents[0].file_type, "pdf");

        let doc = dispatcher.get_document(documents.documents[0].id).await.unwrap();
        assert_eq!(doc.doc_type.as_deref(), Some("Resume"));
    }

    #[tokio::test]
    async fn test_unknown_document_is_unavailable() {
        let (state, dispatcher) = stub().await;

        let err = dispatcher.get_document(99).await.unwrap_err();
        assert_eq!(err, RequestError::Unavailable);
        assert_eq!(state.requests_served(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let router = Router::new().route(
            "/api/v1/intake/text",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let dispatcher = dispatcher_for(spawn(router).await);

        let err = dispatcher.submit_text("hello there, hiring").await.unwrap_err();
        assert_eq!(err, RequestError::Unavailable);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_unavailable() {
        let router = Router::new().route("/api/v1/vision/upload", post(|| async { "<html>nope</html>" }));
        let dispatcher = dispatcher_for(spawn(router).await);
        let file = UploadFile::new(b"bytes".to_vec(), "scan.png").unwrap();

        let err = dispatcher.submit_vision_document(file).await.unwrap_err();
        assert_eq!(err, RequestError::Unavailable);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = dispatcher_for(addr)
            .submit_text("anyone listening?")
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::Unavailable);
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let router = Router::new().route(
            "/api/v1/intake/text",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let addr = spawn(router).await;
        let config = Config {
            api_base: format!("http://{addr}/api/v1"),
            request_timeout: Duration::from_millis(200),
            stub_port: 0,
            rust_log: "info".into(),
        };
        let dispatcher = HttpDispatcher::new(&config).unwrap();

        let err = dispatcher.submit_text("waiting for nothing").await.unwrap_err();
        assert_eq!(err, RequestError::Unavailable);
    }
}
