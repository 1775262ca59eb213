use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::StubError;
use crate::models::history::{DocumentList, DocumentRecord, IntakeHistory, IntakeRecord};
use crate::models::intake::file_type;
use crate::stub::state::StubState;

const MIN_TEXT_CHARS: usize = 10;
const TEXT_CONFIDENCE: f64 = 0.92;
const IMAGE_CONFIDENCE: f64 = 0.88;
const VOICE_CONFIDENCE: f64 = 0.85;

#[derive(Deserialize)]
pub struct IntakeTextRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

struct UploadedFile {
    filename: String,
    bytes: Bytes,
}

/// GET /
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "pipeline-stub",
        "agents": ["intake", "vision"]
    }))
}

/// POST /api/v1/intake/text
pub async fn intake_text(
    State(state): State<StubState>,
    Json(req): Json<IntakeTextRequest>,
) -> Result<Json<IntakeRecord>, StubError> {
    if req.text.chars().count() < MIN_TEXT_CHARS {
        return Err(StubError::Validation(format!(
            "text must be at least {MIN_TEXT_CHARS} characters"
        )));
    }
    let confidence = state.fixtures().intake_confidence().unwrap_or(TEXT_CONFIDENCE);
    let record = state.record_intake("text", confidence).await;
    info!(id = record.id, chars = req.text.len(), "processed text intake");
    Ok(Json(record))
}

/// POST /api/v1/intake/image
pub async fn intake_image(
    State(state): State<StubState>,
    multipart: Multipart,
) -> Result<Json<IntakeRecord>, StubError> {
    let upload = read_file_field(multipart).await?;
    let confidence = state.fixtures().intake_confidence().unwrap_or(IMAGE_CONFIDENCE);
    let record = state.record_intake("image", confidence).await;
    info!(
        id = record.id,
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "processed image intake"
    );
    Ok(Json(record))
}

/// POST /api/v1/intake/voice
pub async fn intake_voice(
    State(state): State<StubState>,
    multipart: Multipart,
) -> Result<Json<IntakeRecord>, StubError> {
    let upload = read_file_field(multipart).await?;
    let record = state.record_intake("voice", VOICE_CONFIDENCE).await;
    info!(id = record.id, bytes = upload.bytes.len(), "processed voice intake");
    Ok(Json(record))
}

/// GET /api/v1/intake/history
pub async fn intake_history(
    State(state): State<StubState>,
    Query(params): Query<LimitQuery>,
) -> Json<IntakeHistory> {
    let intakes = state.recent_intakes(params.limit).await;
    let total = intakes.len();
    Json(IntakeHistory { intakes, total })
}

/// POST /api/v1/vision/upload
pub async fn vision_upload(
    State(state): State<StubState>,
    multipart: Multipart,
) -> Result<Json<DocumentRecord>, StubError> {
    let upload = read_file_field(multipart).await?;
    let doc_type = if upload.filename.to_lowercase().contains("resume") {
        "Resume".to_string()
    } else {
        state.fixtures().vision.doc_type.clone()
    };

    let record = state
        .record_document(&upload.filename, file_type(&upload.filename), doc_type)
        .await;
    info!(
        id = record.id,
        filename = %record.filename,
        fields = state.fixtures().vision.fields.len(),
        "extracted document fields"
    );
    Ok(Json(record))
}

/// GET /api/v1/vision/documents
pub async fn list_documents(
    State(state): State<StubState>,
    Query(params): Query<LimitQuery>,
) -> Json<DocumentList> {
    let documents = state.recent_documents(params.limit).await;
    let total = documents.len();
    Json(DocumentList { documents, total })
}

/// GET /api/v1/vision/documents/:id
pub async fn get_document(
    State(state): State<StubState>,
    Path(id): Path<u64>,
) -> Result<Json<DocumentRecord>, StubError> {
    state
        .document(id)
        .await
        .map(Json)
        .ok_or_else(|| StubError::NotFound(format!("document {id} not found")))
}

/// Pulls the `file` part out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, StubError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(StubError::Validation("uploaded file is empty".into()));
        }
        return Ok(UploadedFile { filename, bytes });
    }
    Err(StubError::BadRequest("missing multipart field 'file'".into()))
}
