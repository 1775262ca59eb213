use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::models::history::{DocumentRecord, IntakeRecord};
use crate::stub::fixtures::Fixtures;

/// Shared state of the stub backend, injected into every handler.
#[derive(Clone)]
pub struct StubState {
    inner: Arc<Inner>,
}

struct Inner {
    fixtures: Fixtures,
    // Newest first.
    intakes: RwLock<Vec<IntakeRecord>>,
    documents: RwLock<Vec<DocumentRecord>>,
    next_id: AtomicU64,
    requests: AtomicU64,
}

impl StubState {
    pub fn new(fixtures: Fixtures) -> Self {
        Self {
            inner: Arc::new(Inner {
                fixtures,
                intakes: RwLock::new(Vec::new()),
                documents: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                requests: AtomicU64::new(0),
            }),
        }
    }

    pub fn fixtures(&self) -> &Fixtures {
        &self.inner.fixtures
    }

    /// Number of API requests seen so far.
    pub fn requests_served(&self) -> u64 {
        self.inner.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn count_request(&self) {
        self.inner.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Stores a processed intake built from the fixture payload and returns it.
    pub async fn record_intake(&self, mode: &str, confidence: f64) -> IntakeRecord {
        let record = IntakeRecord {
            id: self.next_id(),
            mode: mode.to_string(),
            parsed_data: Some(Value::Object(self.inner.fixtures.intake.clone())),
            confidence: Some(confidence),
            status: "processed".to_string(),
            created_at: Utc::now(),
        };
        self.inner.intakes.write().await.insert(0, record.clone());
        record
    }

    pub async fn record_document(&self, filename: &str, file_type: String, doc_type: String) -> DocumentRecord {
        let record = DocumentRecord {
            id: self.next_id(),
            filename: filename.to_string(),
            file_type,
            doc_type: Some(doc_type),
            extracted_fields: Some(self.inner.fixtures.vision.fields.clone()),
            status: "complete".to_string(),
            created_at: Utc::now(),
        };
        self.inner.documents.write().await.insert(0, record.clone());
        record
    }

    pub async fn recent_intakes(&self, limit: usize) -> Vec<IntakeRecord> {
        self.inner.intakes.read().await.iter().take(limit).cloned().collect()
    }

    pub async fn recent_documents(&self, limit: usize) -> Vec<DocumentRecord> {
        self.inner.documents.read().await.iter().take(limit).cloned().collect()
    }

    pub async fn document(&self, id: u64) -> Option<DocumentRecord> {
        self.inner.documents.read().await.iter().find(|d| d.id == id).cloned()
    }
}
