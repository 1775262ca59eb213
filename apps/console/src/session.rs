//! Request lifecycle owned by the UI-facing caller.
//!
//! Each view keeps one `RequestSlot`. Starting a request hands out a `Ticket` stamped with the
//! slot's generation; only the ticket of the most recent request may write its resolution back.
//! A second attempt at an action that is still in flight is ignored. A request whose future is
//! dropped before it resolves (caller timeout, `select!`, task abort) withdraws itself.
//!
//! Slots sit behind a `std::sync::Mutex` that is only held for bookkeeping, never across a
//! network call.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::dispatcher::{simulate_voice_input, IntakeBackend};
use crate::errors::{RequestError, ValidationError};
use crate::models::{ExtractionResult, IntakeRequest, ProcessedDocument, UploadFile, VisionExtraction};
use crate::render::{render_result, render_vision, RenderedField, VisionRow};

/// User-triggered actions. Text, image and voice all feed the intake result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Text,
    Image,
    Voice,
    Vision,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(RequestError),
}

impl<T> RequestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }
}

/// Proof that a request was started; needed to resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    action: Action,
}

/// What happened to a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The resolution was written to the slot.
    Applied,
    /// A newer request started meanwhile; the resolution was dropped.
    Stale,
    /// The same action was already in flight; nothing was sent.
    Ignored,
    /// The input failed validation; nothing was sent and the slot is unchanged.
    Rejected(ValidationError),
}

#[derive(Debug)]
pub struct RequestSlot<T> {
    state: RequestState<T>,
    generation: u64,
    in_flight: HashSet<Action>,
}

impl<T> Default for RequestSlot<T> {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            generation: 0,
            in_flight: HashSet::new(),
        }
    }
}

impl<T> RequestSlot<T> {
    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    /// Moves to `Pending` and supersedes any earlier request.
    /// Returns `None` when `action` is already in flight.
    pub fn begin(&mut self, action: Action) -> Option<Ticket> {
        if !self.in_flight.insert(action) {
            debug!(?action, "ignoring duplicate submission");
            return None;
        }
        self.generation += 1;
        self.state = RequestState::Pending;
        Some(Ticket {
            generation: self.generation,
            action,
        })
    }

    /// Applies `result` if `ticket` belongs to the latest request. Returns whether it was applied.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<T, RequestError>) -> bool {
        self.in_flight.remove(&ticket.action);
        if ticket.generation != self.generation {
            debug!(
                action = ?ticket.action,
                stale = ticket.generation,
                current = self.generation,
                "discarding stale resolution"
            );
            return false;
        }
        self.state = match result {
            Ok(value) => RequestState::Succeeded(value),
            Err(e) => RequestState::Failed(e),
        };
        true
    }

    /// Withdraws a request that will never resolve. If it was the latest one the slot goes
    /// back to `Idle`; a newer request is left alone.
    pub fn cancel(&mut self, ticket: Ticket) {
        self.in_flight.remove(&ticket.action);
        if ticket.generation == self.generation && self.state.is_pending() {
            debug!(action = ?ticket.action, generation = ticket.generation, "request abandoned");
            self.state = RequestState::Idle;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancels its ticket on drop unless the request resolved first.
struct InFlight<'a, T> {
    slot: &'a Mutex<RequestSlot<T>>,
    ticket: Ticket,
    armed: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.slot).cancel(self.ticket);
        }
    }
}

/// Runs `request` in `slot`. `on_applied` sees a successful value while the slot is still
/// locked, before any other request can begin.
async fn run_in_slot<T, F>(
    slot: &Mutex<RequestSlot<T>>,
    action: Action,
    request: F,
    on_applied: impl FnOnce(&T),
) -> Outcome
where
    F: Future<Output = Result<T, RequestError>>,
{
    let Some(ticket) = lock(slot).begin(action) else {
        return Outcome::Ignored;
    };
    let mut in_flight = InFlight {
        slot,
        ticket,
        armed: true,
    };
    let result = request.await;
    in_flight.armed = false;

    let mut slot = lock(slot);
    if !slot.resolve(ticket, result) {
        return Outcome::Stale;
    }
    if let RequestState::Succeeded(value) = slot.state() {
        on_applied(value);
    }
    Outcome::Applied
}

/// State behind the intake view: one result slot shared by text, image and voice.
pub struct IntakeSession {
    backend: Arc<dyn IntakeBackend>,
    slot: Mutex<RequestSlot<ExtractionResult>>,
}

impl IntakeSession {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        Self {
            backend,
            slot: Mutex::new(RequestSlot::default()),
        }
    }

    pub async fn submit_text(&self, text: &str) -> Outcome {
        if let Err(e) = IntakeRequest::text(text) {
            return Outcome::Rejected(e);
        }
        run_in_slot(&self.slot, Action::Text, self.backend.submit_text(text), |_| {}).await
    }

    pub async fn submit_image(&self, file: UploadFile) -> Outcome {
        run_in_slot(&self.slot, Action::Image, self.backend.submit_image(file), |_| {}).await
    }

    pub async fn submit_voice(&self) -> Outcome {
        let request = simulate_voice_input(self.backend.as_ref());
        run_in_slot(&self.slot, Action::Voice, request, |_| {}).await
    }

    pub fn state(&self) -> RequestState<ExtractionResult> {
        lock(&self.slot).state().clone()
    }

    /// Rendered fields of the current result, if the latest request succeeded.
    pub fn rendered(&self) -> Option<Vec<RenderedField>> {
        match lock(&self.slot).state() {
            RequestState::Succeeded(result) => Some(render_result(result)),
            _ => None,
        }
    }
}

/// State behind the vision view: the latest extraction plus every document processed so far.
pub struct VisionSession {
    backend: Arc<dyn IntakeBackend>,
    slot: Mutex<RequestSlot<VisionExtraction>>,
    processed: Mutex<Vec<ProcessedDocument>>,
}

impl VisionSession {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        Self {
            backend,
            slot: Mutex::new(RequestSlot::default()),
            processed: Mutex::new(Vec::new()),
        }
    }

    pub async fn submit_document(&self, file: UploadFile) -> Outcome {
        let name = file.filename().to_string();
        let request = self.backend.submit_vision_document(file);
        run_in_slot(&self.slot, Action::Vision, request, |extraction| {
            let doc = ProcessedDocument::from_extraction(name, extraction);
            lock(&self.processed).insert(0, doc);
        })
        .await
    }

    pub fn state(&self) -> RequestState<VisionExtraction> {
        lock(&self.slot).state().clone()
    }

    pub fn rendered(&self) -> Option<(String, Vec<VisionRow>)> {
        match lock(&self.slot).state() {
            RequestState::Succeeded(extraction) => {
                Some((extraction.doc_type.clone(), render_vision(&extraction.fields)))
            }
            _ => None,
        }
    }

    /// Processed documents, newest first.
    pub fn processed(&self) -> Vec<ProcessedDocument> {
        lock(&self.processed).clone()
    }
}
