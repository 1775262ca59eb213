// Local stand-in for the pipeline API.
// Serves the intake and vision endpoints with canned extraction payloads so the console
// can be exercised without the real extraction service.

pub mod fixtures;
pub mod handlers;
pub mod state;

use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub use fixtures::Fixtures;
pub use state::StubState;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: StubState) -> Router {
    let api = Router::new()
        .route("/intake/text", post(handlers::intake_text))
        .route("/intake/image", post(handlers::intake_image))
        .route("/intake/voice", post(handlers::intake_voice))
        .route("/intake/history", get(handlers::intake_history))
        .route("/vision/upload", post(handlers::vision_upload))
        .route("/vision/documents", get(handlers::list_documents))
        .route("/vision/documents/:id", get(handlers::get_document))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests));

    Router::new()
        .route("/", get(handlers::health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn count_requests(State(state): State<StubState>, request: Request, next: Next) -> Response {
    state.count_request();
    next.run(request).await
}

/// Binds `0.0.0.0:port` and serves the stub until the process exits.
pub async fn serve(port: u16, state: StubState) -> Result<()> {
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Stub backend listening on http://{}/api/v1", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
