pub mod events;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers::Orchestrator;

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(events::handle_event))
        .route("/events/start-build", post(events::handle_start_build))
        .route("/events/post-comment", post(events::handle_post_comment))
        .route("/events/enforce-approval", post(events::handle_enforce_approval))
        .route("/events/notify-committer", post(events::handle_notify_committer))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(orchestrator)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pr-builder",
        "timestamp": chrono::Utc::now()
    }))
}
