use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::PrBuilderError;
use crate::events::EventEnvelope;
use crate::handlers::{
    DispatchReport, Orchestrator, ENFORCE_APPROVAL, NOTIFY_COMMITTER, POST_COMMENT, START_BUILD,
};

type Reply = (StatusCode, Json<Value>);

/// Routes one event to every handler its kind is wired to.
pub async fn handle_event(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(payload): Json<Value>,
) -> Reply {
    let event = match EventEnvelope::from_value(payload).and_then(EventEnvelope::into_event) {
        Ok(event) => event,
        Err(e) => return error_reply("events", e),
    };

    let report = orchestrator.dispatch(event).await;
    dispatch_reply(report)
}

pub async fn handle_start_build(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(payload): Json<Value>,
) -> Reply {
    let event = match EventEnvelope::from_value(payload)
        .and_then(EventEnvelope::into_pull_request_event)
    {
        Ok(event) => event,
        Err(e) => return error_reply(START_BUILD, e),
    };

    info!("Received pull request event for {}", event.pull_request_id);
    single_reply(START_BUILD, orchestrator.trigger.start(&event).await)
}

pub async fn handle_post_comment(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(payload): Json<Value>,
) -> Reply {
    let event = match EventEnvelope::from_value(payload)
        .and_then(EventEnvelope::into_build_event)
    {
        Ok(event) => event,
        Err(e) => return error_reply(POST_COMMENT, e),
    };

    info!("Received {} for build {}", event.build_status, event.build_id);
    single_reply(POST_COMMENT, orchestrator.comments.publish(&event).await)
}

pub async fn handle_enforce_approval(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(payload): Json<Value>,
) -> Reply {
    let gate = match &orchestrator.approval {
        Some(gate) => gate,
        None => {
            warn!("Approval enforcement is disabled, ignoring event");
            return (StatusCode::OK, Json(serde_json::json!({"status": "disabled"})));
        }
    };

    let event = match EventEnvelope::from_value(payload)
        .and_then(EventEnvelope::into_build_event)
    {
        Ok(event) => event,
        Err(e) => return error_reply(ENFORCE_APPROVAL, e),
    };

    single_reply(ENFORCE_APPROVAL, gate.enforce(&event).await)
}

pub async fn handle_notify_committer(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(payload): Json<Value>,
) -> Reply {
    let notifier = match &orchestrator.notifier {
        Some(notifier) => notifier,
        None => {
            warn!("Committer notifications are not configured, ignoring event");
            return (StatusCode::OK, Json(serde_json::json!({"status": "disabled"})));
        }
    };

    let event = match EventEnvelope::from_value(payload)
        .and_then(EventEnvelope::into_build_event)
    {
        Ok(event) => event,
        Err(e) => return error_reply(NOTIFY_COMMITTER, e),
    };

    single_reply(NOTIFY_COMMITTER, notifier.notify(&event).await)
}

fn single_reply<T: Serialize>(handler: &str, result: Result<T, PrBuilderError>) -> Reply {
    match result {
        Ok(value) => (
            StatusCode::OK,
            Json(serde_json::to_value(value).unwrap_or(Value::Null)),
        ),
        Err(e) => error_reply(handler, e),
    }
}

/// Always 200. A 5xx would make the event bus rerun every handler,
/// including the ones that already completed. Failed handlers are
/// flagged `retriable` in the body and are retried on their own routes.
fn dispatch_reply(report: DispatchReport) -> Reply {
    let retriable = report.retriable_handlers();
    if !retriable.is_empty() {
        warn!("Handlers needing a retry on their own routes: {:?}", retriable);
    }
    (
        StatusCode::OK,
        Json(serde_json::to_value(&report).unwrap_or(Value::Null)),
    )
}

/// The event bus redelivers on 5xx only.
fn error_reply(handler: &str, err: PrBuilderError) -> Reply {
    let status = match &err {
        PrBuilderError::NotAPullRequestBuild => {
            warn!("{}: not a pull request build", handler);
            return (
                StatusCode::OK,
                Json(serde_json::json!({"status": "not_a_pull_request_build"})),
            );
        }
        PrBuilderError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
        PrBuilderError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        PrBuilderError::ConfigError(_) | PrBuilderError::Enrichment(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    error!("{} failed: {}", handler, err);
    (
        status,
        Json(serde_json::json!({"status": "failed", "error": err.to_string()})),
    )
}
