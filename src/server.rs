//! Webhook HTTP surface.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::dates::Clock;
use crate::error::LeadIntakeError;
use crate::models::{InboundMessage, IntakeOutcome};
use crate::pipeline::LeadPipeline;

/// Shared state for request handlers
pub struct AppState {
    /// Pipeline every webhook call runs through
    pub pipeline: LeadPipeline,
    /// Source of "now" for relative dates
    pub clock: Arc<dyn Clock>,
}

/// JSON body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// "success", "ignored", "error" or "ok"
    pub status: &'static str,
    /// Human-readable detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    const fn status(status: &'static str) -> Self {
        Self { status, message: None }
    }

    fn with_message(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

impl IntoResponse for LeadIntakeError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(WebhookResponse::with_message("error", self.to_string()))).into_response()
    }
}

/// Build the router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InboundMessage>, JsonRejection>,
) -> Result<Json<WebhookResponse>, LeadIntakeError> {
    // An unreadable body carries no raw_text either.
    let Json(message) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected webhook body");
        LeadIntakeError::MissingInput
    })?;

    match state.pipeline.process(&message, state.clock.today()).await? {
        IntakeOutcome::Duplicate { .. } => Ok(Json(WebhookResponse::with_message("ignored", "Duplicate found"))),
        IntakeOutcome::Recorded { .. } => Ok(Json(WebhookResponse::status("success"))),
    }
}

async fn health_handler() -> Json<WebhookResponse> {
    Json(WebhookResponse::status("ok"))
}
