//! The status endpoint and its payload.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use ticketdesk_core::state_machine::CloseTrigger;

use crate::desk::TicketDesk;
use crate::scheduler::PendingSnapshot;

/// Shared state for the status route.
#[derive(Clone)]
pub struct StatusState {
    pub desk: Arc<TicketDesk>,
    pub auth_token: Option<String>,
}

/// Validate the authorization header against the status auth token.
#[allow(clippy::result_large_err)]
fn validate_auth(headers: &HeaderMap, auth_token: &Option<String>) -> Result<(), Response> {
    // No token configured: the endpoint is disabled
    let Some(expected_token) = auth_token else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Status endpoint is disabled (STATUS_AUTH_TOKEN not configured)",
        )
            .into_response());
    };

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header.map(|value| value.strip_prefix("Bearer ")) {
        Some(Some(provided)) if provided == expected_token => Ok(()),
        Some(Some(_)) => Err((StatusCode::UNAUTHORIZED, "Invalid token").into_response()),
        Some(None) => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header format. Expected: Bearer <token>",
        )
            .into_response()),
        None => Err((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header. Expected: Bearer <token>",
        )
            .into_response()),
    }
}

/// Handler: GET /status
pub async fn status_handler(
    State(state): State<StatusState>,
    headers: HeaderMap,
) -> Result<Json<StatusData>, Response> {
    validate_auth(&headers, &state.auth_token)?;
    Ok(Json(state.desk.status().await))
}

/// A channel waiting to be deleted.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PendingDeletionEntry {
    pub channel_id: u64,
    pub trigger: &'static str,
    pub due_at: DateTime<Utc>,
}

impl From<PendingSnapshot> for PendingDeletionEntry {
    fn from(snapshot: PendingSnapshot) -> Self {
        Self {
            channel_id: snapshot.channel.0,
            trigger: match snapshot.trigger {
                CloseTrigger::Command => "command",
                CloseTrigger::Button => "button",
            },
            due_at: snapshot.due_at,
        }
    }
}

/// Full status data for rendering.
#[derive(Debug, Serialize)]
pub struct StatusData {
    pub version: String,
    /// Open tickets the bot currently knows the channel of. Tickets opened
    /// before a restart are only indexed once they are looked up again.
    pub open_tickets_indexed: usize,
    pub categories: Vec<String>,
    pub pending_deletions: Vec<PendingDeletionEntry>,
}
