// HTTP handlers: version, status, commands

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::AppState;
use crate::coordinator::RegistrationId;
use crate::version::BUILD;

pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(BUILD)
}

/// Registrations, timer and sampling counters.
pub(super) async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.coordinator.status())
}

/// Samples now, off-cycle.
pub(super) async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    let refreshing = state.coordinator.refresh_now().is_some();
    (
        StatusCode::ACCEPTED,
        axum::Json(serde_json::json!({ "refreshing": refreshing })),
    )
}

/// Pauses or resumes one consumer; 404 for unknown ids.
pub(super) async fn toggle_pause_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let id = RegistrationId(id);
    match state.coordinator.toggle_paused(id) {
        Some(paused) => {
            state.mirror_status_bar(id, paused).await;
            (
                StatusCode::OK,
                axum::Json(serde_json::json!({ "id": id, "paused": paused })),
            )
        }
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": format!("unknown registration {}", id) })),
        ),
    }
}
