//! Review service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    review::{ReviewAction, ReviewState},
    sessions::SessionError,
    views,
};

/// Create the router for the review service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/:process_id", get(open_review))
        .route("/:process_id/sessions/:session_id", get(show_review))
        .route(
            "/:process_id/sessions/:session_id/state",
            get(session_state),
        )
        .route(
            "/:process_id/sessions/:session_id/toggle/:index",
            post(toggle_file),
        )
        .route(
            "/:process_id/sessions/:session_id/submit",
            post(submit_selection),
        )
        .route(
            "/:process_id/sessions/:session_id/reject",
            post(reject_process),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn review_url(process_id: &str) -> String {
    format!("/{}", urlencoding::encode(process_id))
}

fn session_url(process_id: &str, session_id: Uuid) -> String {
    format!("{}/sessions/{}", review_url(process_id), session_id)
}

/// Where to send the browser after an action on a session
fn after_action<T>(result: Result<T, SessionError>, process_id: &str, session_id: Uuid) -> Redirect {
    match result {
        // unknown or expired session: start a fresh visit
        Err(SessionError::NotFound) => Redirect::to(&review_url(process_id)),
        _ => Redirect::to(&session_url(process_id, session_id)),
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if !common::database::health_check(state.store.as_ref()).await {
        return Err(ApiError::Unavailable(format!(
            "{} store is not reachable",
            state.store.backend_name()
        )));
    }

    Ok(Json(json!({
        "status": "ok",
        "service": "review-service",
        "store": state.store.backend_name(),
        "sessions": state.sessions.len().await,
    })))
}

/// Open a review of `process_id` and render it
pub async fn open_review(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
) -> Response {
    let session_id = state.sessions.open(state.store.as_ref(), &process_id).await;
    render(&state, &process_id, session_id).await
}

/// Re-render an open review
pub async fn show_review(
    State(state): State<AppState>,
    Path((process_id, session_id)): Path<(String, Uuid)>,
) -> Response {
    render(&state, &process_id, session_id).await
}

async fn render(state: &AppState, process_id: &str, session_id: Uuid) -> Response {
    match state.sessions.render(session_id, process_id).await {
        Ok(view) => Html(views::review_page(&view)).into_response(),
        Err(_) => Redirect::to(&review_url(process_id)).into_response(),
    }
}

/// Toggle one file in the selection
pub async fn toggle_file(
    State(state): State<AppState>,
    Path((process_id, session_id, index)): Path<(String, Uuid, usize)>,
) -> Redirect {
    let result = state.sessions.toggle(session_id, &process_id, index).await;
    after_action(result, &process_id, session_id)
}

/// Write the current selection back to the process
pub async fn submit_selection(
    State(state): State<AppState>,
    Path((process_id, session_id)): Path<(String, Uuid)>,
) -> Redirect {
    let result = state
        .sessions
        .decide(
            state.store.as_ref(),
            session_id,
            &process_id,
            ReviewAction::Submit,
        )
        .await;
    after_action(result, &process_id, session_id)
}

/// Reject the whole batch
pub async fn reject_process(
    State(state): State<AppState>,
    Path((process_id, session_id)): Path<(String, Uuid)>,
) -> Redirect {
    let result = state
        .sessions
        .decide(
            state.store.as_ref(),
            session_id,
            &process_id,
            ReviewAction::Reject,
        )
        .await;
    after_action(result, &process_id, session_id)
}

/// JSON snapshot of a session's state
pub async fn session_state(
    State(state): State<AppState>,
    Path((process_id, session_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<ReviewState>> {
    state
        .sessions
        .state(session_id, &process_id)
        .await
        .map(Json)
        .map_err(|_| ApiError::NotFound(format!("Review session {} not found", session_id)))
}
