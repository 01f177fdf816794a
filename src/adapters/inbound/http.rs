use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::adapters::inbound::action_dto::StoreActionDto;
use crate::application::errors::SyncError;
use crate::core::ports::{AuthError, RemoteFileError};
use crate::core::tally::summary::summarize;
use crate::shell::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub logged_in: bool,
    pub user_name: Option<String>,
}

pub async fn dispatch(
    State(state): State<AppState>,
    body: Result<Json<StoreActionDto>, JsonRejection>,
) -> impl IntoResponse {
    let Json(action) = match body {
        Ok(b) => b,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };
    state.dispatcher.dispatch(action.into());
    StatusCode::ACCEPTED.into_response()
}

pub async fn tags(State(state): State<AppState>) -> impl IntoResponse {
    match state.dispatcher.store().request_tags().await {
        Ok(tags) => Json(tags).into_response(),
        Err(err) => sync_error_response(err),
    }
}

pub async fn entries(State(state): State<AppState>, Path(tag): Path<String>) -> impl IntoResponse {
    match state.dispatcher.store().request_by_tag(&tag).await {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => sync_error_response(err),
    }
}

pub async fn summary(State(state): State<AppState>, Path(tag): Path<String>) -> impl IntoResponse {
    match state.dispatcher.store().request_by_tag(&tag).await {
        Ok(entries) => Json(summarize(&entries, Utc::now())).into_response(),
        Err(err) => sync_error_response(err),
    }
}

pub async fn status(State(state): State<AppState>, Path(tag): Path<String>) -> impl IntoResponse {
    Json(state.dispatcher.store().load_status(&tag))
}

pub async fn session(State(state): State<AppState>) -> impl IntoResponse {
    Json(session_view(&state))
}

pub async fn login(State(state): State<AppState>) -> impl IntoResponse {
    match state.authenticator.login().await {
        Ok(()) => Json(session_view(&state)).into_response(),
        Err(err @ AuthError::MissingToken) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    state.authenticator.logout().await;
    Json(session_view(&state))
}

pub async fn alerts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.alerts.messages())
}

fn session_view(state: &AppState) -> SessionView {
    SessionView {
        logged_in: state.authenticator.is_logged_in(),
        user_name: state.authenticator.user_name(),
    }
}

fn sync_error_response(err: SyncError) -> Response {
    let status = match &err {
        SyncError::Remote(RemoteFileError::InsufficientPermissions(_)) => StatusCode::FORBIDDEN,
        SyncError::Remote(RemoteFileError::Unauthenticated(_)) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
