use super::ServerState;
use crate::reminder::{self, render_last_run, render_status, REMINDER_JOB};
use crate::settings::{
    keys, AgeBasis, ContentSelection, LastRunReport, ReminderSettings, TriggerDay, TriggerTime,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Resolved configuration, defaults applied.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub day: String,
    pub time: String,
    pub content_types: String,
    pub age_days: u32,
    pub age_basis: String,
}

impl From<ReminderSettings> for SettingsResponse {
    fn from(settings: ReminderSettings) -> Self {
        Self {
            day: settings.trigger_day.as_str().to_string(),
            time: settings.trigger_time.to_string(),
            content_types: settings.content_types.as_str().to_string(),
            age_days: settings.age_threshold_days,
            age_basis: settings.age_basis.as_str().to_string(),
        }
    }
}

/// Partial settings update; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct SettingsUpdateRequest {
    pub day: Option<String>,
    pub time: Option<String>,
    pub content_types: Option<String>,
    pub age_days: Option<u32>,
    pub age_basis: Option<String>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/api/settings",
            get(get_settings).put(put_settings).delete(delete_settings),
        )
        .route("/api/preview", get(get_preview))
        .route("/api/last-run", get(get_last_run))
        .route("/api/status", get(get_status))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

async fn get_settings(State(state): State<ServerState>) -> Response {
    match ReminderSettings::load(state.settings_store.as_ref()) {
        Ok(settings) => Json(SettingsResponse::from(settings)).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn put_settings(
    State(state): State<ServerState>,
    Json(update): Json<SettingsUpdateRequest>,
) -> Response {
    if let Err(message) = apply_update(&state, &update) {
        return (StatusCode::BAD_REQUEST, message).into_response();
    }

    // Settings changes recompute the schedule, exactly like a configuration
    // tick.
    if let Err(e) = state.planner.ensure_scheduled(Utc::now()) {
        return internal_error(e);
    }

    match ReminderSettings::load(state.settings_store.as_ref()) {
        Ok(settings) => Json(SettingsResponse::from(settings)).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn delete_settings(State(state): State<ServerState>) -> Response {
    match reminder::uninstall(state.settings_store.as_ref(), state.scheduler.as_ref()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_preview(State(state): State<ServerState>) -> Response {
    match state.runner.run(Utc::now(), true) {
        Ok(preview) => Html(preview.unwrap_or_default()).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_last_run(State(state): State<ServerState>) -> Response {
    match LastRunReport::load(state.settings_store.as_ref()) {
        Ok(report) => Html(render_last_run(report.as_ref())).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_status(State(state): State<ServerState>) -> Response {
    match LastRunReport::load(state.settings_store.as_ref()) {
        Ok(report) => {
            let next = state.scheduler.next_fire(REMINDER_JOB);
            render_status(report.as_ref(), next).into_response()
        }
        Err(e) => internal_error(e),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate and store each provided field. Returns a message describing the
/// first rejected value.
fn apply_update(state: &ServerState, update: &SettingsUpdateRequest) -> Result<(), String> {
    let store = state.settings_store.as_ref();

    if let Some(day) = &update.day {
        let parsed: TriggerDay = day.parse()?;
        store
            .set(keys::TRIGGER_DAY, parsed.as_str())
            .map_err(|e| e.to_string())?;
    }
    if let Some(time) = &update.time {
        let parsed: TriggerTime = time.parse()?;
        store
            .set(keys::TRIGGER_TIME, &parsed.to_string())
            .map_err(|e| e.to_string())?;
    }
    if let Some(content_types) = &update.content_types {
        let parsed: ContentSelection = content_types.parse()?;
        store
            .set(keys::CONTENT_TYPES, parsed.as_str())
            .map_err(|e| e.to_string())?;
    }
    if let Some(age_days) = update.age_days {
        store
            .set(keys::AGE_THRESHOLD_DAYS, &age_days.to_string())
            .map_err(|e| e.to_string())?;
    }
    if let Some(age_basis) = &update.age_basis {
        let parsed: AgeBasis = age_basis.parse()?;
        store
            .set(keys::AGE_BASIS, parsed.as_str())
            .map_err(|e| e.to_string())?;
    }

    Ok(())
}

fn internal_error(err: anyhow::Error) -> Response {
    warn!("Request failed: {:#}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}
