// handlers/public/system.rs - GET /api/uptime and GET /serverison

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::AppState;

pub const UPTIME_MESSAGE: &str = "Uptime not supported in serverless environments";

/// GET /api/uptime - fixed status message
pub async fn uptime() -> Json<Value> {
    Json(json!({ "message": UPTIME_MESSAGE }))
}

/// GET /serverison - when this process started, as plain text
pub async fn server_is_on(State(state): State<AppState>) -> String {
    format!("Server started: {}", format_timestamp(state.started_at))
}

/// `Friday, October 16, 2026 at 09:58:03 PM UTC`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%A, %B %-d, %Y at %I:%M:%S %p %Z").to_string()
}
