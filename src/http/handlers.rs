//! Liveness, version, listing and lifecycle endpoints.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::lifecycle::ControlError;
use crate::security::Caller;
use crate::tail::list_log_files;

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    #[serde(rename = "buildDate")]
    pub build_date: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_date: option_env!("STREAMER_BUILD_DATE").unwrap_or("unknown"),
        }
    }
}

pub async fn alive() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-cache")], "OK\n")
}

pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo::current())
}

pub async fn list_files(State(state): State<AppState>) -> Response {
    let tail = &state.config.tail;
    match list_log_files(&tail.logs_dir, &tail.extension).await {
        Ok(names) => Json(names).into_response(),
        Err(e) => {
            tracing::error!(dir = ?tail.logs_dir, error = %e, "Error reading directory");
            (StatusCode::INTERNAL_SERVER_ERROR, "Unable to read directory").into_response()
        }
    }
}

pub async fn stop(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
) -> Result<impl IntoResponse, ControlError> {
    tracing::warn!(caller = ?subject(&caller), ".....STOP INVOKED.....");
    state.controller.stop()?;
    Ok((StatusCode::OK, "Stopping application...\n"))
}

pub async fn restart(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
) -> Result<impl IntoResponse, ControlError> {
    tracing::warn!(caller = ?subject(&caller), ".....RESTART INVOKED.....");
    let pid = state.controller.restart()?;
    Ok((StatusCode::OK, format!("Restarting application (new pid {})...\n", pid)))
}

fn subject(caller: &Option<Extension<Caller>>) -> Option<&str> {
    caller.as_ref().and_then(|Extension(c)| c.subject.as_deref())
}
