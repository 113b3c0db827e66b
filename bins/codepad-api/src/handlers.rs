// HTTP route handlers for the Codepad API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use codepad_common::redis as usage_store;
use codepad_common::types::{ExecutionRequest, ExecutionResult, UsageStats};
use codepad_exec::{cancel_pair, CancelHandle, ExecuteOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

/// Header carrying the caller identity, set by the authentication layer
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub stdin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub backend_id: u32,
}

/// Deadline timer for one request. Dropping it stops the timer,
/// including when the handler future is dropped on client disconnect.
pub struct DeadlineGuard(JoinHandle<()>);

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Fire `handle` after `after` unless the returned guard is dropped first
pub fn spawn_deadline(after: Duration, handle: CancelHandle) -> DeadlineGuard {
    DeadlineGuard(tokio::spawn(async move {
        tokio::time::sleep(after).await;
        handle.cancel();
    }))
}

/// POST /run - Execute code and wait for the result
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let Json(payload) = payload.map_err(|rejection| {
        warn!(request_id = %request_id, error = %rejection, "Malformed run request");
        ApiError::InvalidBody(rejection.body_text())
    })?;
    let identity = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let request = ExecutionRequest {
        language: payload.language,
        source_code: payload.code,
        stdin: payload.stdin.unwrap_or_default(),
    };

    // Request-level deadline: cancels polling rather than dropping it
    let (handle, signal) = cancel_pair();
    let deadline = spawn_deadline(state.request_timeout, handle);

    let mut options = ExecuteOptions::default().with_cancel(signal);
    if let Some(identity) = &identity {
        options = options.with_identity(identity.clone());
    }

    let span = info_span!("run", request_id = %request_id, language = %request.language);
    let start = Instant::now();
    let outcome = state
        .executor
        .execute_with(&request, options)
        .instrument(span)
        .await;
    drop(deadline);

    let elapsed = start.elapsed();
    metrics::observe(&outcome, elapsed);

    match outcome {
        Ok(result) => {
            info!(
                request_id = %request_id,
                token = %result.token,
                status_id = result.status.id,
                elapsed_ms = elapsed.as_millis() as u64,
                "Run completed"
            );
            Ok(Json(result))
        }
        Err(e) if e.is_client_error() => {
            warn!(request_id = %request_id, kind = e.kind().as_str(), error = %e, "Run rejected");
            Err(e.into())
        }
        Err(e) => {
            error!(
                request_id = %request_id,
                kind = e.kind().as_str(),
                token = e.token().unwrap_or(""),
                error = %e,
                "Run failed"
            );
            Err(e.into())
        }
    }
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /languages - Configured languages and their backend ids
pub async fn list_languages(State(state): State<Arc<AppState>>) -> Json<Vec<LanguageInfo>> {
    let languages = state
        .executor
        .registry()
        .languages()
        .into_iter()
        .map(|(language, backend_id)| LanguageInfo {
            name: language.to_string(),
            backend_id,
        })
        .collect();
    Json(languages)
}

/// GET /usage/{identity} - Execution counters for one identity
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Result<Json<UsageStats>, ApiError> {
    let counter = state.usage_store.as_ref().ok_or(ApiError::UsageDisabled)?;

    let mut conn = counter.connection();
    match usage_store::get_usage(&mut conn, &identity).await {
        Ok(Some(stats)) => Ok(Json(stats)),
        Ok(None) => Err(ApiError::NotFound(format!("Usage for '{}'", identity))),
        Err(e) => Err(ApiError::Internal(format!("Failed to read usage for '{}': {}", identity, e))),
    }
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_endpoint() -> Result<impl IntoResponse, ApiError> {
    let body = metrics::render().map_err(ApiError::Internal)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_cancel() {
        let (handle, signal) = cancel_pair();
        let _deadline = spawn_deadline(Duration::from_secs(1), handle);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(signal.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_deadline_never_fires() {
        let (handle, signal) = cancel_pair();
        let deadline = spawn_deadline(Duration::from_secs(1), handle);
        drop(deadline);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!signal.is_cancelled());
    }
}
