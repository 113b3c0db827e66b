// Route table for the Codepad API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(handlers::run_code))
        .route("/api/compiler/run", post(handlers::run_code))
        .route("/status", get(handlers::health_check))
        .route("/languages", get(handlers::list_languages))
        .route("/usage/:identity", get(handlers::get_usage))
        .route("/metrics", get(handlers::metrics_endpoint))
}

/// Full application with state and request tracing
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use async_trait::async_trait;
    use codepad_exec::testing::{status_only, ScriptedBackend};
    use codepad_exec::{
        ExecError, Executor, LanguageRegistry, PollPolicy, UsageEvent, UsageNotifier,
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    struct RecordingUsage {
        tx: mpsc::UnboundedSender<UsageEvent>,
    }

    #[async_trait]
    impl UsageNotifier for RecordingUsage {
        async fn record(&self, event: UsageEvent) -> anyhow::Result<()> {
            let _ = self.tx.send(event);
            Ok(())
        }
    }

    fn state_recording_usage() -> (Arc<AppState>, mpsc::UnboundedReceiver<UsageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let executor = Executor::new(
            LanguageRegistry::default(),
            Arc::new(ScriptedBackend::new().with_statuses([3])),
            PollPolicy::new(30, Duration::from_secs(1)),
        )
        .with_usage_notifier(Arc::new(RecordingUsage { tx }));
        let state = Arc::new(AppState {
            executor,
            usage_store: None,
            request_timeout: Duration::from_secs(45),
        });
        (state, rx)
    }

    fn post_run_as(user: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/run")
            .header("content-type", "application/json")
            .header("x-user-id", user)
            .body(Body::from(json!({"language": "python", "code": "print(1)"}).to_string()))
            .unwrap()
    }

    fn state_with(backend: Arc<ScriptedBackend>, request_timeout: Duration) -> Arc<AppState> {
        let executor = Executor::new(
            LanguageRegistry::default(),
            backend,
            PollPolicy::new(30, Duration::from_secs(1)),
        );
        Arc::new(AppState {
            executor,
            usage_store: None,
            request_timeout,
        })
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_normalized_result() {
        let mut accepted = status_only(3);
        accepted.status.description = "Accepted".into();
        accepted.stdout = Some("hi\n".into());
        accepted.time = Some("0.01".into());
        accepted.memory = Some("3500".into());
        let backend = Arc::new(ScriptedBackend::new().with_statuses([2]).then(accepted));
        let app = app(state_with(backend.clone(), Duration::from_secs(45)));

        let (status, body) = call(
            app,
            post_json("/run", json!({"language": "python", "code": "print('hi')", "stdin": ""})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "stdout": "hi\n",
                "stderr": "",
                "compile_output": "",
                "time": "0.01",
                "memory": "3500",
                "status": {"id": 3, "description": "Accepted"},
                "token": "abc123"
            })
        );
        assert_eq!(backend.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_original_route_is_mounted() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([3]));
        let app = app(state_with(backend, Duration::from_secs(45)));

        let (status, _) = call(
            app,
            post_json("/api/compiler/run", json!({"language": "c", "code": "int main(){}"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_errors_are_400() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([3]));
        let state = state_with(backend.clone(), Duration::from_secs(45));

        let (status, body) = call(
            app(state.clone()),
            post_json("/run", json!({"language": "ruby", "code": "puts 1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "unsupported_language");

        let (status, body) = call(
            app(state),
            post_json("/run", json!({"language": "python", "code": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["error"], "Code cannot be empty");

        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400_json() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([3]));
        let state = state_with(backend.clone(), Duration::from_secs(45));

        let (status, body) = call(
            app(state.clone()),
            post_json("/run", json!({"language": "python", "code": null})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");

        let (status, body) = call(
            app(state.clone()),
            post_json("/run", json!({"language": 71, "code": "print(1)"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");

        let request = Request::builder()
            .method("POST")
            .uri("/run")
            .header("content-type", "application/json")
            .body(Body::from("{\"language\": "))
            .unwrap();
        let (status, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");

        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_header_is_counted_as_identity() {
        let (state, mut rx) = state_recording_usage();

        let (status, _) = call(app(state), post_run_as(" u7 ")).await;
        assert_eq!(status, StatusCode::OK);

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.identity, "u7");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_user_header_records_nothing() {
        let (state, mut rx) = state_recording_usage();

        let (status, _) = call(app(state.clone()), post_run_as("")).await;
        assert_eq!(status, StatusCode::OK);

        let waited = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_submission_failure_is_server_error() {
        let backend = Arc::new(
            ScriptedBackend::new().failing_submit(ExecError::Submission("connection refused".into())),
        );
        let app = app(state_with(backend, Duration::from_secs(45)));

        let (status, body) = call(
            app,
            post_json("/run", json!({"language": "java", "code": "class Main {}"})),
        )
        .await;
        assert!(status.is_server_error());
        assert_eq!(body["kind"], "submission");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_budget_exhausted_is_gateway_timeout() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([1]));
        let app = app(state_with(backend.clone(), Duration::from_secs(120)));

        let (status, body) = call(
            app,
            post_json("/run", json!({"language": "python", "code": "while True: pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["kind"], "timeout");
        assert_eq!(backend.fetch_count(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deadline_cancels_polling() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([1]));
        let app = app(state_with(backend.clone(), Duration::from_millis(3500)));

        let (status, body) = call(
            app,
            post_json("/run", json!({"language": "python", "code": "while True: pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "cancelled");
        assert_eq!(backend.fetch_count(), 4);
    }

    #[tokio::test]
    async fn test_health_and_languages() {
        let backend = Arc::new(ScriptedBackend::new());
        let state = state_with(backend, Duration::from_secs(45));

        let response = app(state.clone())
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, body) = call(
            app(state),
            Request::builder().uri("/languages").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"name": "c", "backend_id": 50},
                {"name": "cpp", "backend_id": 54},
                {"name": "java", "backend_id": 62},
                {"name": "python", "backend_id": 71}
            ])
        );
    }

    #[tokio::test]
    async fn test_usage_disabled_without_redis() {
        let app = app(state_with(Arc::new(ScriptedBackend::new()), Duration::from_secs(45)));

        let (status, body) = call(
            app,
            Request::builder().uri("/usage/user-1").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "usage_disabled");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([3]));
        let state = state_with(backend, Duration::from_secs(45));

        let _ = call(
            app(state.clone()),
            post_json("/run", json!({"language": "python", "code": "print(1)"})),
        )
        .await;

        let response = app(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("codepad_executions_total"));
    }
}
