/// Judge0 HTTP client
///
/// **Protocol:**
/// - Submit: `POST /submissions?base64_encoded=false&wait=false`
///   with `{language_id, source_code, stdin}` -> `{token}`
/// - Status: `GET /submissions/{token}?base64_encoded=false&fields=*`
///
/// Submissions are never retried here: a retried submit can run the
/// program twice on the backend.

use crate::backend::{ExecutionBackend, RawResult, Submission};
use crate::error::{ExecError, Result};
use async_trait::async_trait;
use codepad_common::config::Config;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    language_id: u32,
    source_code: &'a str,
    stdin: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Client for a Judge0-compatible execution backend.
/// Holds a single connection-pooling `reqwest::Client` shared by all calls.
#[derive(Debug, Clone)]
pub struct Judge0Client {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl Judge0Client {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        http_timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(http_timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(
            config.backend_url.clone(),
            config.backend_auth_token.clone(),
            config.backend_http_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTH_HEADER, token),
            None => request,
        }
    }
}

#[async_trait]
impl ExecutionBackend for Judge0Client {
    async fn submit(&self, submission: Submission<'_>) -> Result<String> {
        let body = SubmitBody {
            language_id: submission.profile_id,
            source_code: submission.source_code,
            stdin: submission.stdin,
        };

        let request = self
            .client
            .post(format!("{}/submissions", self.base_url))
            .query(&[("base64_encoded", "false"), ("wait", "false")])
            .json(&body);

        let response = self.authorize(request).send().await.map_err(|e| {
            error!(error = %e, "Judge0 submission error");
            ExecError::Submission(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Judge0 rejected submission");
            return Err(ExecError::Submission(format!(
                "backend returned {}: {}",
                status,
                text.trim()
            )));
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ExecError::Submission(format!("malformed backend response: {}", e)))?;

        match parsed.token.filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                debug!(token = %token, language_id = submission.profile_id, "Submission accepted");
                Ok(token)
            }
            None => Err(ExecError::Submission(
                "backend response did not include a token".to_string(),
            )),
        }
    }

    async fn fetch(&self, token: &str) -> Result<RawResult> {
        let poll_error = |message: String| ExecError::Poll {
            token: token.to_string(),
            message,
        };

        let request = self
            .client
            .get(format!("{}/submissions/{}", self.base_url, token))
            .query(&[("base64_encoded", "false"), ("fields", "*")]);

        let response = self.authorize(request).send().await.map_err(|e| {
            error!(token = %token, error = %e, "Judge0 fetch error");
            poll_error(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(token = %token, status = %status, body = %text, "Judge0 status query failed");
            return Err(poll_error(format!("backend returned {}: {}", status, text.trim())));
        }

        response
            .json::<RawResult>()
            .await
            .map_err(|e| poll_error(format!("malformed backend response: {}", e)))
    }
}
