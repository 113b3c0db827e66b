// In-memory backend with a scripted sequence of status responses
// Used by unit tests here and by downstream crates via the `testing` feature

use crate::backend::{ExecutionBackend, RawResult, Submission};
use crate::error::{ExecError, Result};
use async_trait::async_trait;
use codepad_common::types::{RawStatus, StatusKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// A status-only response, as the backend sends while a submission is pending
pub fn status_only(id: u32) -> RawResult {
    RawResult {
        status: RawStatus {
            id,
            description: StatusKind::from_id(id).label().to_string(),
        },
        stdout: None,
        stderr: None,
        compile_output: None,
        time: None,
        memory: None,
    }
}

/// Recorded submit call: (profile id, source, stdin)
pub type RecordedSubmission = (u32, String, String);

/// Backend double that answers fetches from a script.
/// Once the script runs out, the last response repeats.
pub struct ScriptedBackend {
    token: String,
    submit_error: Option<ExecError>,
    responses: Vec<RawResult>,
    fail_fetch_at: Option<usize>,
    fetch_delay: Option<Duration>,
    submissions: Mutex<Vec<RecordedSubmission>>,
    fetch_times: Mutex<Vec<Instant>>,
    fetches: AtomicUsize,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            token: "abc123".to_string(),
            submit_error: None,
            responses: Vec::new(),
            fail_fetch_at: None,
            fetch_delay: None,
            submissions: Mutex::new(Vec::new()),
            fetch_times: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Append status-only responses
    pub fn with_statuses<I: IntoIterator<Item = u32>>(mut self, ids: I) -> Self {
        self.responses.extend(ids.into_iter().map(status_only));
        self
    }

    /// Append a full response
    pub fn then(mut self, raw: RawResult) -> Self {
        self.responses.push(raw);
        self
    }

    pub fn failing_submit(mut self, error: ExecError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Make the n-th fetch (1-based) fail
    pub fn failing_fetch_at(mut self, n: usize) -> Self {
        self.fail_fetch_at = Some(n);
        self
    }

    /// Hold every fetch for `delay` before answering
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn submit_count(&self) -> usize {
        self.submissions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetch_times.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Total backend calls of either kind
    pub fn call_count(&self) -> usize {
        self.submit_count() + self.fetch_count()
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn submit(&self, submission: Submission<'_>) -> Result<String> {
        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push((
                submission.profile_id,
                submission.source_code.to_string(),
                submission.stdin.to_string(),
            ));
        }
        match &self.submit_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.token.clone()),
        }
    }

    async fn fetch(&self, token: &str) -> Result<RawResult> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut times) = self.fetch_times.lock() {
            times.push(Instant::now());
        }

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_fetch_at == Some(n) {
            return Err(ExecError::Poll {
                token: token.to_string(),
                message: "scripted failure".to_string(),
            });
        }

        let index = (n - 1).min(self.responses.len().saturating_sub(1));
        Ok(self
            .responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| status_only(1)))
    }
}
