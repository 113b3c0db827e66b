/// Execution Orchestrator - High-Level Facade
///
/// **Responsibility:**
/// Turn one `ExecutionRequest` into one `ExecutionResult`:
/// validate -> resolve language -> submit -> poll -> normalize.
///
/// **Architecture:**
/// 1. LanguageRegistry translates the language (registry.rs)
/// 2. ExecutionBackend submits and answers status queries (backend.rs)
/// 3. Poller waits for a terminal status (poller.rs)
/// 4. Normalizer fills in absent fields (normalizer.rs)
///
/// This module is the glue layer. It holds no per-call state: every call
/// owns its token and attempt counter, and no step is retried here.

use crate::backend::{ExecutionBackend, Submission};
use crate::error::{ExecError, Result};
use crate::normalizer::normalize;
use crate::poller::{self, CancelSignal, PollPolicy};
use crate::registry::LanguageRegistry;
use crate::usage::{NoopUsage, UsageEvent, UsageNotifier};
use codepad_common::types::{ExecutionRequest, ExecutionResult, Language};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Per-call knobs. The default uses the executor's policy, no identity
/// and a cancel signal that never fires.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub policy: Option<PollPolicy>,
    pub identity: Option<String>,
    pub cancel: CancelSignal,
}

impl ExecuteOptions {
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Clone)]
pub struct Executor {
    registry: LanguageRegistry,
    backend: Arc<dyn ExecutionBackend>,
    policy: PollPolicy,
    usage: Arc<dyn UsageNotifier>,
}

impl Executor {
    pub fn new(
        registry: LanguageRegistry,
        backend: Arc<dyn ExecutionBackend>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            registry,
            backend,
            policy,
            usage: Arc::new(NoopUsage),
        }
    }

    pub fn with_usage_notifier(mut self, usage: Arc<dyn UsageNotifier>) -> Self {
        self.usage = usage;
        self
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Execute with the default policy and no identity
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.execute_with(request, ExecuteOptions::default()).await
    }

    #[instrument(skip_all, fields(language = %request.language))]
    pub async fn execute_with(
        &self,
        request: &ExecutionRequest,
        options: ExecuteOptions,
    ) -> Result<ExecutionResult> {
        if request.source_code.trim().is_empty() {
            return Err(ExecError::Validation("Code cannot be empty".to_string()));
        }

        let profile_id = self.registry.resolve(&request.language)?;

        let token = self
            .backend
            .submit(Submission {
                profile_id,
                source_code: &request.source_code,
                stdin: &request.stdin,
            })
            .await?;

        let policy = options.policy.unwrap_or(self.policy);
        info!(
            token = %token,
            language_id = profile_id,
            source_size = request.source_code.len(),
            max_attempts = policy.max_attempts,
            interval_ms = policy.interval.as_millis() as u64,
            "Code submitted"
        );

        let raw = match poller::poll(self.backend.as_ref(), &token, &policy, &options.cancel).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(token = %token, kind = e.kind().as_str(), error = %e, "Polling failed");
                return Err(e);
            }
        };

        let result = normalize(&token, raw);
        let status = result.status.kind();
        info!(
            token = %token,
            status_id = result.status.id,
            status = %status,
            time = %result.time,
            memory = %result.memory,
            "Execution completed"
        );

        if let Some(identity) = options.identity.filter(|i| !i.trim().is_empty()) {
            self.notify_usage(UsageEvent {
                identity,
                language: Language::parse(&request.language),
                token: token.clone(),
                status,
            });
        }

        Ok(result)
    }

    /// Hand the event to the usage collaborator on a detached task
    fn notify_usage(&self, event: UsageEvent) {
        let usage = self.usage.clone();
        tokio::spawn(async move {
            let identity = event.identity.clone();
            if let Err(e) = usage.record(event).await {
                warn!(identity = %identity, error = %e, "Failed to record usage");
            }
        });
    }
}
