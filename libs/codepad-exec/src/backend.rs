/// Execution Backend - the seam between orchestration and the remote service
///
/// **Responsibility:**
/// Submit one program and query the status of a submission by token.
///
/// **Boundary:**
/// - Implementations know HOW to talk to the service (HTTP, in-memory, ...)
/// - They do NOT poll, wait, or interpret status ids
/// - One backend instance is shared by all concurrent calls and must hold
///   no per-call state

use crate::error::Result;
use async_trait::async_trait;
use codepad_common::types::RawStatus;
use serde::{Deserialize, Deserializer};

/// Submission payload sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission<'a> {
    pub profile_id: u32,
    pub source_code: &'a str,
    pub stdin: &'a str,
}

/// Backend status response, with every optional field kept optional
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawResult {
    pub status: RawStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub memory: Option<String>,
}

#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Queue a program without waiting for it; returns the submission token
    async fn submit(&self, submission: Submission<'_>) -> Result<String>;

    /// Current state of a submission
    async fn fetch(&self, token: &str) -> Result<RawResult>;
}

/// The backend sends `time` as a string but `memory` as an integer
fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_response() {
        let raw: RawResult = serde_json::from_str(
            r#"{
                "status": {"id": 3, "description": "Accepted"},
                "stdout": "hi\n",
                "stderr": null,
                "compile_output": null,
                "time": "0.01",
                "memory": 3500,
                "token": "abc123",
                "language_id": 71
            }"#,
        )
        .unwrap();

        assert_eq!(raw.status.id, 3);
        assert_eq!(raw.stdout.as_deref(), Some("hi\n"));
        assert_eq!(raw.stderr, None);
        assert_eq!(raw.time.as_deref(), Some("0.01"));
        assert_eq!(raw.memory.as_deref(), Some("3500"));
    }

    #[test]
    fn test_decode_sparse_response() {
        let raw: RawResult =
            serde_json::from_str(r#"{"status": {"id": 1, "description": "In Queue"}}"#).unwrap();
        assert!(!raw.status.is_terminal());
        assert_eq!(raw.stdout, None);
        assert_eq!(raw.time, None);
        assert_eq!(raw.memory, None);
    }

    #[test]
    fn test_decode_float_time() {
        let raw: RawResult =
            serde_json::from_str(r#"{"status": {"id": 3}, "time": 0.5, "memory": "1024"}"#).unwrap();
        assert_eq!(raw.time.as_deref(), Some("0.5"));
        assert_eq!(raw.memory.as_deref(), Some("1024"));
        assert_eq!(raw.status.description, "");
    }
}
