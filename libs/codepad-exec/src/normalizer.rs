/// Result Normalizer
///
/// Turns the backend's sparse status payload into an `ExecutionResult`
/// whose fields are always present:
/// - stdout / stderr / compile_output: absent -> ""
/// - time / memory: absent or empty -> "0"
/// - status: copied verbatim (see `StatusKind` for classification)

use crate::backend::RawResult;
use codepad_common::types::ExecutionResult;

pub fn normalize(token: &str, raw: RawResult) -> ExecutionResult {
    ExecutionResult {
        stdout: raw.stdout.unwrap_or_default(),
        stderr: raw.stderr.unwrap_or_default(),
        compile_output: raw.compile_output.unwrap_or_default(),
        time: or_zero(raw.time),
        memory: or_zero(raw.memory),
        status: raw.status,
        token: token.to_string(),
    }
}

fn or_zero(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepad_common::types::{RawStatus, StatusKind};

    #[test]
    fn test_absent_fields_become_empty() {
        let raw: RawResult =
            serde_json::from_str(r#"{"status": {"id": 3, "description": "Accepted"}}"#).unwrap();

        let result = normalize("abc123", raw);

        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "");
        assert_eq!(result.compile_output, "");
        assert_eq!(result.time, "0");
        assert_eq!(result.memory, "0");
        assert_eq!(result.token, "abc123");
    }

    #[test]
    fn test_null_fields_serialize_as_empty_strings() {
        let raw: RawResult = serde_json::from_str(
            r#"{"status": {"id": 6, "description": "Compilation Error"},
                "stdout": null, "stderr": null,
                "compile_output": "main.c:1: error", "time": null, "memory": null}"#,
        )
        .unwrap();

        let json = serde_json::to_value(normalize("t", raw)).unwrap();

        assert_eq!(json["stdout"], "");
        assert_eq!(json["stderr"], "");
        assert_eq!(json["compile_output"], "main.c:1: error");
        assert_eq!(json["time"], "0");
        assert_eq!(json["memory"], "0");
    }

    #[test]
    fn test_values_pass_through() {
        let raw = RawResult {
            status: RawStatus {
                id: 3,
                description: "Accepted".into(),
            },
            stdout: Some("hi\n".into()),
            stderr: Some("warn\n".into()),
            compile_output: None,
            time: Some("0.01".into()),
            memory: Some("3500".into()),
        };

        let result = normalize("abc123", raw);

        assert_eq!(result.stdout, "hi\n");
        assert_eq!(result.stderr, "warn\n");
        assert_eq!(result.time, "0.01");
        assert_eq!(result.memory, "3500");
    }

    #[test]
    fn test_empty_time_and_memory_default_to_zero() {
        let raw: RawResult =
            serde_json::from_str(r#"{"status": {"id": 5}, "time": "", "memory": ""}"#).unwrap();
        let result = normalize("t", raw);
        assert_eq!(result.time, "0");
        assert_eq!(result.memory, "0");
    }

    #[test]
    fn test_status_copied_verbatim() {
        let raw: RawResult = serde_json::from_str(
            r#"{"status": {"id": 11, "description": "Runtime Error (NZEC)"}}"#,
        )
        .unwrap();

        let result = normalize("t", raw);

        assert_eq!(result.status.id, 11);
        assert_eq!(result.status.description, "Runtime Error (NZEC)");
        assert_eq!(result.status.kind(), StatusKind::RuntimeNzec);
    }

    #[test]
    fn test_unknown_status_id_kept() {
        let raw: RawResult =
            serde_json::from_str(r#"{"status": {"id": 42, "description": "Shiny New State"}}"#).unwrap();

        let result = normalize("t", raw);

        assert_eq!(result.status.id, 42);
        assert_eq!(result.status.description, "Shiny New State");
        assert_eq!(result.status.kind(), StatusKind::Unknown(42));
    }
}
