// Prometheus metrics for the execution endpoint

use codepad_common::types::ExecutionResult;
use codepad_exec::ExecError;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};
use std::time::Duration;

lazy_static! {
    pub static ref EXECUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "codepad_executions_total",
        "Execution requests by outcome (backend status or failure kind)",
        &["outcome"]
    )
    .expect("executions counter can be registered");

    pub static ref EXECUTION_DURATION: Histogram = register_histogram!(
        "codepad_execution_duration_seconds",
        "Wall time of one execution request, submit through final poll",
        vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0]
    )
    .expect("duration histogram can be registered");
}

/// Metric label for the outcome of one call
pub fn outcome_label(outcome: &Result<ExecutionResult, ExecError>) -> &'static str {
    match outcome {
        Ok(result) => result.status.kind().slug(),
        Err(e) => e.kind().as_str(),
    }
}

pub fn observe(outcome: &Result<ExecutionResult, ExecError>, elapsed: Duration) {
    EXECUTIONS_TOTAL
        .with_label_values(&[outcome_label(outcome)])
        .inc();
    EXECUTION_DURATION.observe(elapsed.as_secs_f64());
}

/// Render all registered metrics in the text exposition format
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepad_common::types::RawStatus;

    fn result_with_status(id: u32) -> ExecutionResult {
        ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            compile_output: String::new(),
            time: "0".into(),
            memory: "0".into(),
            status: RawStatus { id, description: String::new() },
            token: "t".into(),
        }
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(&Ok(result_with_status(3))), "accepted");
        assert_eq!(outcome_label(&Ok(result_with_status(9))), "runtime_error");
        assert_eq!(
            outcome_label(&Err(ExecError::Timeout { token: "t".into(), attempts: 1 })),
            "timeout"
        );
    }

    #[test]
    fn test_render_includes_counters() {
        observe(&Ok(result_with_status(4)), Duration::from_millis(1200));
        let text = render().unwrap();
        assert!(text.contains("codepad_executions_total"));
        assert!(text.contains("outcome=\"wrong_answer\""));
        assert!(text.contains("codepad_execution_duration_seconds"));
    }
}
