use thiserror::Error;

/// Every way a single `execute` call can fail.
/// Each variant is scoped to that call; none is fatal to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("{0}")]
    Validation(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to submit code for execution: {0}")]
    Submission(String),

    #[error("Failed to fetch submission result for token {token}: {message}")]
    Poll { token: String, message: String },

    #[error("Execution timeout: result for token {token} not ready after {attempts} attempts")]
    Timeout { token: String, attempts: u32 },

    #[error("Execution cancelled after {attempts} poll attempts (token {token})")]
    Cancelled { token: String, attempts: u32 },
}

/// Inspectable failure category, stable across message changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    UnsupportedLanguage,
    Submission,
    Poll,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::UnsupportedLanguage => "unsupported_language",
            ErrorKind::Submission => "submission",
            ErrorKind::Poll => "poll",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl ExecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::Validation(_) => ErrorKind::Validation,
            ExecError::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
            ExecError::Submission(_) => ErrorKind::Submission,
            ExecError::Poll { .. } => ErrorKind::Poll,
            ExecError::Timeout { .. } => ErrorKind::Timeout,
            ExecError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Failures caused by the request itself rather than the backend
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::UnsupportedLanguage)
    }

    /// Backend token involved in the failure, if one was issued
    pub fn token(&self) -> Option<&str> {
        match self {
            ExecError::Poll { token, .. }
            | ExecError::Timeout { token, .. }
            | ExecError::Cancelled { token, .. } => Some(token),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(ExecError::Validation("Code cannot be empty".into()).is_client_error());
        assert!(ExecError::UnsupportedLanguage("ruby".into()).is_client_error());
        assert!(!ExecError::Submission("boom".into()).is_client_error());
        assert!(!ExecError::Timeout { token: "t".into(), attempts: 30 }.is_client_error());
    }

    #[test]
    fn test_timeout_and_cancel_are_distinct() {
        let timeout = ExecError::Timeout { token: "abc".into(), attempts: 3 };
        let cancelled = ExecError::Cancelled { token: "abc".into(), attempts: 1 };
        assert_ne!(timeout.kind(), cancelled.kind());
        assert_eq!(timeout.token(), Some("abc"));
        assert_eq!(ExecError::Submission("x".into()).token(), None);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ExecError::UnsupportedLanguage("ruby".into()).to_string(),
            "Unsupported language: ruby"
        );
        assert_eq!(
            ExecError::Timeout { token: "abc".into(), attempts: 30 }.to_string(),
            "Execution timeout: result for token abc not ready after 30 attempts"
        );
    }
}
