use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical language identifiers accepted by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Java,
    Python,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::C, Language::Cpp, Language::Java, Language::Python];

    /// Canonical lower-case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Python => "python",
        }
    }

    /// Case-insensitive parse of the exact identifier
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "c" => Some(Language::C),
            "cpp" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            "python" => Some(Language::Python),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| format!("Unsupported language: {}", s))
    }
}

/// One run request as received from a caller.
///
/// `language` stays a raw identifier here: resolving it against the
/// configured table is the registry's job, so unsupported values are
/// reported as such rather than rejected during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub language: String,
    pub source_code: String,
    #[serde(default)]
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(language: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source_code: source_code.into(),
            stdin: String::new(),
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }
}

/// Status exactly as reported by the execution backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

impl RawStatus {
    /// Ids 1 (queued) and 2 (processing) are the only non-terminal states
    pub fn is_terminal(&self) -> bool {
        self.id > 2
    }

    pub fn kind(&self) -> StatusKind {
        StatusKind::from_id(self.id)
    }
}

/// Human-readable classification of backend status ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    InQueue,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    RuntimeSigsegv,
    RuntimeSigxfsz,
    RuntimeSigfpe,
    RuntimeSigabrt,
    RuntimeNzec,
    RuntimeOther,
    InternalError,
    ExecFormatError,
    Unknown(u32),
}

impl StatusKind {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => StatusKind::InQueue,
            2 => StatusKind::Processing,
            3 => StatusKind::Accepted,
            4 => StatusKind::WrongAnswer,
            5 => StatusKind::TimeLimitExceeded,
            6 => StatusKind::CompilationError,
            7 => StatusKind::RuntimeSigsegv,
            8 => StatusKind::RuntimeSigxfsz,
            9 => StatusKind::RuntimeSigfpe,
            10 => StatusKind::RuntimeSigabrt,
            11 => StatusKind::RuntimeNzec,
            12 => StatusKind::RuntimeOther,
            13 => StatusKind::InternalError,
            14 => StatusKind::ExecFormatError,
            other => StatusKind::Unknown(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::InQueue => "In Queue",
            StatusKind::Processing => "Processing",
            StatusKind::Accepted => "Accepted",
            StatusKind::WrongAnswer => "Wrong Answer",
            StatusKind::TimeLimitExceeded => "Time Limit Exceeded",
            StatusKind::CompilationError => "Compilation Error",
            StatusKind::RuntimeSigsegv => "Runtime Error (SIGSEGV)",
            StatusKind::RuntimeSigxfsz => "Runtime Error (SIGXFSZ)",
            StatusKind::RuntimeSigfpe => "Runtime Error (SIGFPE)",
            StatusKind::RuntimeSigabrt => "Runtime Error (SIGABRT)",
            StatusKind::RuntimeNzec => "Runtime Error (NZEC)",
            StatusKind::RuntimeOther => "Runtime Error (Other)",
            StatusKind::InternalError => "Internal Error",
            StatusKind::ExecFormatError => "Exec Format Error",
            StatusKind::Unknown(_) => "Unknown Status",
        }
    }

    /// Short snake_case name, used as a metrics label
    pub fn slug(&self) -> &'static str {
        match self {
            StatusKind::InQueue => "in_queue",
            StatusKind::Processing => "processing",
            StatusKind::Accepted => "accepted",
            StatusKind::WrongAnswer => "wrong_answer",
            StatusKind::TimeLimitExceeded => "time_limit_exceeded",
            StatusKind::CompilationError => "compilation_error",
            StatusKind::RuntimeSigsegv
            | StatusKind::RuntimeSigxfsz
            | StatusKind::RuntimeSigfpe
            | StatusKind::RuntimeSigabrt
            | StatusKind::RuntimeNzec
            | StatusKind::RuntimeOther => "runtime_error",
            StatusKind::InternalError => "internal_error",
            StatusKind::ExecFormatError => "exec_format_error",
            StatusKind::Unknown(_) => "unknown",
        }
    }

    pub fn is_runtime_error(&self) -> bool {
        self.slug() == "runtime_error"
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized outcome of one orchestrated execution.
/// Text fields are always present; absent backend fields become "".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    /// Seconds, as text
    pub time: String,
    /// Kilobytes, as text
    pub memory: String,
    pub status: RawStatus,
    pub token: String,
}

/// Per-identity execution counters kept by the usage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub identity: String,
    pub total_executions: u64,
    pub last_execution_at: Option<DateTime<Utc>>,
}
