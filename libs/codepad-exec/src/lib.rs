//! Code execution orchestration against a remote execution backend.
//!
//! One call submits a program, polls the backend until it reports a
//! terminal status (or the attempt budget runs out), and returns a
//! normalized result.

pub mod backend;
pub mod error;
pub mod executor;
pub mod judge0;
pub mod normalizer;
pub mod poller;
pub mod registry;
pub mod usage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{ExecutionBackend, RawResult, Submission};
pub use error::{ErrorKind, ExecError, Result};
pub use executor::{ExecuteOptions, Executor};
pub use judge0::Judge0Client;
pub use poller::{cancel_pair, CancelHandle, CancelSignal, PollPolicy};
pub use registry::{LanguageRegistry, LanguageTable, LanguagesFile};
pub use usage::{NoopUsage, RedisUsageCounter, UsageEvent, UsageNotifier};
