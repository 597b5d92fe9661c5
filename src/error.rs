//! Error types for the thumbjob runner.
//!
//! Uses thiserror for derive macros. All job-level failures are caught at
//! the `execute()` boundary and converted into the report string; only
//! CLI-surface problems (bad config, bad arguments) surface as process
//! errors.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for thumbjob operations.
#[derive(Error, Debug)]
pub enum JobError {
    /// User provided invalid arguments or an unreadable config/properties file.
    #[error("{0}")]
    UserError(String),

    /// The worker command could not be prepared (temp properties file
    /// creation failed). Fatal: the child cannot run without its snapshot.
    #[error("failed to prepare the worker configuration: {0}")]
    ConfigBuild(String),

    /// The worker process ran and exited non-zero. The message format is
    /// part of the report contract consumed by callers.
    #[error("Exit Code: {code}\nOutput:\n{output}")]
    WorkerExit { code: i32, output: String },

    /// Any other failure during launch or wait.
    #[error("thumbnail generator process terminated: {0}")]
    Unexpected(String),
}

impl JobError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobError::UserError(_) => exit_codes::USER_ERROR,
            JobError::ConfigBuild(_) => exit_codes::JOB_FAILURE,
            JobError::WorkerExit { .. } => exit_codes::JOB_FAILURE,
            JobError::Unexpected(_) => exit_codes::JOB_FAILURE,
        }
    }
}

/// Result type alias for thumbjob operations.
pub type Result<T> = std::result::Result<T, JobError>;
