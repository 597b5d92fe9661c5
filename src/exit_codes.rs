//! Exit code constants for the thumbjob CLI.
//!
//! - 0: Success (the job report carried no error text)
//! - 1: User error (bad args, unreadable config/properties)
//! - 2: Job failure (the worker exited non-zero or launch failed)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or unreadable configuration.
pub const USER_ERROR: i32 = 1;

/// Job failure: the worker process failed or could not be launched.
pub const JOB_FAILURE: i32 = 2;
