//! Configuration model for thumbjob.
//!
//! This module defines the JobConfig struct that represents the runner's
//! YAML configuration file. It supports forward-compatible YAML parsing
//! (unknown fields are ignored), sensible defaults for optional fields,
//! and validation of config values.

mod model;
mod operations;


// Re-export public API
pub use model::JobConfig;
