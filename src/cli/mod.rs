//! CLI argument parsing for thumbjob.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Thumbjob: supervised runner for out-of-process thumbnail generation jobs.
#[derive(Parser, Debug)]
#[command(name = "thumbjob")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for thumbjob.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one thumbnail generation job to completion.
    ///
    /// Launches the generator worker process, streams its merged output,
    /// and prints the job report. Temp artifacts and the process registry
    /// entry are cleaned up on every exit path, including Ctrl-C.
    Generate(GenerateArgs),
}

/// Arguments for the `generate` command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to the job configuration YAML file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to a .properties file forwarded to the worker as system
    /// properties.
    #[arg(short, long)]
    pub properties: Option<PathBuf>,

    /// Session id for this job run. Generated when omitted.
    #[arg(long)]
    pub session_id: Option<String>,

    /// Number of generator threads inside the worker.
    #[arg(long, default_value_t = 1)]
    pub num_of_threads: u32,

    /// Have the worker purge stale thumbnails while it runs.
    #[arg(long)]
    pub cleanup: bool,

    /// Log file directory for the worker process.
    #[arg(long)]
    pub log_file_path: Option<PathBuf>,

    /// Log level for the worker process (e.g. info, debug).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Extra JVM options for the worker, shell-style string.
    #[arg(long, allow_hyphen_values = true)]
    pub jvm_options: Option<String>,

    /// Runtime environment name handed to the worker.
    #[arg(long)]
    pub lasta_env: Option<String>,

    /// Do not forward the search endpoint addresses to the worker.
    #[arg(long)]
    pub no_locale_search: bool,

    /// Launch the worker with a suspended remote debug agent on port 8000.
    #[arg(long)]
    pub remote_debug: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
