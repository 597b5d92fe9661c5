//! Implementation of the `thumbjob generate` command.
//!
//! Loads the job configuration and forwarded properties, wires Ctrl-C to
//! the process registry so an interrupted run still kills the worker, and
//! runs one job to completion. The job report goes to stdout; the exit
//! code reflects whether the report carries error text.

use crate::cli::GenerateArgs;
use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::exit_codes;
use crate::job::{JobContext, ShutdownHooks, ThumbnailJob};
use crate::process::ProcessRegistry;
use crate::props::PropertySet;
use std::sync::Arc;

/// Execute the `thumbjob generate` command.
pub fn cmd_generate(args: GenerateArgs) -> Result<i32> {
    let config = match &args.config {
        Some(path) => JobConfig::load(path)?,
        None => JobConfig::default(),
    };
    config.validate()?;

    let props = match &args.properties {
        Some(path) => PropertySet::load(path)?,
        None => PropertySet::new(),
    };

    let registry = Arc::new(ProcessRegistry::new());
    let hooks = Arc::new(ShutdownHooks::new());

    // Ctrl-C kills the registered worker before the runner dies, so no
    // orphaned generator process survives an interrupted run.
    let interrupt_hooks = Arc::clone(&hooks);
    ctrlc::set_handler(move || {
        interrupt_hooks.run();
        std::process::exit(exit_codes::JOB_FAILURE);
    })
    .map_err(|e| JobError::Unexpected(format!("failed to install interrupt handler: {}", e)))?;

    let mut job = ThumbnailJob::new()
        .num_of_threads(args.num_of_threads)
        .use_locale_elasticsearch(!args.no_locale_search);
    if let Some(session_id) = args.session_id {
        job = job.session_id(session_id);
    }
    if args.cleanup {
        job = job.cleanup();
    }
    if let Some(log_file_path) = args.log_file_path {
        job = job.log_file_path(log_file_path);
    }
    if let Some(log_level) = args.log_level {
        job = job.log_level(log_level);
    }
    if let Some(jvm_options) = args.jvm_options {
        job = job.jvm_options(jvm_options);
    }
    if args.remote_debug {
        job = job.remote_debug();
    }
    if let Some(lasta_env) = args.lasta_env {
        job = job.lasta_env(lasta_env);
    }

    let ctx = JobContext {
        config: &config,
        props: &props,
        registry,
        executor: Some(hooks.as_ref()),
        cache: None,
    };

    let report = job.execute(&ctx);
    print!("{}", report);

    // A clean run reports only the session line; anything after it is the
    // failure message.
    if report.lines().count() > 1 {
        Ok(exit_codes::JOB_FAILURE)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}
