//! Thumbnail job lifecycle control.
//!
//! `ThumbnailJob` orchestrates one job end to end: build the worker
//! command, launch it through the registry, drain its output concurrently
//! with the blocking wait, interpret the exit status, and clean up the
//! session's temp artifacts and registry entry on every exit path. This is
//! the single place failure and cleanup policy is enforced.
//!
//! `execute()` never returns an error: every failure is converted into the
//! report string, whose first line is always `Session Id: <id>` and whose
//! optional second part is the error message. Callers inspect the report,
//! not an exception.

use crate::command::{CommandSpec, build_command};
use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::process::ProcessRegistry;
use crate::props::PropertySet;
use crate::session::{Session, generate_session_id};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// JVM options enabling a suspended remote debug agent in the worker.
const REMOTE_DEBUG_OPTIONS: &str =
    "-Xdebug -Xrunjdwp:transport=dt_socket,server=y,suspend=y,address=localhost:8000";

/// Bounded wait for the output drain after the child exits. On timeout the
/// job proceeds with whatever output has been drained so far; partial
/// output is accepted behavior, not a defect.
const DRAIN_JOIN_TIMEOUT: Duration = Duration::from_millis(5000);

/// Hook invoked exactly once after a successful run to drop derived data
/// that the fresh thumbnails invalidate.
pub trait CacheClearer {
    fn clear_cache(&self);
}

/// An external job executor that can run registered listeners when the
/// hosting process shuts down.
pub trait JobExecutor {
    fn add_shutdown_listener(&self, listener: Box<dyn FnOnce() + Send>);
}

/// A simple [`JobExecutor`]: collected listeners run once, on demand.
#[derive(Default)]
pub struct ShutdownHooks {
    listeners: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run all registered listeners. Each listener runs at most once; a
    /// second call is a no-op.
    pub fn run(&self) {
        let drained = match self.listeners.lock() {
            Ok(mut listeners) => std::mem::take(&mut *listeners),
            Err(_) => return,
        };
        for listener in drained {
            listener();
        }
    }
}

impl JobExecutor for ShutdownHooks {
    fn add_shutdown_listener(&self, listener: Box<dyn FnOnce() + Send>) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }
}

/// Explicit dependencies for one job execution.
///
/// Everything the controller touches comes in here; nothing is resolved
/// ambiently, which keeps the lifecycle testable against stub workers.
pub struct JobContext<'a> {
    pub config: &'a JobConfig,
    pub props: &'a PropertySet,
    pub registry: Arc<ProcessRegistry>,
    pub executor: Option<&'a dyn JobExecutor>,
    pub cache: Option<&'a dyn CacheClearer>,
}

/// Builder for one thumbnail generation job.
#[derive(Debug, Default)]
pub struct ThumbnailJob {
    session_id: Option<String>,
    num_of_threads: Option<u32>,
    cleanup: bool,
    log_file_path: Option<PathBuf>,
    log_level: Option<String>,
    jvm_options: Option<String>,
    lasta_env: Option<String>,
    locale_elasticsearch_disabled: bool,
}

impl ThumbnailJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit session id instead of a generated one.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Worker-internal parallelism hint (default 1).
    pub fn num_of_threads(mut self, num_of_threads: u32) -> Self {
        self.num_of_threads = Some(num_of_threads);
        self
    }

    /// Have the worker purge stale thumbnails while it runs.
    pub fn cleanup(mut self) -> Self {
        self.cleanup = true;
        self
    }

    pub fn log_file_path(mut self, log_file_path: impl Into<PathBuf>) -> Self {
        self.log_file_path = Some(log_file_path.into());
        self
    }

    pub fn log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = Some(log_level.into());
        self
    }

    /// Extra JVM options for the worker, shell-style string.
    pub fn jvm_options(mut self, options: impl Into<String>) -> Self {
        self.jvm_options = Some(options.into());
        self
    }

    /// Launch the worker with a suspended remote debug agent.
    pub fn remote_debug(self) -> Self {
        self.jvm_options(REMOTE_DEBUG_OPTIONS)
    }

    pub fn lasta_env(mut self, env: impl Into<String>) -> Self {
        self.lasta_env = Some(env.into());
        self
    }

    /// Whether to forward the distributed-search endpoint addresses
    /// (default true).
    pub fn use_locale_elasticsearch(mut self, enabled: bool) -> Self {
        self.locale_elasticsearch_disabled = !enabled;
        self
    }

    /// Run the job to completion and return the report string.
    ///
    /// Line 1 is always `Session Id: <id>`; on failure the error message
    /// follows with a trailing newline. No failure escapes as an error.
    pub fn execute(mut self, ctx: &JobContext) -> String {
        let session_id = self
            .session_id
            .take()
            .unwrap_or_else(generate_session_id);

        let mut report = format!("Session Id: {}\n", session_id);

        if let Some(executor) = ctx.executor {
            let registry = Arc::clone(&ctx.registry);
            let id = session_id.clone();
            executor.add_shutdown_listener(Box::new(move || registry.destroy(&id)));
        }

        let session = Session {
            id: session_id,
            num_of_threads: self.num_of_threads.unwrap_or(1),
            cleanup: self.cleanup,
            log_file_path: self.log_file_path,
            log_level: self.log_level,
            jvm_options: self.jvm_options,
            lasta_env: self.lasta_env,
            use_locale_elasticsearch: !self.locale_elasticsearch_disabled,
        };

        if let Err(e) = run_thumbnail_generator(&session, ctx) {
            error!("failed to generate thumbnails: {}", e);
            report.push_str(&e.to_string());
            report.push('\n');
        }

        report
    }
}

/// Build, launch, wait, interpret, clean up.
///
/// Once the build succeeds, registry deregistration and temp artifact
/// deletion run on every path out of the launch-and-wait phase. A build
/// failure has nothing to deregister, and the builder deletes its own
/// partial artifacts before propagating.
fn run_thumbnail_generator(session: &Session, ctx: &JobContext) -> Result<()> {
    let (spec, mut artifacts) = build_command(ctx.config, ctx.props, session)?;

    let outcome = launch_and_wait(session, ctx, &spec);

    ctx.registry.destroy(&session.id);
    artifacts.cleanup();

    outcome
}

fn launch_and_wait(session: &Session, ctx: &JobContext, spec: &CommandSpec) -> Result<()> {
    info!(
        "ThumbnailGenerator: directory={} options={:?}",
        spec.work_dir.display(),
        spec.argv
    );

    let mut job = ctx.registry.start(&session.id, spec)?;

    // The drain must run before and during the blocking wait, or a chatty
    // worker deadlocks on a full pipe buffer.
    job.drain.start();
    let status = job.wait()?;

    if !job.drain.join(DRAIN_JOIN_TIMEOUT) {
        warn!("output drain incomplete after worker exit; proceeding with partial output");
    }

    match status.code() {
        Some(0) => {
            info!(
                "ThumbnailGenerator: exit code=0, process output:\n{}",
                job.drain.output()
            );
            if let Some(cache) = ctx.cache {
                cache.clear_cache();
            }
            Ok(())
        }
        Some(code) => Err(JobError::WorkerExit {
            code,
            output: job.drain.output(),
        }),
        // Killed by a signal: external cancellation through the registry,
        // treated as graceful early termination rather than a failure.
        None => {
            warn!("ThumbnailGenerator process interrupted.");
            Ok(())
        }
    }
}
