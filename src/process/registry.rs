//! Session-keyed registry of live worker processes.
//!
//! The session id is the sole shared key between the job controller and
//! any external canceller: `destroy(session_id)` may be called from any
//! thread at any time, including after the process already exited.

use crate::command::CommandSpec;
use crate::error::{JobError, Result};
use crate::process::OutputDrain;
use std::collections::HashMap;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// How often the blocking wait polls the child. Polling keeps the handle
/// lock free so a concurrent destroy can take it between polls.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A launched worker process: the shared child handle plus its drain.
#[derive(Debug)]
pub struct JobProcess {
    child: Arc<Mutex<Child>>,
    /// Reader over the child's combined output; start it before waiting.
    pub drain: OutputDrain,
}

impl JobProcess {
    /// Block until the child terminates. No overall timeout: the job runs
    /// until the child exits or is externally killed via the registry.
    pub fn wait(&self) -> Result<ExitStatus> {
        loop {
            let status = {
                let mut child = self.child.lock().map_err(|_| {
                    JobError::Unexpected("worker process handle lock poisoned".to_string())
                })?;
                child.try_wait().map_err(|e| {
                    JobError::Unexpected(format!("failed to check worker process status: {}", e))
                })?
            };
            if let Some(status) = status {
                return Ok(status);
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

/// Registry mapping session ids to live child handles.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    running: Mutex<HashMap<String, Arc<Mutex<Child>>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the worker described by `spec` and register it under
    /// `session_id`. Stdout and stderr are piped for the drain; stdin is
    /// closed. A process already registered under the same id is killed
    /// and replaced.
    pub fn start(&self, session_id: &str, spec: &CommandSpec) -> Result<JobProcess> {
        let mut child = Command::new(spec.program())
            .args(spec.args())
            .current_dir(&spec.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                JobError::Unexpected(format!(
                    "failed to start worker process '{}': {}",
                    spec.program(),
                    e
                ))
            })?;

        let drain = OutputDrain::new(child.stdout.take(), child.stderr.take());
        let handle = Arc::new(Mutex::new(child));

        let previous = {
            let mut running = self.running.lock().map_err(|_| {
                JobError::Unexpected("process registry lock poisoned".to_string())
            })?;
            running.insert(session_id.to_string(), Arc::clone(&handle))
        };
        if let Some(previous) = previous {
            warn!("replacing process already registered for session {}", session_id);
            kill_and_reap(&previous);
        }

        Ok(JobProcess { child: handle, drain })
    }

    /// Kill and deregister the process for a session id. Idempotent: a
    /// no-op when nothing is registered, safe after natural exit, safe
    /// concurrently with a waiter.
    pub fn destroy(&self, session_id: &str) {
        let removed = self
            .running
            .lock()
            .ok()
            .and_then(|mut running| running.remove(session_id));
        if let Some(handle) = removed {
            kill_and_reap(&handle);
        }
    }

    /// Whether a process is currently registered for the session id.
    pub fn is_registered(&self, session_id: &str) -> bool {
        self.running
            .lock()
            .map(|running| running.contains_key(session_id))
            .unwrap_or(false)
    }
}

/// Kill a child and wait for it to terminate. Errors are ignored: the
/// process may already have exited.
fn kill_and_reap(handle: &Arc<Mutex<Child>>) {
    if let Ok(mut child) = handle.lock() {
        let _ = child.kill();
        let _ = child.wait();
    }
}
