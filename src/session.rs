//! Per-execution session state.
//!
//! A `Session` is the immutable value one job execution runs under: it is
//! assembled once by the job builder, then read by the command builder and
//! the lifecycle controller. Nothing here is persisted; a session lives
//! exactly as long as one `execute()` call.

use rand::Rng;
use std::path::PathBuf;

/// Length of generated session ids.
pub const SESSION_ID_LEN: usize = 15;

/// Immutable state for one thumbnail job execution.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session id; the shared key between the controller and any external
    /// canceller.
    pub id: String,

    /// Worker-internal parallelism hint.
    pub num_of_threads: u32,

    /// Whether the worker should purge stale thumbnails while it runs.
    pub cleanup: bool,

    /// Explicit log directory for the worker; falls back to the property
    /// snapshot, then to `<target>/logs`.
    pub log_file_path: Option<PathBuf>,

    /// Log level flag for the worker; omitted when unset.
    pub log_level: Option<String>,

    /// Extra JVM options, shell-style string split before use.
    pub jvm_options: Option<String>,

    /// Environment selector fallback when the property snapshot does not
    /// carry one.
    pub lasta_env: Option<String>,

    /// Whether to forward the distributed-search endpoint addresses from
    /// the property snapshot.
    pub use_locale_elasticsearch: bool,
}

/// Generate a random alphabetic session id.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| {
            let offset = rng.gen_range(0..52u8);
            let c = if offset < 26 {
                b'a' + offset
            } else {
                b'A' + offset - 26
            };
            c as char
        })
        .collect()
}
