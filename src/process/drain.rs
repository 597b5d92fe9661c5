//! Concurrent reader over the worker's output streams.
//!
//! One reader thread per pipe appends line-wise into a shared buffer, the
//! merged-stream equivalent of redirecting stderr into stdout. The drain
//! runs independently of the blocking wait so a chatty child can never
//! deadlock on a full pipe buffer.

use std::io::{BufRead, BufReader, Read};
use std::process::{ChildStderr, ChildStdout};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Buffered reader over a child's combined stdout/stderr.
#[derive(Debug)]
pub struct OutputDrain {
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    buffer: Arc<Mutex<String>>,
    done_rx: Option<Receiver<()>>,
    pending_readers: usize,
}

impl OutputDrain {
    pub(crate) fn new(stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> Self {
        Self {
            stdout,
            stderr,
            buffer: Arc::new(Mutex::new(String::new())),
            done_rx: None,
            pending_readers: 0,
        }
    }

    /// Start the reader threads. Must precede the blocking wait on the
    /// child.
    pub fn start(&mut self) {
        let (tx, rx) = mpsc::channel();
        let mut readers = 0;
        if let Some(stdout) = self.stdout.take() {
            spawn_reader(stdout, Arc::clone(&self.buffer), tx.clone());
            readers += 1;
        }
        if let Some(stderr) = self.stderr.take() {
            spawn_reader(stderr, Arc::clone(&self.buffer), tx);
            readers += 1;
        }
        self.pending_readers = readers;
        self.done_rx = Some(rx);
    }

    /// Wait up to `timeout` for the readers to finish. Best-effort:
    /// returns false when they were still running at the deadline, in
    /// which case [`OutputDrain::output`] yields whatever has been drained
    /// so far.
    pub fn join(&mut self, timeout: Duration) -> bool {
        let Some(rx) = self.done_rx.as_ref() else {
            return true;
        };
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending_readers;
        while pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(()) => pending -= 1,
                Err(RecvTimeoutError::Timeout) => {
                    self.pending_readers = pending;
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => pending = 0,
            }
        }
        self.pending_readers = 0;
        true
    }

    /// The buffered text accumulated so far. Safe to call speculatively
    /// before the readers finish.
    pub fn output(&self) -> String {
        self.buffer.lock().map(|buf| buf.clone()).unwrap_or_default()
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: R,
    buffer: Arc<Mutex<String>>,
    done: Sender<()>,
) {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    // The worker writes in its platform encoding, so a line
                    // is not guaranteed to be UTF-8. Undecodable bytes are
                    // substituted; the stream stays open.
                    if let Ok(mut buf) = buffer.lock() {
                        buf.push_str(&String::from_utf8_lossy(&line));
                        if !line.ends_with(b"\n") {
                            buf.push('\n');
                        }
                    }
                }
            }
        }
        // The controller may have stopped listening; that is fine.
        let _ = done.send(());
    });
}
