//! Process invoker - run the interpreter on one script
//!
//! The interpreter is spawned in its own process group with stdout and stderr
//! captured. The timeout covers the whole run, including draining the pipes
//! after the interpreter exits. On timeout or cancellation the whole group is
//! killed and reaped before returning. Background processes the interpreter
//! leaves behind in its group are killed as soon as it exits.

use crate::cancel::CancelToken;
use crate::error::{HarnessError, HarnessResult};
use command_group::{CommandGroup, GroupChild};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of one interpreter run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit status (128 + signal for signal-terminated children on Unix)
    pub status: i32,
    /// Captured stdout
    pub stdout: Vec<u8>,
    /// Captured stderr
    pub stderr: Vec<u8>,
    /// Wall-clock time from spawn to exit
    pub duration: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

/// How often a running child is polled
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum time allowed for draining pipes once the interpreter has exited
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Interpreter invoker
#[derive(Debug, Clone)]
pub struct Invoker {
    /// Interpreter binary
    interpreter: PathBuf,
    /// Extra arguments placed before the script path
    args: Vec<String>,
    /// Upper bound on a single run
    timeout: Duration,
    /// Run-wide cancellation
    cancel: CancelToken,
}

impl Invoker {
    /// Create new invoker for an interpreter binary
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            args: Vec::new(),
            timeout: default_timeout(),
            cancel: CancelToken::new(),
        }
    }

    /// Set extra interpreter arguments
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share a cancellation token with the caller
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Command line that reproduces a run of `script`
    pub fn command_line(&self, script: &Path) -> String {
        let mut parts = vec![self.interpreter.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.push(script.display().to_string());
        parts.join(" ")
    }

    /// Run the interpreter on a script and capture its status and output
    pub fn run(&self, script: &Path) -> HarnessResult<ExecutionResult> {
        if self.cancel.is_cancelled() {
            return Err(HarnessError::Cancelled {
                path: script.to_path_buf(),
            });
        }

        let mut command = Command::new(&self.interpreter);
        command
            .args(&self.args)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let child = command
            .group_spawn()
            .map_err(|error| HarnessError::SpawnError {
                interpreter: self.interpreter.clone(),
                error,
            })?;
        let mut guard = ChildGuard::new(child);
        debug!(
            interpreter = %self.interpreter.display(),
            script = %script.display(),
            pid = guard.child.id(),
            "spawned interpreter"
        );

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe
        let (tx, rx) = mpsc::channel();
        let mut pending = 0;
        if let Some(out) = guard.child.inner().stdout.take() {
            drain(Stream::Stdout, out, tx.clone());
            pending += 1;
        }
        if let Some(err) = guard.child.inner().stderr.take() {
            drain(Stream::Stderr, err, tx);
            pending += 1;
        }

        let status = self.wait(&mut guard, script, start)?;
        guard.kill_leftovers();

        let (stdout, stderr) = self.collect(&mut guard, rx, pending, script, start)?;
        guard.disarm();

        let result = ExecutionResult {
            status: exit_code(status),
            stdout,
            stderr,
            duration: start.elapsed(),
        };
        debug!(
            script = %script.display(),
            status = result.status,
            elapsed = ?result.duration,
            "interpreter exited"
        );
        Ok(result)
    }

    /// Poll the child until it exits, times out, or the run is cancelled
    fn wait(
        &self,
        guard: &mut ChildGuard,
        script: &Path,
        start: Instant,
    ) -> HarnessResult<ExitStatus> {
        loop {
            match guard.child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if self.cancel.is_cancelled() {
                        warn!(script = %script.display(), "run cancelled, killing interpreter");
                        guard.kill();
                        return Err(HarnessError::Cancelled {
                            path: script.to_path_buf(),
                        });
                    }
                    if start.elapsed() >= self.timeout {
                        warn!(
                            script = %script.display(),
                            timeout = ?self.timeout,
                            "interpreter timed out, killing"
                        );
                        guard.kill();
                        return Err(HarnessError::TimeoutError {
                            path: script.to_path_buf(),
                            timeout: self.timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(error) => return Err(HarnessError::io(script, error)),
            }
        }
    }

    /// Gather both pipes, still bounded by the run's deadline and token
    ///
    /// A pipe held open by a process that escaped the group counts as a
    /// timeout; its reader thread is left to finish on its own.
    fn collect(
        &self,
        guard: &mut ChildGuard,
        rx: Receiver<(Stream, io::Result<Vec<u8>>)>,
        mut pending: usize,
        script: &Path,
        start: Instant,
    ) -> HarnessResult<(Vec<u8>, Vec<u8>)> {
        let deadline = (start + self.timeout).max(Instant::now() + DRAIN_GRACE);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        while pending > 0 {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok((stream, output)) => {
                    let bytes = output.map_err(|error| HarnessError::io(script, error))?;
                    match stream {
                        Stream::Stdout => stdout = bytes,
                        Stream::Stderr => stderr = bytes,
                    }
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.cancel.is_cancelled() {
                        warn!(script = %script.display(), "run cancelled while draining output");
                        guard.kill();
                        return Err(HarnessError::Cancelled {
                            path: script.to_path_buf(),
                        });
                    }
                    if Instant::now() >= deadline {
                        warn!(
                            script = %script.display(),
                            timeout = ?self.timeout,
                            "interpreter output still open after timeout"
                        );
                        guard.kill();
                        return Err(HarnessError::TimeoutError {
                            path: script.to_path_buf(),
                            timeout: self.timeout,
                        });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(HarnessError::io(
                        script,
                        io::Error::other("output reader panicked"),
                    ));
                }
            }
        }
        Ok((stdout, stderr))
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Owns a spawned child; kills and reaps its process group unless disarmed
struct ChildGuard {
    child: GroupChild,
    armed: bool,
}

impl ChildGuard {
    fn new(child: GroupChild) -> Self {
        Self { child, armed: true }
    }

    fn kill(&mut self) {
        if self.armed {
            let _ = self.child.kill();
            let _ = self.child.wait();
            self.armed = false;
        }
    }

    /// Kill whatever the exited leader left running in its group
    fn kill_leftovers(&mut self) {
        if self.armed {
            let _ = self.child.kill();
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

fn drain<R: Read + Send + 'static>(
    stream: Stream,
    mut reader: R,
    tx: Sender<(Stream, io::Result<Vec<u8>>)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = reader.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send((stream, result));
    });
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
