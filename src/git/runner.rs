use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cancel::CancelFlag;
use crate::error::GitError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub trait GitRunner: Sync {
    /// Run `git -C <repo> <args>` and wait at most `timeout` for it to finish.
    ///
    /// A non-zero exit is returned as `Ok`; callers decide what it means.
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned, exceeds `timeout`,
    /// or is cancelled. Timed-out and cancelled processes are killed.
    fn run_git(&self, repo: &Path, args: &[&str], timeout: Duration) -> Result<Output, GitError>;

    /// Name of the executable, used in diagnostics.
    fn program(&self) -> &str {
        "git"
    }
}

pub struct DefaultGitRunner {
    program: PathBuf,
    display: String,
    cancel: CancelFlag,
}

impl DefaultGitRunner {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, cancel: CancelFlag) -> Self {
        let program = program.into();
        let display = program.display().to_string();
        Self {
            program,
            display,
            cancel,
        }
    }
}

impl Default for DefaultGitRunner {
    fn default() -> Self {
        Self::new("git", CancelFlag::new())
    }
}

impl GitRunner for DefaultGitRunner {
    fn run_git(&self, repo: &Path, args: &[&str], timeout: Duration) -> Result<Output, GitError> {
        let command = args.join(" ");
        if self.cancel.is_cancelled() {
            return Err(GitError::Cancelled { command });
        }

        let mut child = Command::new(&self.program)
            .arg("-C")
            .arg(repo)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty child cannot block on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // A timeout too large to represent means no deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut exited = None;
        let status = loop {
            if exited.is_none() {
                match child.try_wait() {
                    Ok(status) => exited = status,
                    Err(source) => {
                        terminate(&mut child);
                        return Err(GitError::Spawn { command, source });
                    }
                }
            }
            // A helper the child left behind can keep the pipes open after it exits.
            if let Some(status) = exited
                && finished(stdout.as_ref())
                && finished(stderr.as_ref())
            {
                break status;
            }
            if self.cancel.is_cancelled() {
                terminate(&mut child);
                return Err(GitError::Cancelled { command });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                terminate(&mut child);
                debug!(
                    event = "census.git.runner.killed",
                    repo = %repo.display(),
                    command = %command,
                    exited = exited.is_some(),
                    "git exceeded its deadline"
                );
                return Err(GitError::Timeout {
                    command,
                    after: timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }

    fn program(&self) -> &str {
        &self.display
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn finished(handle: Option<&JoinHandle<Vec<u8>>>) -> bool {
    handle.is_none_or(JoinHandle::is_finished)
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

// Reader threads are left detached; a grandchild may still hold the pipe.
// Killing an already reaped child is a no-op.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
