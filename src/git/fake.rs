use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::GitError;

use super::GitRunner;

#[derive(Clone)]
pub(crate) enum Reply {
    Exit { code: i32, stdout: Vec<u8> },
    /// Answers `rev-parse --is-inside-work-tree --show-toplevel` for the asked directory.
    WorkTree,
    Timeout,
    SpawnError,
}

impl Reply {
    pub(crate) fn stdout(text: &str) -> Self {
        Self::Exit {
            code: 0,
            stdout: text.as_bytes().to_vec(),
        }
    }

    pub(crate) fn exit(code: i32) -> Self {
        Self::Exit {
            code,
            stdout: Vec::new(),
        }
    }
}

struct Rule {
    repo: Option<PathBuf>,
    prefix: String,
    reply: Reply,
}

/// In-memory `GitRunner` answering by repository path and argument prefix.
///
/// The first matching rule wins; anything unmatched exits with status 1.
pub(crate) struct ScriptedGit {
    rules: Vec<Rule>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl ScriptedGit {
    pub(crate) fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on(mut self, repo: impl AsRef<Path>, prefix: &str, reply: Reply) -> Self {
        self.rules.push(Rule {
            repo: Some(repo.as_ref().to_path_buf()),
            prefix: prefix.to_string(),
            reply,
        });
        self
    }

    pub(crate) fn on_any(mut self, prefix: &str, reply: Reply) -> Self {
        self.rules.push(Rule {
            repo: None,
            prefix: prefix.to_string(),
            reply,
        });
        self
    }

    pub(crate) fn was_called(&self, repo: impl AsRef<Path>, prefix: &str) -> bool {
        let calls = self.calls.lock().expect("calls lock");
        calls
            .iter()
            .any(|(r, args)| r == repo.as_ref() && args.starts_with(prefix))
    }
}

impl GitRunner for ScriptedGit {
    fn run_git(&self, repo: &Path, args: &[&str], timeout: Duration) -> Result<Output, GitError> {
        let command = args.join(" ");
        self.calls
            .lock()
            .expect("calls lock")
            .push((repo.to_path_buf(), command.clone()));

        let reply = self
            .rules
            .iter()
            .find(|rule| {
                rule.repo.as_deref().is_none_or(|r| r == repo) && command.starts_with(&rule.prefix)
            })
            .map_or_else(|| Reply::exit(1), |rule| rule.reply.clone());

        match reply {
            Reply::Exit { code, stdout } => Ok(Output {
                status: ExitStatus::from_raw(code << 8),
                stdout,
                stderr: Vec::new(),
            }),
            Reply::WorkTree => Ok(Output {
                status: ExitStatus::from_raw(0),
                stdout: format!("true\n{}\n", repo.display()).into_bytes(),
                stderr: Vec::new(),
            }),
            Reply::Timeout => Err(GitError::Timeout {
                command,
                after: timeout,
            }),
            Reply::SpawnError => Err(GitError::Spawn {
                command,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "git not found"),
            }),
        }
    }
}
