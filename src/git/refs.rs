use std::path::{Path, PathBuf};
use std::process::Output;

use tracing::debug;

use crate::error::GitError;
use crate::system::FsOps;
use crate::types::{Remote, RemoteDirection};

/// Turn a finished invocation into an error when it exited non-zero.
pub(crate) fn require_success(output: Output, args: &[&str]) -> Result<Output, GitError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(GitError::Failed {
            command: args.join(" "),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// First non-empty trimmed line of stdout.
pub(crate) fn first_line(output: &Output) -> Option<String> {
    let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

/// Parse `git remote -v` lines of the form `origin\thttps://host/x.git (fetch)`.
#[must_use]
pub fn parse_remotes(raw: &[u8]) -> Vec<Remote> {
    let text = String::from_utf8_lossy(raw);
    let mut remotes = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url), Some(kind)) = (parts.next(), parts.next(), parts.next())
        else {
            debug!(event = "census.git.remotes.malformed_line", line = %line);
            continue;
        };
        let direction = match kind {
            "(fetch)" => RemoteDirection::Fetch,
            "(push)" => RemoteDirection::Push,
            other => {
                debug!(event = "census.git.remotes.unknown_direction", direction = %other);
                continue;
            }
        };
        remotes.push(Remote {
            name: name.to_string(),
            url: url.to_string(),
            direction,
        });
    }
    remotes
}

/// Location of the metadata folder for a working tree.
///
/// Follows a `.git` file (`gitdir: <path>`) as written for linked worktrees and submodules.
pub(crate) fn metadata_dir(repo: &Path, fs: &dyn FsOps) -> PathBuf {
    let dot_git = repo.join(".git");
    if dot_git.is_file()
        && let Some(text) = fs.read_to_string(&dot_git)
        && let Some(target) = text.trim().strip_prefix("gitdir:")
    {
        let target = Path::new(target.trim());
        return if target.is_absolute() {
            target.to_path_buf()
        } else {
            repo.join(target)
        };
    }
    dot_git
}
