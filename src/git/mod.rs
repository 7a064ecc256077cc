mod log;
mod probe;
mod queued;
mod refs;
mod runner;

#[cfg(all(test, unix))]
pub(crate) mod fake;

pub use log::{FIELD_SEP, LOG_FORMAT, RECORD_SEP, parse_log};
pub use probe::RepositoryProbe;
pub use queued::{parse_rev_list, resolve_queued};
pub use refs::parse_remotes;
pub use runner::{DefaultGitRunner, GitRunner};

use std::path::Path;
use std::time::Duration;

use crate::error::GitError;

/// `git --version` output, used to fail fast when the tool is missing.
///
/// # Errors
/// Returns an error when the tool cannot be launched or does not answer in time.
pub fn tool_version(git: &dyn GitRunner, dir: &Path, timeout: Duration) -> Result<String, GitError> {
    let out = git.run_git(dir, &["--version"], timeout)?;
    let out = refs::require_success(out, &["--version"])?;
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}
