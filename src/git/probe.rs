use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::GitError;
use crate::system::FsOps;
use crate::types::{AuthorFilter, CommitRecord, LogQuery, QueuedCommits, Remote, StatusForm, Timeouts};

use super::GitRunner;
use super::log::{LOG_FORMAT, parse_log};
use super::queued::{parse_rev_list, resolve_queued};
use super::refs::{first_line, metadata_dir, parse_remotes, require_success};

/// All `git` access for one candidate directory.
///
/// Every invocation names the directory explicitly (`git -C`), so probes for
/// different repositories can run on any thread at the same time.
pub struct RepositoryProbe<'a> {
    path: PathBuf,
    git: &'a dyn GitRunner,
    fs: &'a dyn FsOps,
    timeouts: Timeouts,
}

impl<'a> RepositoryProbe<'a> {
    pub fn new(
        path: impl Into<PathBuf>,
        git: &'a dyn GitRunner,
        fs: &'a dyn FsOps,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            path: path.into(),
            git,
            fs,
            timeouts,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, args: &[&str], timeout: Duration) -> Result<Output, GitError> {
        self.git.run_git(&self.path, args, timeout)
    }

    fn run_ok(&self, args: &[&str], timeout: Duration) -> Result<Output, GitError> {
        require_success(self.run(args, timeout)?, args)
    }

    /// Whether the directory is the top of a working tree.
    ///
    /// A non-repository is `Ok(false)`, and so is a directory nested inside some
    /// other working tree. Only a failure to run the tool is an error.
    ///
    /// # Errors
    /// Returns an error when `git` cannot be launched, times out or is cancelled.
    pub fn validate(&self) -> Result<bool, GitError> {
        let out = self.run(
            &["rev-parse", "--is-inside-work-tree", "--show-toplevel"],
            self.timeouts.command,
        )?;
        if !out.status.success() {
            return Ok(false);
        }
        let text = String::from_utf8_lossy(&out.stdout);
        let mut lines = text.lines();
        if lines.next() != Some("true") {
            return Ok(false);
        }
        let Some(toplevel) = lines.next().map(Path::new) else {
            return Ok(false);
        };
        if self.is_same_dir(toplevel) {
            return Ok(true);
        }
        debug!(
            event = "census.probe.nested",
            path = %self.path.display(),
            toplevel = %toplevel.display()
        );
        Ok(false)
    }

    fn is_same_dir(&self, other: &Path) -> bool {
        if other == self.path {
            return true;
        }
        match (self.fs.canonicalize(other), self.fs.canonicalize(&self.path)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// # Errors
    /// Returns an error when `git remote -v` cannot run or fails.
    pub fn resolve_remotes(&self) -> Result<Vec<Remote>, GitError> {
        let out = self.run_ok(&["remote", "-v"], self.timeouts.command)?;
        Ok(parse_remotes(&out.stdout))
    }

    /// Modification time of `FETCH_HEAD`; `None` if the repository was never fetched.
    #[must_use]
    pub fn last_fetch_time(&self) -> Option<DateTime<Local>> {
        let fetch_head = metadata_dir(&self.path, self.fs).join("FETCH_HEAD");
        let modified = self.fs.modified(&fetch_head);
        if modified.is_none() {
            debug!(
                event = "census.probe.fetch_head_missing",
                path = %self.path.display()
            );
        }
        modified.map(DateTime::<Local>::from)
    }

    /// Short branch name, `None` for an unborn branch.
    ///
    /// # Errors
    /// Returns an error when `git` cannot run.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"], self.timeouts.command)?;
        if !out.status.success() {
            return Ok(None);
        }
        Ok(first_line(&out))
    }

    /// Status text including the branch/tracking header.
    ///
    /// # Errors
    /// Returns [`GitError::Timeout`] when the status deadline passes, or any other
    /// invocation failure.
    pub fn status(&self, form: StatusForm) -> Result<String, GitError> {
        let args: &[&str] = match form {
            StatusForm::Short => &["status", "--porcelain", "--branch"],
            StatusForm::Long => &["status", "--long", "--branch"],
        };
        let out = self.run_ok(args, self.timeouts.status)?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    /// # Errors
    /// Returns an error when `git` cannot run.
    pub fn has_commits(&self) -> Result<bool, GitError> {
        let out = self.run(&["rev-parse", "--verify", "--quiet", "HEAD"], self.timeouts.command)?;
        Ok(out.status.success())
    }

    /// Commit log of `HEAD`, newest first. A repository without commits has an empty log.
    ///
    /// # Errors
    /// Returns an error when `git log` cannot run or fails.
    pub fn log(&self, query: &LogQuery) -> Result<Vec<CommitRecord>, GitError> {
        if !self.has_commits()? {
            return Ok(Vec::new());
        }
        let max_count = format!("--max-count={}", query.max_count);
        let since = query.since.as_ref().map(|s| format!("--since={s}"));
        let mut args = vec!["log", LOG_FORMAT, max_count.as_str()];
        if let Some(since) = since.as_deref() {
            args.push(since);
        }
        let out = self.run_ok(&args, self.timeouts.command)?;
        Ok(parse_log(&out.stdout))
    }

    /// Upstream of the current branch (e.g. `origin/main`), `None` when none is configured.
    ///
    /// # Errors
    /// Returns an error when `git` cannot run.
    pub fn upstream(&self) -> Result<Option<String>, GitError> {
        let out = self.run(
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
            self.timeouts.command,
        )?;
        if !out.status.success() {
            return Ok(None);
        }
        Ok(first_line(&out))
    }

    /// Configured `user.email`, `None` when unset.
    ///
    /// # Errors
    /// Returns an error when `git` cannot run.
    pub fn local_identity(&self) -> Result<Option<String>, GitError> {
        let out = self.run(&["config", "--get", "user.email"], self.timeouts.command)?;
        if !out.status.success() {
            return Ok(None);
        }
        Ok(first_line(&out))
    }

    /// Ids of commits reachable from `HEAD` but not from its upstream.
    ///
    /// `author` matches literally, not as a pattern.
    ///
    /// # Errors
    /// Returns an error when `git rev-list` cannot run or fails.
    pub fn queued_commit_ids(&self, author: Option<&str>) -> Result<Vec<String>, GitError> {
        let author = author.map(|a| format!("--author={a}"));
        let mut args = vec!["rev-list", "@{upstream}..HEAD"];
        if let Some(author) = author.as_deref() {
            args.extend([author, "--fixed-strings"]);
        }
        let out = self.run_ok(&args, self.timeouts.command)?;
        Ok(parse_rev_list(&out.stdout))
    }

    /// Queued commits joined against `log`.
    ///
    /// # Errors
    /// Returns an error when any underlying invocation fails.
    pub fn queued_commits(
        &self,
        filter: AuthorFilter,
        log: &[CommitRecord],
    ) -> Result<QueuedCommits, GitError> {
        let Some(upstream) = self.upstream()? else {
            debug!(
                event = "census.probe.no_upstream",
                path = %self.path.display()
            );
            return Ok(QueuedCommits::NoUpstream);
        };
        let author = match filter {
            AuthorFilter::Any => None,
            AuthorFilter::LocalIdentity => {
                let identity = self.local_identity()?;
                if identity.is_none() {
                    debug!(
                        event = "census.probe.no_local_identity",
                        path = %self.path.display()
                    );
                }
                identity
            }
        };
        let ids = self.queued_commit_ids(author.as_deref())?;
        let commits = resolve_queued(&ids, log);
        Ok(QueuedCommits::Tracking {
            upstream,
            ids,
            commits,
        })
    }

    /// Fetch all remotes. Only called when the caller opted in.
    ///
    /// # Errors
    /// Returns an error when the fetch fails or exceeds its deadline.
    pub fn fetch(&self) -> Result<(), GitError> {
        self.run_ok(&["fetch", "--all", "--prune", "--no-tags"], self.timeouts.fetch)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::git::fake::{Reply, ScriptedGit};
    use crate::system::DefaultFsOps;

    fn probe<'a>(git: &'a ScriptedGit, path: &Path) -> RepositoryProbe<'a> {
        RepositoryProbe::new(path, git, &DefaultFsOps, Timeouts::default())
    }

    #[test]
    fn validate_distinguishes_non_repo_from_tool_failure() {
        let git = ScriptedGit::new()
            .on("/r1", "rev-parse --is-inside-work-tree", Reply::WorkTree)
            .on("/nope", "rev-parse --is-inside-work-tree", Reply::exit(128))
            .on("/broken", "rev-parse --is-inside-work-tree", Reply::SpawnError);

        assert!(probe(&git, Path::new("/r1")).validate().expect("r1"));
        assert!(!probe(&git, Path::new("/nope")).validate().expect("nope"));
        assert!(git.was_called("/r1", "rev-parse --is-inside-work-tree --show-toplevel"));
        let err = probe(&git, Path::new("/broken")).validate().expect_err("broken");
        assert!(err.is_spawn_failure());
    }

    #[test]
    fn validate_rejects_directory_nested_in_other_work_tree() {
        let git = ScriptedGit::new().on(
            "/outer/inner",
            "rev-parse --is-inside-work-tree",
            Reply::stdout("true\n/outer\n"),
        );
        assert!(!probe(&git, Path::new("/outer/inner")).validate().expect("nested"));
    }

    #[test]
    fn validate_follows_symlinked_path_to_toplevel() {
        let temp = tempdir().expect("tempdir");
        let real = temp.path().join("real");
        fs::create_dir_all(&real).expect("mkdir");
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");
        let toplevel = fs::canonicalize(&real).expect("canonicalize");
        let git = ScriptedGit::new().on(
            &link,
            "rev-parse --is-inside-work-tree",
            Reply::stdout(&format!("true\n{}\n", toplevel.display())),
        );
        assert!(probe(&git, &link).validate().expect("symlinked"));
    }

    #[test]
    fn status_uses_requested_form_and_reports_timeout() {
        let git = ScriptedGit::new()
            .on("/r", "status --porcelain --branch", Reply::stdout("## main...origin/main\n M a.rs\n"))
            .on("/r", "status --long --branch", Reply::Timeout);
        let p = probe(&git, Path::new("/r"));

        let short = p.status(StatusForm::Short).expect("short");
        assert!(short.starts_with("## main"));
        let err = p.status(StatusForm::Long).expect_err("long");
        assert!(err.is_timeout());
        assert!(git.was_called("/r", "status --long --branch"));
    }

    #[test]
    fn log_passes_window_and_cap() {
        let git = ScriptedGit::new()
            .on("/r", "rev-parse --verify", Reply::stdout("abc\n"))
            .on(
                "/r",
                "log --format=%H%x1f%an%x1f%ae%x1f%ad%x1f%s%x1e --max-count=5 --since=2 days ago",
                Reply::stdout("abc\x1fA\x1fa@x\x1fd1\x1fmsg1\x1e\n"),
            );
        let query = LogQuery {
            since: Some("2 days ago".to_string()),
            max_count: 5,
        };
        let log = probe(&git, Path::new("/r")).log(&query).expect("log");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, "abc");
    }

    #[test]
    fn log_of_unborn_branch_is_empty() {
        let git = ScriptedGit::new().on("/r", "rev-parse --verify", Reply::exit(1));
        let log = probe(&git, Path::new("/r"))
            .log(&LogQuery::default())
            .expect("log");
        assert!(log.is_empty());
        assert!(!git.was_called("/r", "log"));
    }

    #[test]
    fn queued_commits_without_upstream() {
        let git = ScriptedGit::new().on("/r", "rev-parse --abbrev-ref --symbolic-full-name", Reply::exit(128));
        let queued = probe(&git, Path::new("/r"))
            .queued_commits(AuthorFilter::Any, &[])
            .expect("queued");
        assert_eq!(queued, QueuedCommits::NoUpstream);
        assert!(!git.was_called("/r", "rev-list"));
    }

    #[test]
    fn queued_commits_join_against_log_and_filter_by_identity() {
        let git = ScriptedGit::new()
            .on("/r", "rev-parse --abbrev-ref --symbolic-full-name", Reply::stdout("origin/main\n"))
            .on("/r", "config --get user.email", Reply::stdout("me.x+1@x\n"))
            .on(
                "/r",
                "rev-list @{upstream}..HEAD --author=me.x+1@x --fixed-strings",
                Reply::stdout("h2\nh9\n"),
            );
        let log = parse_log(b"h1\x1fA\x1fa@x\x1fd\x1fone\x1e\nh2\x1fMe\x1fme.x+1@x\x1fd\x1ftwo\x1e\n");

        let queued = probe(&git, Path::new("/r"))
            .queued_commits(AuthorFilter::LocalIdentity, &log)
            .expect("queued");

        assert_eq!(queued.ids(), ["h2".to_string(), "h9".to_string()]);
        assert_eq!(queued.commits().len(), 1);
        assert_eq!(queued.commits()[0].message, "two");
    }

    #[test]
    fn last_fetch_time_reads_fetch_head() {
        let temp = tempdir().expect("tempdir");
        let git = ScriptedGit::new();
        fs::create_dir_all(temp.path().join(".git")).expect("mkdir");
        assert!(probe(&git, temp.path()).last_fetch_time().is_none());

        fs::write(temp.path().join(".git/FETCH_HEAD"), "").expect("write");
        assert!(probe(&git, temp.path()).last_fetch_time().is_some());
    }

    #[test]
    fn fetch_failure_is_an_error() {
        let git = ScriptedGit::new().on("/r", "fetch", Reply::exit(1));
        assert!(probe(&git, Path::new("/r")).fetch().is_err());
    }
}
