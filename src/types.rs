use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::GitError;

/// One commit decoded from the delimited log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    // Tool-native date string, kept as printed.
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteDirection {
    Fetch,
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remote {
    pub name: String,
    pub url: String,
    pub direction: RemoteDirection,
}

/// Local commits missing from the upstream of the current branch.
///
/// `NoUpstream` is an expected state for local-only branches and is distinct from a
/// repository that was never fetched (see [`Repository::last_fetch`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueuedCommits {
    NoUpstream,
    /// Resolution failed; the reason is recorded in [`Repository::issues`].
    Unresolved,
    Tracking {
        upstream: String,
        ids: Vec<String>,
        commits: Vec<CommitRecord>,
    },
}

impl QueuedCommits {
    #[must_use]
    pub fn ids(&self) -> &[String] {
        match self {
            Self::Tracking { ids, .. } => ids,
            Self::NoUpstream | Self::Unresolved => &[],
        }
    }

    #[must_use]
    pub fn commits(&self) -> &[CommitRecord] {
        match self {
            Self::Tracking { commits, .. } => commits,
            Self::NoUpstream | Self::Unresolved => &[],
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.ids().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    NotRequested,
    Fetched,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Branch,
    Remotes,
    Status,
    Log,
    QueuedCommits,
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Timeout,
    Unavailable,
    Failed,
    Cancelled,
}

/// A probe step that degraded instead of producing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeIssue {
    pub operation: Operation,
    pub kind: IssueKind,
    pub message: String,
}

impl ProbeIssue {
    #[must_use]
    pub fn from_error(operation: Operation, err: &GitError) -> Self {
        let kind = match err {
            GitError::Timeout { .. } => IssueKind::Timeout,
            GitError::Spawn { .. } => IssueKind::Unavailable,
            GitError::Cancelled { .. } => IssueKind::Cancelled,
            GitError::Failed { .. } => IssueKind::Failed,
        };
        Self {
            operation,
            kind,
            message: err.to_string(),
        }
    }
}

/// A confirmed working tree and everything collected for it in one scan run.
#[derive(Debug, Clone, Serialize)]
pub struct Repository {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub remotes: Vec<Remote>,
    /// `None` when the repository has never been fetched.
    pub last_fetch: Option<DateTime<Local>>,
    /// `None` when the status probe failed or timed out.
    pub status: Option<String>,
    /// Newest first. `None` when the log was not collected.
    pub commit_log: Option<Vec<CommitRecord>>,
    pub queued: QueuedCommits,
    pub sync: SyncOutcome,
    pub issues: Vec<ProbeIssue>,
}

impl Repository {
    #[must_use]
    pub fn queued_commit_ids(&self) -> &[String] {
        self.queued.ids()
    }

    #[must_use]
    pub fn has_issue(&self, operation: Operation) -> bool {
        self.issues.iter().any(|i| i.operation == operation)
    }
}

/// Result of running the probe pipeline on one candidate directory.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Not a working tree; excluded without error.
    Invalid,
    /// Validation itself could not run.
    Unavailable(GitError),
    Valid(Box<Repository>),
    /// Never probed because the scan was cancelled first.
    Skipped,
    /// The pipeline panicked; the message is kept for the log.
    Panicked(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub base_dir: PathBuf,
    pub generated_at: DateTime<Local>,
    pub repositories: Vec<Repository>,
    pub total_repositories: usize,
    pub total_queued_commits: usize,
    pub flagged_paths: Vec<PathBuf>,
    /// Candidates excluded as invalid or unavailable.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusForm {
    /// `--porcelain` with branch header.
    #[default]
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorFilter {
    #[default]
    Any,
    #[serde(alias = "me")]
    LocalIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Passed verbatim to `--since`; `None` disables the window.
    pub since: Option<String>,
    pub max_count: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            since: Some("1 week ago".to_string()),
            max_count: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Read-only local commands.
    pub command: Duration,
    pub status: Duration,
    pub fetch: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(60),
            status: Duration::from_secs(10),
            fetch: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// A directory containing any of these is pruned with its whole subtree.
    pub foreign_markers: Vec<String>,
    /// Directories with these names are never entered.
    pub skip_dirs: Vec<String>,
    pub max_depth: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            foreign_markers: [".svn", ".hg", ".bzr", "CVS"]
                .into_iter()
                .map(String::from)
                .collect(),
            skip_dirs: vec!["svn".to_string()],
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub base: PathBuf,
    pub status_form: StatusForm,
    pub fetch: bool,
    pub log: LogQuery,
    pub author: AuthorFilter,
    pub timeouts: Timeouts,
    pub scan: ScanSettings,
    pub flag_markers: Vec<String>,
    pub workers: usize,
    pub progress: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base: PathBuf::from("."),
            status_form: StatusForm::default(),
            fetch: false,
            log: LogQuery::default(),
            author: AuthorFilter::default(),
            timeouts: Timeouts::default(),
            scan: ScanSettings::default(),
            flag_markers: vec!["Trash".to_string(), "archive".to_string()],
            workers: num_cpus::get().clamp(1, 16),
            progress: false,
        }
    }
}
