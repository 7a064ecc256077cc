#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cache;
mod cancel;
pub mod config;
mod error;
mod git;
pub mod output;
mod report;
mod scan;
mod system;
mod types;

pub use cancel::CancelFlag;
pub use error::{CacheError, ConfigError, GitError, ScanError};
pub use git::{
    DefaultGitRunner, FIELD_SEP, GitRunner, LOG_FORMAT, RECORD_SEP, RepositoryProbe, parse_log,
    parse_remotes, parse_rev_list, resolve_queued,
};
pub use report::{collect_report, collect_report_for_dirs, humanize_age, humanize_since};
pub use scan::{RepoCandidates, find_repos};
pub use system::{Clock, DefaultClock, DefaultFsOps, FsOps};
pub use types::{
    AuthorFilter, CommitRecord, IssueKind, LogQuery, Operation, Options, ProbeIssue,
    ProbeOutcome, QueuedCommits, Remote, RemoteDirection, Repository, ScanReport,
    ScanSettings, StatusForm, SyncOutcome, Timeouts,
};
