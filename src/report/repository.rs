use std::path::Path;

use tracing::{debug, warn};

use crate::error::GitError;
use crate::git::{GitRunner, RepositoryProbe};
use crate::system::FsOps;
use crate::types::{
    Operation, Options, ProbeIssue, ProbeOutcome, QueuedCommits, Repository, SyncOutcome,
};

/// Run the whole probe pipeline for one candidate directory.
///
/// Validation decides whether the directory reaches the report at all. Every later step
/// degrades on failure: the field stays empty and a [`ProbeIssue`] records why.
pub(crate) fn probe_repository(
    path: &Path,
    opts: &Options,
    git: &dyn GitRunner,
    fs: &dyn FsOps,
) -> ProbeOutcome {
    let probe = RepositoryProbe::new(path, git, fs, opts.timeouts);

    match probe.validate() {
        Ok(true) => {}
        Ok(false) => {
            debug!(event = "census.probe.not_a_repository", path = %path.display());
            return ProbeOutcome::Invalid;
        }
        Err(err) => {
            if err.is_cancelled() {
                debug!(event = "census.probe.cancelled", path = %path.display());
            } else {
                warn!(
                    event = "census.probe.validate_failed",
                    path = %path.display(),
                    error = %err
                );
            }
            return ProbeOutcome::Unavailable(err);
        }
    }

    let mut issues = Vec::new();

    let sync = if opts.fetch {
        match probe.fetch() {
            Ok(()) => SyncOutcome::Fetched,
            Err(err) => {
                record(&mut issues, path, Operation::Fetch, &err);
                SyncOutcome::Failed
            }
        }
    } else {
        SyncOutcome::NotRequested
    };

    let branch = keep(&mut issues, path, Operation::Branch, probe.current_branch()).flatten();
    let remotes = keep(&mut issues, path, Operation::Remotes, probe.resolve_remotes())
        .unwrap_or_default();
    let last_fetch = probe.last_fetch_time();
    let status = keep(&mut issues, path, Operation::Status, probe.status(opts.status_form));
    let commit_log = keep(&mut issues, path, Operation::Log, probe.log(&opts.log));

    let queued = match probe.queued_commits(opts.author, commit_log.as_deref().unwrap_or_default()) {
        Ok(queued) => queued,
        Err(err) => {
            record(&mut issues, path, Operation::QueuedCommits, &err);
            QueuedCommits::Unresolved
        }
    };

    ProbeOutcome::Valid(Box::new(Repository {
        path: path.to_path_buf(),
        branch,
        remotes,
        last_fetch,
        status,
        commit_log,
        queued,
        sync,
        issues,
    }))
}

fn keep<T>(
    issues: &mut Vec<ProbeIssue>,
    path: &Path,
    operation: Operation,
    result: Result<T, GitError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            record(issues, path, operation, &err);
            None
        }
    }
}

fn record(issues: &mut Vec<ProbeIssue>, path: &Path, operation: Operation, err: &GitError) {
    if err.is_timeout() {
        warn!(
            event = "census.probe.timeout",
            path = %path.display(),
            operation = ?operation,
            error = %err
        );
    } else if err.is_cancelled() {
        debug!(
            event = "census.probe.cancelled",
            path = %path.display(),
            operation = ?operation
        );
    } else {
        warn!(
            event = "census.probe.step_failed",
            path = %path.display(),
            operation = ?operation,
            error = %err
        );
    }
    issues.push(ProbeIssue::from_error(operation, err));
}
