use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::{debug, error, info};

use crate::cancel::CancelFlag;
use crate::error::ScanError;
use crate::git::{GitRunner, tool_version};
use crate::scan::find_repos;
use crate::system::{Clock, FsOps};
use crate::types::{Options, ProbeOutcome, Repository, ScanReport};

use super::repository::probe_repository;

/// Scan `opts.base` and probe every discovered repository on a bounded worker pool.
///
/// # Errors
/// Fails when the base path is unusable, the tool cannot be launched at all, the worker
/// pool cannot be built, or the scan was cancelled.
pub fn collect_report(
    opts: &Options,
    fs: &dyn FsOps,
    git: &dyn GitRunner,
    clock: &dyn Clock,
    cancel: &CancelFlag,
) -> Result<ScanReport, ScanError> {
    let base = resolve_base(&opts.base, fs);
    let candidates = find_repos(&base, &opts.scan)?;
    ensure_tool(git, &base, opts)?;
    run_pipeline(base, candidates, opts, fs, git, clock, cancel)
}

/// Probe a precomputed directory list instead of walking `base`.
///
/// Duplicates are dropped, keeping the first occurrence.
///
/// # Errors
/// Same conditions as [`collect_report`], except that `base` only has to exist.
pub fn collect_report_for_dirs(
    base: &Path,
    dirs: &[PathBuf],
    opts: &Options,
    fs: &dyn FsOps,
    git: &dyn GitRunner,
    clock: &dyn Clock,
    cancel: &CancelFlag,
) -> Result<ScanReport, ScanError> {
    let base = resolve_base(base, fs);
    if !base.is_dir() {
        return Err(ScanError::MissingBasePath { path: base });
    }
    ensure_tool(git, &base, opts)?;

    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if seen.insert(dir.as_path()) {
            unique.push(dir.clone());
        }
    }
    run_pipeline(base, unique.into_iter(), opts, fs, git, clock, cancel)
}

fn resolve_base(base: &Path, fs: &dyn FsOps) -> PathBuf {
    let expanded = fs.expand_tilde(base);
    std::path::absolute(&expanded).unwrap_or(expanded)
}

fn ensure_tool(git: &dyn GitRunner, base: &Path, opts: &Options) -> Result<(), ScanError> {
    match tool_version(git, base, opts.timeouts.command) {
        Ok(version) => {
            debug!(event = "census.scan.tool", version = %version);
            Ok(())
        }
        Err(err) if err.is_spawn_failure() => Err(ScanError::ToolUnavailable {
            program: git.program().to_string(),
            source: err,
        }),
        Err(err) if err.is_cancelled() => Err(ScanError::Cancelled),
        // A tool that starts but answers oddly is left to the per-repository probes.
        Err(err) => {
            debug!(event = "census.scan.tool_check_failed", error = %err);
            Ok(())
        }
    }
}

fn run_pipeline<I>(
    base: PathBuf,
    candidates: I,
    opts: &Options,
    fs: &dyn FsOps,
    git: &dyn GitRunner,
    clock: &dyn Clock,
    cancel: &CancelFlag,
) -> Result<ScanReport, ScanError>
where
    I: Iterator<Item = PathBuf> + Send,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(opts.workers.max(1))
        .thread_name(|i| format!("census-probe-{i}"))
        .build()?;

    let progress = progress_bar(opts.progress);
    let (tx, rx) = mpsc::channel::<(usize, PathBuf, ProbeOutcome)>();

    // The walk is consumed lazily on a scoped thread; the calling thread is the only
    // consumer of results.
    let mut outcomes = Vec::new();
    thread::scope(|scope| {
        let pool = &pool;
        scope.spawn(move || {
            pool.install(|| {
                candidates
                    .enumerate()
                    .take_while(|_| !cancel.is_cancelled())
                    .par_bridge()
                    .for_each_with(tx, |tx, (index, path)| {
                        let outcome = if cancel.is_cancelled() {
                            ProbeOutcome::Skipped
                        } else {
                            probe_isolated(&path, opts, git, fs)
                        };
                        // The receiver lives until every sender is gone.
                        let _ = tx.send((index, path, outcome));
                    });
            });
        });

        for item in rx {
            progress.inc(1);
            progress.set_message(item.1.display().to_string());
            outcomes.push(item);
        }
    });

    if cancel.is_cancelled() {
        progress.abandon_with_message("scan cancelled");
        return Err(ScanError::Cancelled);
    }
    progress.finish_and_clear();

    // Completion order is arbitrary; the report follows discovery order.
    outcomes.sort_by_key(|(index, _, _)| *index);
    assemble(base, outcomes, opts, git, clock)
}

fn probe_isolated(path: &Path, opts: &Options, git: &dyn GitRunner, fs: &dyn FsOps) -> ProbeOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| probe_repository(path, opts, git, fs)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(
                event = "census.probe.panicked",
                path = %path.display(),
                message = %message
            );
            ProbeOutcome::Panicked(message)
        })
}

fn assemble(
    base: PathBuf,
    outcomes: Vec<(usize, PathBuf, ProbeOutcome)>,
    opts: &Options,
    git: &dyn GitRunner,
    clock: &dyn Clock,
) -> Result<ScanReport, ScanError> {
    let candidates = outcomes.len();
    let mut repositories: Vec<Repository> = Vec::new();
    let mut skipped = 0_usize;
    let mut spawn_failures = Vec::new();

    for (_, _, outcome) in outcomes {
        match outcome {
            ProbeOutcome::Valid(repo) => repositories.push(*repo),
            ProbeOutcome::Unavailable(err) => {
                skipped += 1;
                if err.is_spawn_failure() {
                    spawn_failures.push(err);
                }
            }
            ProbeOutcome::Invalid | ProbeOutcome::Skipped | ProbeOutcome::Panicked(_) => {
                skipped += 1;
            }
        }
    }

    if candidates > 0
        && spawn_failures.len() == candidates
        && let Some(source) = spawn_failures.into_iter().next()
    {
        return Err(ScanError::ToolUnavailable {
            program: git.program().to_string(),
            source,
        });
    }

    let total_queued_commits: usize = repositories.iter().map(|r| r.queued.count()).sum();
    let flagged_paths = flag_paths(&repositories, &opts.flag_markers);
    let generated_at: DateTime<Local> = clock.now().into();

    info!(
        event = "census.scan.completed",
        base = %base.display(),
        repositories = repositories.len(),
        skipped,
        queued = total_queued_commits
    );

    Ok(ScanReport {
        base_dir: base,
        generated_at,
        total_repositories: repositories.len(),
        total_queued_commits,
        flagged_paths,
        skipped,
        repositories,
    })
}

/// Paths containing any marker as a case-sensitive substring.
pub(crate) fn flag_paths(repositories: &[Repository], markers: &[String]) -> Vec<PathBuf> {
    repositories
        .iter()
        .filter(|repo| {
            let text = repo.path.to_string_lossy();
            markers
                .iter()
                .any(|marker| !marker.is_empty() && text.contains(marker.as_str()))
        })
        .map(|repo| repo.path.clone())
        .collect()
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {pos} probed {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
