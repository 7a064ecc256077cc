use std::fmt::Write as _;

use owo_colors::OwoColorize;

use crate::report::humanize_since;
use crate::types::{CommitRecord, QueuedCommits, Repository, ScanReport};

/// How much of each repository the plain report shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    pub color: bool,
    /// Only the branch header line of the status.
    pub short: bool,
    /// Include the commit log.
    pub more: bool,
}

#[derive(Clone, Copy)]
struct Paint(bool);

impl Paint {
    fn header(self, text: &str) -> String {
        if self.0 {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn accent(self, text: &str) -> String {
        if self.0 {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn warn(self, text: &str) -> String {
        if self.0 {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn muted(self, text: &str) -> String {
        if self.0 {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

#[must_use]
pub fn format_text(report: &ScanReport, opts: TextOptions) -> String {
    let paint = Paint(opts.color);
    let mut out = String::new();
    for repo in &report.repositories {
        write_repository(&mut out, repo, report, opts, paint);
        out.push('\n');
    }
    write_statistics(&mut out, report, paint);
    out
}

fn write_repository(
    out: &mut String,
    repo: &Repository,
    report: &ScanReport,
    opts: TextOptions,
    paint: Paint,
) {
    let branch = repo.branch.as_deref().unwrap_or("(no branch)");
    let _ = writeln!(
        out,
        "{} [{}]",
        paint.header(&repo.path.display().to_string()),
        paint.accent(branch)
    );

    for remote in &repo.remotes {
        let _ = writeln!(
            out,
            "  remote {} {} ({:?})",
            remote.name, remote.url, remote.direction
        );
    }
    let _ = writeln!(
        out,
        "  last fetch: {}",
        humanize_since(repo.last_fetch, report.generated_at)
    );

    match &repo.status {
        Some(status) => {
            let lines = status.lines().filter(|line| !line.is_empty());
            for line in lines.take(if opts.short { 1 } else { usize::MAX }) {
                let _ = writeln!(out, "  {line}");
            }
        }
        None => {
            let _ = writeln!(out, "  {}", paint.warn("status unavailable"));
        }
    }

    write_queued(out, &repo.queued, paint);

    if opts.more
        && let Some(log) = &repo.commit_log
    {
        let _ = writeln!(out, "  log ({}):", log.len());
        for commit in log {
            let _ = writeln!(out, "    {}", commit_line(commit, paint));
        }
    }

    for issue in &repo.issues {
        let _ = writeln!(
            out,
            "  {}",
            paint.warn(&format!("{:?}: {}", issue.operation, issue.message))
        );
    }
}

fn write_queued(out: &mut String, queued: &QueuedCommits, paint: Paint) {
    match queued {
        QueuedCommits::NoUpstream => {
            let _ = writeln!(out, "  {}", paint.muted("no upstream"));
        }
        QueuedCommits::Unresolved => {
            let _ = writeln!(out, "  {}", paint.warn("queued commits unresolved"));
        }
        QueuedCommits::Tracking {
            upstream,
            ids,
            commits,
        } => {
            if ids.is_empty() {
                let _ = writeln!(out, "  up to date with {upstream}");
                return;
            }
            let _ = writeln!(
                out,
                "  {} queued for {upstream}:",
                paint.warn(&ids.len().to_string())
            );
            for id in ids {
                match commits.iter().find(|c| &c.id == id) {
                    Some(commit) => {
                        let _ = writeln!(out, "    {}", commit_line(commit, paint));
                    }
                    // Outside the log window: only the id is known.
                    None => {
                        let _ = writeln!(out, "    {}", paint.muted(short_id(id)));
                    }
                }
            }
        }
    }
}

fn commit_line(commit: &CommitRecord, paint: Paint) -> String {
    format!(
        "{} {} {} <{}> {}",
        paint.muted(short_id(&commit.id)),
        commit.date,
        commit.author_name,
        commit.author_email,
        commit.message
    )
}

fn short_id(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}

fn write_statistics(out: &mut String, report: &ScanReport, paint: Paint) {
    let _ = writeln!(out, "{}", paint.header("statistics"));
    let _ = writeln!(out, "  base: {}", report.base_dir.display());
    let _ = writeln!(out, "  repositories: {}", report.total_repositories);
    let _ = writeln!(out, "  queued commits: {}", report.total_queued_commits);
    let _ = writeln!(out, "  skipped: {}", report.skipped);
    if !report.flagged_paths.is_empty() {
        let _ = writeln!(out, "  flagged:");
        for path in &report.flagged_paths {
            let _ = writeln!(out, "    {}", paint.warn(&path.display().to_string()));
        }
    }
}
