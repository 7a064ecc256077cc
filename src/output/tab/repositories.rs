use tabled::{builder::Builder, settings::Panel};

use crate::report::humanize_since;
use crate::types::{QueuedCommits, Repository, ScanReport};

use super::{
    TabStyle,
    style::{align_right, apply_style, apply_title_line},
};
use crate::output::status_summary;

const TITLE: &str = "Repositories";

pub(crate) fn render(report: &ScanReport, style: TabStyle) -> String {
    if report.repositories.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["(none)"]);
        let mut table = builder.build();
        apply_style(&mut table, style);
        table.with(Panel::header(format!(" {TITLE} ")));
        return table.to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["Path", "Branch", "Status", "Upstream", "Queued", "Last fetch", "Issues"]);
    for repo in &report.repositories {
        builder.push_record(row_values(repo, report));
    }

    let mut table = builder.build();
    apply_style(&mut table, style);
    // Columns: 0 Path, 1 Branch, 2 Status, 3 Upstream, 4 Queued, 5 Last fetch, 6 Issues
    align_right(&mut table, 4..5);
    apply_title_line(&mut table, TITLE);
    table.to_string()
}

fn row_values(repo: &Repository, report: &ScanReport) -> Vec<String> {
    let (upstream, queued) = match &repo.queued {
        QueuedCommits::NoUpstream => ("-".to_string(), "-".to_string()),
        QueuedCommits::Unresolved => ("?".to_string(), "?".to_string()),
        QueuedCommits::Tracking { upstream, ids, .. } => (upstream.clone(), ids.len().to_string()),
    };
    vec![
        repo.path.display().to_string(),
        repo.branch.clone().unwrap_or_else(|| "-".to_string()),
        status_summary(repo.status.as_deref()).to_string(),
        upstream,
        queued,
        humanize_since(repo.last_fetch, report.generated_at),
        repo.issues.len().to_string(),
    ]
}
