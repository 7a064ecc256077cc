use clap::ValueEnum;

use crate::types::ScanReport;

mod repositories;
mod statistics;
mod style;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum TabStyle {
    #[default]
    Rounded,
    Modern,
    ModernRounded,
    Ascii,
    Psql,
    Markdown,
    Sharp,
    Blank,
    Empty,
}

/// Summary table of every repository followed by the scan statistics.
#[must_use]
pub fn format_tab(report: &ScanReport, style: TabStyle) -> String {
    [
        repositories::render(report, style),
        statistics::render(report, style),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::{report_with, repo};
    use crate::types::QueuedCommits;

    #[test]
    fn lists_each_repository_with_queued_count() {
        let mut r2 = repo("/src/r2");
        r2.status = Some("## main...origin/main [ahead 2]\n".to_string());
        r2.queued = QueuedCommits::Tracking {
            upstream: "origin/main".to_string(),
            ids: vec!["a".to_string(), "b".to_string()],
            commits: Vec::new(),
        };
        let mut report = report_with(vec![repo("/src/r1"), r2]);
        report.total_queued_commits = 2;

        let out = format_tab(&report, TabStyle::Ascii);
        assert!(out.contains("/src/r1"));
        assert!(out.contains("/src/r2"));
        assert!(out.contains("origin/main"));
        assert!(out.contains("Queued commits"));
    }

    #[test]
    fn empty_report_renders_placeholder() {
        let out = format_tab(&report_with(Vec::new()), TabStyle::Empty);
        assert!(out.contains("(none)"));
        assert!(out.contains("Repositories"));
    }
}
