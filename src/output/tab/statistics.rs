use tabled::builder::Builder;

use crate::types::ScanReport;

use super::{
    TabStyle,
    style::{align_right, apply_style, apply_title_line},
};

pub(crate) fn render(report: &ScanReport, style: TabStyle) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    builder.push_record(["Base".to_string(), report.base_dir.display().to_string()]);
    builder.push_record(["Repositories".to_string(), report.total_repositories.to_string()]);
    builder.push_record(["Queued commits".to_string(), report.total_queued_commits.to_string()]);
    builder.push_record(["Skipped".to_string(), report.skipped.to_string()]);
    for path in &report.flagged_paths {
        builder.push_record(["Flagged".to_string(), path.display().to_string()]);
    }

    let mut table = builder.build();
    apply_style(&mut table, style);
    align_right(&mut table, 1..2);
    apply_title_line(&mut table, "Statistics");
    table.to_string()
}
