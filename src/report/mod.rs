mod collector;
mod humanize;
mod repository;

pub use collector::{collect_report, collect_report_for_dirs};
pub use humanize::{humanize_age, humanize_since};
