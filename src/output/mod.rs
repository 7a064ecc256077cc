pub mod json;
pub mod tab;
pub mod text;

pub use json::to_json;
pub use tab::{TabStyle, format_tab};
pub use text::{TextOptions, format_text};

/// One-word summary of a status snapshot in either form.
pub(crate) fn status_summary(status: Option<&str>) -> &'static str {
    let Some(status) = status else {
        return "n/a";
    };
    let porcelain = status.starts_with("##");
    let dirty = if porcelain {
        status
            .lines()
            .any(|line| !line.is_empty() && !line.starts_with("##"))
    } else {
        !status.contains("nothing to commit")
    };
    if dirty { "changes" } else { "clean" }
}
