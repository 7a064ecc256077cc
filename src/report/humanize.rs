use std::time::Duration;

use chrono::{DateTime, Local};

const SEC_PER_MIN: u64 = 60;
const SEC_PER_HOUR: u64 = 60 * 60;
const SEC_PER_DAY: u64 = 60 * 60 * 24;

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn humanize_age(dur: Duration) -> String {
    let secs = dur.as_secs();
    if secs < SEC_PER_HOUR {
        let mins = secs as f64 / SEC_PER_MIN as f64;
        format!("{mins:.1} min")
    } else if secs < SEC_PER_DAY {
        let hrs = secs as f64 / SEC_PER_HOUR as f64;
        format!("{hrs:.1} hr")
    } else {
        let days = secs as f64 / SEC_PER_DAY as f64;
        format!("{days:.1} days")
    }
}

/// Age of `then` relative to `now`, or `"never"` when there is no timestamp.
///
/// Timestamps in the future (clock skew) read as zero.
#[must_use]
pub fn humanize_since(then: Option<DateTime<Local>>, now: DateTime<Local>) -> String {
    match then {
        Some(then) => {
            let age = (now - then).to_std().unwrap_or_default();
            format!("{} ago", humanize_age(age))
        }
        None => "never".to_string(),
    }
}
