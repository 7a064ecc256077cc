//! Decoding of `git log` output written with two control-byte separators.
//!
//! Fields within a commit are joined by [`FIELD_SEP`], commits are terminated by
//! [`RECORD_SEP`]. Neither byte can appear in a one-line subject, which keeps the
//! format unambiguous without quoting.

use tracing::debug;

use crate::types::CommitRecord;

pub const FIELD_SEP: char = '\u{1f}';
pub const RECORD_SEP: char = '\u{1e}';

/// `--format` argument producing id, author name, author email, date and subject.
pub const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%ad%x1f%s%x1e";

const FIELD_COUNT: usize = 5;

/// Parse raw log bytes into commit records, newest first as emitted.
///
/// Blocks with the wrong number of fields or an empty id are dropped; truncated output
/// never fails the parse.
#[must_use]
pub fn parse_log(raw: &[u8]) -> Vec<CommitRecord> {
    let text = String::from_utf8_lossy(raw);
    text.split(RECORD_SEP)
        .map(|block| block.trim_matches(|c| c == '\n' || c == '\r'))
        .filter(|block| !block.is_empty())
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<CommitRecord> {
    let fields: Vec<&str> = block.split(FIELD_SEP).collect();
    let [id, author_name, author_email, date, message] = fields.as_slice() else {
        debug!(
            event = "census.git.log.malformed_block",
            fields = fields.len(),
            expected = FIELD_COUNT
        );
        return None;
    };
    if id.is_empty() {
        debug!(event = "census.git.log.empty_id");
        return None;
    }
    Some(CommitRecord {
        id: (*id).to_string(),
        author_name: (*author_name).to_string(),
        author_email: (*author_email).to_string(),
        date: (*date).to_string(),
        message: (*message).to_string(),
    })
}
