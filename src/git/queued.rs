use std::collections::HashSet;

use crate::types::CommitRecord;

/// Log records whose id appears in `ids`, in log order.
///
/// Ids are compared as full hashes; abbreviated ids never match.
#[must_use]
pub fn resolve_queued(ids: &[String], log: &[CommitRecord]) -> Vec<CommitRecord> {
    if ids.is_empty() || log.is_empty() {
        return Vec::new();
    }
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    log.iter()
        .filter(|record| wanted.contains(record.id.as_str()))
        .cloned()
        .collect()
}

/// Split `rev-list` output into commit ids, ignoring blank lines.
#[must_use]
pub fn parse_rev_list(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
