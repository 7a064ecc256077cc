use crate::types::ScanReport;

/// Pretty-printed JSON document of the whole report.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json(report: &ScanReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
