//! JSON serialization for diffusion analysis summaries.

use crate::analysis::DiffusionSummary;

/// Serialize a summary to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// DiffusionSummary).
pub fn to_json(summary: &DiffusionSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string(summary)
}

/// Serialize a summary to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// DiffusionSummary).
pub fn to_json_pretty(summary: &DiffusionSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
