//! Small helpers shared by the pipeline.
//!
//! IMPORTANT:
//! - No pipeline or transport logic should live here.

use chrono::{SecondsFormat, Utc};

/// Returns the current UTC time as an RFC3339 string.
///
/// Used to stamp every dead letter at the moment the failure
/// is detected.
///
/// Example: "2026-10-18T09:41:07Z"
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
