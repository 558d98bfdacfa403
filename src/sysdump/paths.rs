//! Output naming helpers

use crate::config::{TIMESTAMP_PLACEHOLDER, TIME_FORMAT};
use crate::error::{Result, SysdumpError};
use chrono::{DateTime, Utc};

/// Format a run's start time the way it appears in output names
pub fn format_timestamp(start_time: &DateTime<Utc>) -> String {
    start_time.format(TIME_FORMAT).to_string()
}

/// Replace every `<ts>` in `name` with `timestamp`
pub fn substitute_timestamp(name: &str, timestamp: &str) -> String {
    name.replace(TIMESTAMP_PLACEHOLDER, timestamp)
}

/// Drop the first path segment: `"a/b/c"` becomes `"b/c"`, `"/tmp/x"` becomes `"tmp/x"`.
///
/// Used to rebase absolute in-container paths onto the sysdump directory.
pub fn remove_top_directory(path: &str) -> Result<String> {
    match path.split_once('/') {
        Some((_, rest)) => Ok(rest.to_string()),
        None => Err(SysdumpError::InvalidPath(path.to_string())),
    }
}
