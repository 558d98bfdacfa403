//! Parsers for gops output

use crate::error::{Result, SysdumpError};
use regex::Regex;
use std::sync::LazyLock;

/// A process listing row whose name column ends with `*`
static GOPS_PID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<pid>\d+)\s+\d+\s+\S*\*(?:\s|$)").expect("valid regex")
});

static GOPS_PROFILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Profile dump saved to: (?P<filepath>.+)").expect("valid regex"));

/// Pid of the first process in a `gops` listing whose name carries a trailing `*`
pub fn extract_gops_pid(output: &str) -> Result<String> {
    output
        .lines()
        .find_map(|line| {
            GOPS_PID_RE
                .captures(line.trim_start())
                .map(|c| c["pid"].to_string())
        })
        .ok_or_else(|| SysdumpError::NotFound {
            what: "gops pid",
            output: output.to_string(),
        })
}

/// Path of the profile written by `gops pprof-cpu` / `gops pprof-heap`
pub fn extract_gops_profile_data(output: &str) -> Result<String> {
    GOPS_PROFILE_RE
        .captures(output)
        .map(|c| c["filepath"].trim().to_string())
        .filter(|path| !path.is_empty())
        .ok_or_else(|| SysdumpError::NotFound {
            what: "profile file path",
            output: output.to_string(),
        })
}
