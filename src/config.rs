//! System configuration constants and environment variable parsing.
//!
//! Every tunable has a compiled-in default; environment variables only
//! override it when they parse and pass validation.

use std::path::PathBuf;
use std::str::FromStr;

/// ESPN men's college basketball teams endpoint (groups=50 is Division I)
pub const ESPN_TEAMS_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/basketball/mens-college-basketball/teams?groups=50&limit=1000";

/// Default minimum fuzzy score (0-100) for a fuzzy-tier match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 85.0;

/// Roster snapshot lifetime before it is considered stale (24 hours)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// HTTP timeout for a single roster fetch
pub const PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Read and parse an environment variable; `None` if unset or unparsable
pub fn env_var_parsed<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Read a boolean flag ("1"/"true"/"yes" or "0"/"false"/"no"); `None` if unset or unrecognized
pub fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Roster endpoint from ESPN_TEAMS_URL, or the Division I default
pub fn espn_teams_url() -> String {
    std::env::var("ESPN_TEAMS_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| ESPN_TEAMS_URL.to_string())
}

/// Local roster file from ROSTER_FILE (used instead of the network when set)
pub fn roster_file_from_env() -> Option<PathBuf> {
    std::env::var("ROSTER_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}
