// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// This is a direct mapping of the config format:
///
/// ```toml
/// [driver]
/// binary = "tauri-driver"
/// args = ["--port", "4444"]
/// ready_marker = "Listening on"
/// startup_timeout = "30s"
///
/// [run]
/// cmd = "npm test"
/// ```
///
/// This is the raw shape; it only reflects what TOML deserialization gives
/// us. Use [`ConfigFile`] (via `TryFrom`) for the validated form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Driver settings from `[driver]`.
    pub driver: DriverSection,

    /// Optional wrapped command from `[run]`.
    #[serde(default)]
    pub run: RunSection,
}

/// `[driver]` section, raw form.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverSection {
    /// Path or name of the driver binary to spawn.
    pub binary: String,

    /// Arguments passed to the driver binary.
    #[serde(default)]
    pub args: Vec<String>,

    /// Substring that signals readiness when it appears on any stdout line.
    pub ready_marker: String,

    /// Duration string (e.g. `"30s"`, `"500ms"`) bounding how long `start()`
    /// waits for the readiness marker.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout: String,
}

fn default_startup_timeout() -> String {
    "30s".to_string()
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunSection {
    /// Command to run once the driver is ready. Trailing CLI arguments
    /// override this.
    #[serde(default)]
    pub cmd: Option<String>,
}

/// Validated configuration.
///
/// Constructed from [`RawConfigFile`] via `TryFrom` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Everything the supervisor needs to run one driver binary.
    pub driver: DriverConfig,

    /// Wrapped-command settings.
    pub run: RunSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(driver: DriverConfig, run: RunSection) -> Self {
        Self { driver, run }
    }
}

/// Supervisor configuration for a single driver binary.
///
/// All fields are fixed at construction; the supervisor takes this by value
/// and never reads configuration from anywhere else.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub binary: String,
    pub args: Vec<String>,
    pub ready_marker: String,
    pub startup_timeout: Duration,
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn parse_duration_tolerates_whitespace_and_case() {
        assert_eq!(parse_duration(" 5s "), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("10MS"), Ok(Duration::from_millis(10)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("s30").is_err());
        assert!(parse_duration("10banana").is_err());
    }
}
