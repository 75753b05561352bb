//! Per-cursor configuration.

use serde::{Deserialize, Serialize};

/// Environment variable that turns leak tracking on or off.
pub const TRACK_LEAKS_ENV: &str = "ROWCURSOR_TRACK_LEAKS";

/// Environment variable providing a default cursor label.
pub const LABEL_ENV: &str = "ROWCURSOR_LABEL";

/// Options applied when a cursor is built.
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Human-readable label shown in diagnostics and logs
    pub label: Option<String>,
    /// Register the cursor with the global leak detector while it is open
    pub track_leaks: bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            label: None,
            track_leaks: cfg!(debug_assertions),
        }
    }
}

impl CursorConfig {
    /// Defaults overlaid with `ROWCURSOR_TRACK_LEAKS` and `ROWCURSOR_LABEL`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(TRACK_LEAKS_ENV) {
            match parse_flag(&raw) {
                Some(enabled) => config.track_leaks = enabled,
                None => tracing::warn!(
                    variable = TRACK_LEAKS_ENV,
                    value = %raw,
                    "ignoring unrecognised boolean value"
                ),
            }
        }

        if let Ok(label) = std::env::var(LABEL_ENV) {
            let label = label.trim();
            if !label.is_empty() {
                config.label = Some(label.to_string());
            }
        }

        config
    }

    /// Sets the diagnostic label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enables or disables leak tracking.
    #[must_use]
    pub const fn with_leak_tracking(mut self, enabled: bool) -> Self {
        self.track_leaks = enabled;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
