//! Runtime settings
//!
//! One small JSON file under the user config dir. A missing file means
//! defaults; a file with syntax errors is fatal rather than silently ignored,
//! so a typo never turns into mystery behavior.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Reconciliation period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Windows whose titles start with this prefix are never enumerated or
    /// touched; keeps the manager's own front-end out of its own store
    #[serde(default = "default_exclude_title_prefix")]
    pub exclude_title_prefix: String,

    /// Override for the saved-placements file location
    #[serde(default)]
    pub positions_file: Option<PathBuf>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_exclude_title_prefix() -> String {
    "Placekeeper".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            exclude_title_prefix: default_exclude_title_prefix(),
            positions_file: None,
        }
    }
}

impl Settings {
    fn settings_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(constants::config::APP_DIR);
        path.push(constants::config::SETTINGS_FILENAME);
        path
    }

    /// Location of the saved-placements file, honoring the override
    pub fn positions_path(&self) -> PathBuf {
        self.positions_file.clone().unwrap_or_else(|| {
            let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(constants::config::APP_DIR);
            path.push(constants::config::POSITIONS_FILENAME);
            path
        })
    }

    pub fn load() -> Self {
        let path = Self::settings_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(mut settings) => {
                    info!(path = %path.display(), "Loaded settings");
                    settings.validate_and_clamp();
                    settings
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to parse settings file");
                    error!(path = %path.display(), "Please fix the syntax errors in your settings file.");
                    std::process::exit(1);
                }
            },
            Err(_) => {
                info!(path = %path.display(), "No settings file found, using defaults");
                Settings::default()
            }
        }
    }

    /// Validate and clamp settings to safe ranges
    fn validate_and_clamp(&mut self) {
        use crate::constants::validation::*;

        if self.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            warn!(
                tick_interval_ms = self.tick_interval_ms,
                min = MIN_TICK_INTERVAL_MS,
                "tick_interval_ms below minimum, clamping"
            );
            self.tick_interval_ms = MIN_TICK_INTERVAL_MS;
        } else if self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            warn!(
                tick_interval_ms = self.tick_interval_ms,
                max = MAX_TICK_INTERVAL_MS,
                "tick_interval_ms exceeds maximum, clamping"
            );
            self.tick_interval_ms = MAX_TICK_INTERVAL_MS;
        }
    }
}
