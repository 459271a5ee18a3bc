//! Application-wide constants
//!
//! Single source of truth for magic numbers and string literals used
//! throughout the application.

/// Configuration file locations
pub mod config {
    /// Directory under the user config dir holding all placekeeper files
    pub const APP_DIR: &str = "placekeeper";

    /// Runtime settings file name
    pub const SETTINGS_FILENAME: &str = "config.json";

    /// Saved window placements file name
    pub const POSITIONS_FILENAME: &str = "positions.json";
}

/// Identity matching constants
pub mod matching {
    /// Sentinel process name for windows whose owning process could not be
    /// resolved. Two records carrying the sentinel never match through it.
    pub const UNKNOWN_PROCESS: &str = "unknown";
}

/// X11/EWMH protocol constants
pub mod x11 {
    /// _NET_WM_STATE client message action: remove the property
    pub const NET_WM_STATE_REMOVE: u32 = 0;

    /// _NET_WM_STATE client message action: add the property
    pub const NET_WM_STATE_ADD: u32 = 1;

    /// Source indication for EWMH client messages (2 = pager/direct user action)
    pub const SOURCE_PAGER: u32 = 2;

    /// Size of PID property value in bytes
    pub const PID_PROPERTY_SIZE: usize = 4;
}

/// Settings validation limits
pub mod validation {
    /// Shortest allowed reconciliation period in milliseconds
    pub const MIN_TICK_INTERVAL_MS: u64 = 100;

    /// Longest allowed reconciliation period in milliseconds
    pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;
}
