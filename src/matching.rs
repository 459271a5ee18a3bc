//! Window identity matching
//!
//! Decides whether a window on screen corresponds to a saved placement.
//! Window handles are useless for this: they change whenever a window or the
//! session restarts. What survives is the title and the owning process name.

use crate::constants::matching::UNKNOWN_PROCESS;
use crate::persistence::WindowRecord;
use crate::types::LiveWindow;

/// A live window matches a saved record when the titles are exactly equal,
/// or when the process names are equal and carry real content.
///
/// Titles are the most specific signal but change with document state; the
/// process name is stable but shared by every window of the process. A saved
/// record whose process resolution failed holds the unknown sentinel, and
/// must never match another unresolved window through it.
pub fn matches(live: &LiveWindow, saved: &WindowRecord) -> bool {
    if live.title == saved.title {
        return true;
    }
    saved.process_name != UNKNOWN_PROCESS && live.process_name == saved.process_name
}
