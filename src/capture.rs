//! Reading a window's true placement for saving
//!
//! The generic geometry query reports the maximized frame while a window is
//! maximized. The restore geometry only comes back through the placement
//! query's normal rect, so capturing a maximized window must go through that
//! path or the saved box would be the whole work area.

use crate::errors::Result;
use crate::persistence::WindowRecord;
use crate::types::{PlacementSnapshot, WindowHandle, WindowState};
use crate::winsys::WindowSystem;

/// Read the window's normalized geometry and show state. No side effect on
/// the window; a failed query surfaces without touching anything.
pub fn capture(winsys: &impl WindowSystem, window: WindowHandle) -> Result<PlacementSnapshot> {
    let placement = winsys.placement(window)?;
    Ok(PlacementSnapshot {
        state: if placement.maximized {
            WindowState::Maximized
        } else {
            WindowState::Restored
        },
        normal: if placement.maximized {
            placement.normal
        } else {
            placement.current
        },
        current: placement.current,
    })
}

pub fn to_record(
    snapshot: PlacementSnapshot,
    title: String,
    process_name: String,
) -> WindowRecord {
    WindowRecord {
        title,
        process_name,
        x: snapshot.normal.x,
        y: snapshot.normal.y,
        width: snapshot.normal.width,
        height: snapshot.normal.height,
        state: snapshot.state,
    }
}
