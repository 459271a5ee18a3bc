//! Window-system access capability
//!
//! Everything the placement core needs from the underlying windowing system,
//! behind one trait. The production implementation lives in `x11_utils`; the
//! reconciliation and capture logic never talks to X11 directly.

use crate::errors::Result;
use crate::types::{Rect, WindowHandle};

/// Placement of a window as reported by the windowing system
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub maximized: bool,
    /// Geometry the window has (or would have) in its restored state
    pub normal: Rect,
    /// On-screen geometry right now
    pub current: Rect,
}

pub trait WindowSystem {
    /// Enumerate the windows currently known to the window manager,
    /// with their titles. Fresh call, fresh truth.
    fn list_windows(&self) -> Result<Vec<(WindowHandle, String)>>;

    fn window_title(&self, window: WindowHandle) -> Result<String>;

    /// Executable name of the owning process, or the unknown sentinel when
    /// it cannot be resolved.
    fn process_name(&self, window: WindowHandle) -> String;

    fn placement(&self, window: WindowHandle) -> Result<Placement>;

    /// Leave the maximized state, returning to the normal geometry
    fn restore(&self, window: WindowHandle) -> Result<()>;

    fn maximize(&self, window: WindowHandle) -> Result<()>;

    /// Move/resize the restored frame to an absolute bounding box
    fn set_bounds(&self, window: WindowHandle, bounds: Rect) -> Result<()>;

    /// Raise to the top of the stacking order and make sure the window is mapped
    fn raise(&self, window: WindowHandle) -> Result<()>;
}
