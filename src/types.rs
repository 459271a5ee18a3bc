use serde::{Deserialize, Serialize};

/// X11 window id. Valid only while the window exists in the current session;
/// never cached across reconciliation cycles without re-validation.
pub type WindowHandle = u32;

/// Absolute bounding box in root-window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Show state of a window, serialized as an integer in saved placements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WindowState {
    Restored = 0,
    Minimized = 1,
    Maximized = 2,
}

impl From<WindowState> for u8 {
    fn from(state: WindowState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for WindowState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WindowState::Restored),
            1 => Ok(WindowState::Minimized),
            2 => Ok(WindowState::Maximized),
            other => Err(format!("invalid window state {other}, expected 0, 1 or 2")),
        }
    }
}

/// A window visible on screen right now. Rebuilt from scratch every
/// enumeration pass; owns nothing beyond the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveWindow {
    pub handle: WindowHandle,
    pub title: String,
    pub process_name: String,
}

impl LiveWindow {
    /// Display label, also used to address windows from the front-end
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.process_name)
    }
}

/// Result of reading a window's placement for saving.
///
/// `normal` is the restore geometry: while the window is maximized it is the
/// box the window would occupy after restoring, not the on-screen box.
/// Minimized windows are not captured as a target state through this path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementSnapshot {
    pub state: WindowState,
    pub normal: Rect,
    pub current: Rect,
}
