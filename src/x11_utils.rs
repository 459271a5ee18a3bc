//! X11/EWMH implementation of the window-system capability
//!
//! Talks to the window manager the cooperative way: enumeration through
//! `_NET_CLIENT_LIST`, maximize transitions through `_NET_WM_STATE` client
//! messages, moves through `configure_window`. EWMH has no query for a
//! maximized window's restore geometry, so the backend remembers the last
//! non-maximized geometry it observed per window; window ids are ephemeral
//! and the memory never outlives the session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;

use anyhow::{anyhow, Context};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::x11;
use crate::constants::matching::UNKNOWN_PROCESS;
use crate::errors::Error;
use crate::types::{Rect, WindowHandle};
use crate::winsys::{Placement, WindowSystem};

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub wm_name: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_client_list: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> anyhow::Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            wm_name: conn.intern_atom(false, b"WM_NAME")
                .context("Failed to intern WM_NAME atom")?
                .reply()
                .context("Failed to get reply for WM_NAME atom")?
                .atom,
            net_wm_name: conn.intern_atom(false, b"_NET_WM_NAME")
                .context("Failed to intern _NET_WM_NAME atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_NAME atom")?
                .atom,
            utf8_string: conn.intern_atom(false, b"UTF8_STRING")
                .context("Failed to intern UTF8_STRING atom")?
                .reply()
                .context("Failed to get reply for UTF8_STRING atom")?
                .atom,
            net_wm_pid: conn.intern_atom(false, b"_NET_WM_PID")
                .context("Failed to intern _NET_WM_PID atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_PID atom")?
                .atom,
            net_wm_state: conn.intern_atom(false, b"_NET_WM_STATE")
                .context("Failed to intern _NET_WM_STATE atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_STATE atom")?
                .atom,
            net_wm_state_maximized_vert: conn.intern_atom(false, b"_NET_WM_STATE_MAXIMIZED_VERT")
                .context("Failed to intern _NET_WM_STATE_MAXIMIZED_VERT atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_STATE_MAXIMIZED_VERT atom")?
                .atom,
            net_wm_state_maximized_horz: conn.intern_atom(false, b"_NET_WM_STATE_MAXIMIZED_HORZ")
                .context("Failed to intern _NET_WM_STATE_MAXIMIZED_HORZ atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_STATE_MAXIMIZED_HORZ atom")?
                .atom,
            net_client_list: conn.intern_atom(false, b"_NET_CLIENT_LIST")
                .context("Failed to intern _NET_CLIENT_LIST atom")?
                .reply()
                .context("Failed to get reply for _NET_CLIENT_LIST atom")?
                .atom,
        })
    }
}

pub struct X11WindowSystem {
    conn: RustConnection,
    root: Window,
    atoms: CachedAtoms,
    /// Last non-maximized geometry seen per window, session-only.
    /// Window ids don't survive X server restarts, so this is never persisted.
    normal_rects: RefCell<HashMap<Window, Rect>>,
}

impl X11WindowSystem {
    pub fn connect() -> anyhow::Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11")?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        info!(
            screen = screen_num,
            width = screen.width_in_pixels,
            height = screen.height_in_pixels,
            "Connected to X11"
        );
        let atoms = CachedAtoms::new(&conn)?;
        Ok(Self {
            conn,
            root,
            atoms,
            normal_rects: RefCell::new(HashMap::new()),
        })
    }

    fn client_list(&self) -> anyhow::Result<Vec<Window>> {
        let prop = self
            .conn
            .get_property(
                false,
                self.root,
                self.atoms.net_client_list,
                AtomEnum::WINDOW,
                0,
                u32::MAX,
            )
            .context("Failed to query _NET_CLIENT_LIST property")?
            .reply()
            .context("Failed to get reply for _NET_CLIENT_LIST query")?;
        Ok(prop
            .value32()
            .ok_or_else(|| anyhow!("Invalid return from _NET_CLIENT_LIST"))?
            .collect())
    }

    fn read_title(&self, window: Window) -> anyhow::Result<String> {
        // Prefer the UTF-8 _NET_WM_NAME, fall back to legacy WM_NAME
        let prop = self
            .conn
            .get_property(false, window, self.atoms.net_wm_name, self.atoms.utf8_string, 0, 1024)
            .context(format!("Failed to query _NET_WM_NAME property for window {}", window))?
            .reply()
            .context(format!("Failed to get _NET_WM_NAME reply for window {}", window))?;
        if !prop.value.is_empty() {
            return Ok(String::from_utf8_lossy(&prop.value).into_owned());
        }

        let prop = self
            .conn
            .get_property(false, window, self.atoms.wm_name, AtomEnum::STRING, 0, 1024)
            .context(format!("Failed to query WM_NAME property for window {}", window))?
            .reply()
            .context(format!("Failed to get WM_NAME reply for window {}", window))?;
        Ok(String::from_utf8_lossy(&prop.value).into_owned())
    }

    fn read_pid(&self, window: Window) -> anyhow::Result<Option<u32>> {
        let prop = self
            .conn
            .get_property(false, window, self.atoms.net_wm_pid, AtomEnum::CARDINAL, 0, 1)
            .context(format!("Failed to query _NET_WM_PID property for window {}", window))?
            .reply()
            .context(format!("Failed to get _NET_WM_PID reply for window {}", window))?;
        if prop.value.len() < x11::PID_PROPERTY_SIZE {
            return Ok(None);
        }
        Ok(Some(u32::from_ne_bytes(
            prop.value[0..x11::PID_PROPERTY_SIZE].try_into()?,
        )))
    }

    fn wm_states(&self, window: Window) -> anyhow::Result<Vec<Atom>> {
        let prop = self
            .conn
            .get_property(false, window, self.atoms.net_wm_state, AtomEnum::ATOM, 0, 1024)
            .context(format!("Failed to query _NET_WM_STATE property for window {}", window))?
            .reply()
            .context(format!("Failed to get _NET_WM_STATE reply for window {}", window))?;
        Ok(prop.value32().map(|v| v.collect()).unwrap_or_default())
    }

    /// Window geometry in absolute root coordinates
    fn absolute_geometry(&self, window: Window) -> anyhow::Result<Rect> {
        let geom = self
            .conn
            .get_geometry(window)
            .context(format!("Failed to query geometry for window {}", window))?
            .reply()
            .context(format!("Failed to get geometry reply for window {}", window))?;
        let coords = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)
            .context(format!("Failed to translate coordinates for window {}", window))?
            .reply()
            .context(format!("Failed to get coordinate reply for window {}", window))?;
        Ok(Rect {
            x: coords.dst_x as i32,
            y: coords.dst_y as i32,
            width: geom.width as i32,
            height: geom.height as i32,
        })
    }

    /// Ask the window manager to add or remove both maximize properties
    fn send_maximize_message(&self, window: Window, action: u32) -> anyhow::Result<()> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_: self.atoms.net_wm_state,
            data: ClientMessageData::from([
                action,
                self.atoms.net_wm_state_maximized_horz,
                self.atoms.net_wm_state_maximized_vert,
                x11::SOURCE_PAGER,
                0,
            ]),
        };
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                &event,
            )
            .context(format!("Failed to send _NET_WM_STATE event for window {}", window))?;
        self.conn
            .flush()
            .context("Failed to flush X11 connection after state change")?;
        Ok(())
    }
}

/// Keep the anyhow context chain visible in the typed error
fn os_err(err: anyhow::Error) -> Error {
    Error::os_query(format!("{err:#}"))
}

impl WindowSystem for X11WindowSystem {
    fn list_windows(&self) -> crate::errors::Result<Vec<(WindowHandle, String)>> {
        let windows = self.client_list().map_err(os_err)?;
        let mut result = Vec::with_capacity(windows.len());
        for window in windows {
            // Windows can vanish between the list query and the title query
            match self.read_title(window) {
                Ok(title) => result.push((window, title)),
                Err(e) => {
                    debug!(window = window, error = %format!("{e:#}"), "Skipping window that vanished mid-enumeration");
                }
            }
        }
        Ok(result)
    }

    fn window_title(&self, window: WindowHandle) -> crate::errors::Result<String> {
        self.read_title(window).map_err(os_err)
    }

    fn process_name(&self, window: WindowHandle) -> String {
        let pid = match self.read_pid(window) {
            Ok(Some(pid)) => pid,
            Ok(None) => {
                debug!(window = window, "_NET_WM_PID not set");
                return UNKNOWN_PROCESS.to_string();
            }
            Err(e) => {
                debug!(window = window, error = %format!("{e:#}"), "Failed to read _NET_WM_PID");
                return UNKNOWN_PROCESS.to_string();
            }
        };
        match fs::read_link(format!("/proc/{pid}/exe")) {
            Ok(exe) => exe
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| UNKNOWN_PROCESS.to_string()),
            Err(e) => {
                debug!(window = window, pid = pid, error = %e, "Cannot read process executable link");
                UNKNOWN_PROCESS.to_string()
            }
        }
    }

    fn placement(&self, window: WindowHandle) -> crate::errors::Result<Placement> {
        let current = self.absolute_geometry(window).map_err(os_err)?;
        let states = self.wm_states(window).map_err(os_err)?;
        let maximized = states.contains(&self.atoms.net_wm_state_maximized_vert)
            && states.contains(&self.atoms.net_wm_state_maximized_horz);

        let normal = if maximized {
            self.normal_rects
                .borrow()
                .get(&window)
                .copied()
                .unwrap_or(current)
        } else {
            self.normal_rects.borrow_mut().insert(window, current);
            current
        };

        Ok(Placement {
            maximized,
            normal,
            current,
        })
    }

    fn restore(&self, window: WindowHandle) -> crate::errors::Result<()> {
        self.send_maximize_message(window, x11::NET_WM_STATE_REMOVE)
            .map_err(os_err)
    }

    fn maximize(&self, window: WindowHandle) -> crate::errors::Result<()> {
        self.send_maximize_message(window, x11::NET_WM_STATE_ADD)
            .map_err(os_err)
    }

    fn set_bounds(&self, window: WindowHandle, bounds: Rect) -> crate::errors::Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new()
                    .x(bounds.x)
                    .y(bounds.y)
                    .width(bounds.width.max(1) as u32)
                    .height(bounds.height.max(1) as u32),
            )
            .context(format!("Failed to configure window {}", window))
            .map_err(os_err)?;
        self.conn
            .flush()
            .context("Failed to flush X11 connection after move")
            .map_err(os_err)?;
        Ok(())
    }

    fn raise(&self, window: WindowHandle) -> crate::errors::Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
            )
            .context(format!("Failed to raise window {} to top of stack", window))
            .map_err(os_err)?;
        self.conn
            .map_window(window)
            .context(format!("Failed to map window {}", window))
            .map_err(os_err)?;
        self.conn
            .flush()
            .context("Failed to flush X11 connection after raise")
            .map_err(os_err)?;
        Ok(())
    }
}
