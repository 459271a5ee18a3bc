//! Live window enumeration
//!
//! Normalizes the window manager's client list into `LiveWindow` descriptors:
//! untitled windows and our own windows are dropped, process names are
//! resolved, and the result is sorted by title for stable display. The
//! reconciliation loop itself does not depend on the order.

use crate::errors::Result;
use crate::types::LiveWindow;
use crate::winsys::WindowSystem;

pub fn list_windows(winsys: &impl WindowSystem, exclude_prefix: &str) -> Result<Vec<LiveWindow>> {
    let mut live = Vec::new();
    for (handle, title) in winsys.list_windows()? {
        if title.is_empty() {
            continue;
        }
        if !exclude_prefix.is_empty() && title.starts_with(exclude_prefix) {
            continue;
        }
        let process_name = winsys.process_name(handle);
        live.push(LiveWindow {
            handle,
            title,
            process_name,
        });
    }
    live.sort_by_key(|w| w.title.to_lowercase());
    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;
    use crate::winsys::fake::FakeWindowSystem;

    fn rect() -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        }
    }

    #[test]
    fn test_drops_untitled_windows() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "", "mystery.exe", rect(), false);
        winsys.add_window(2, "Notes", "notes.exe", rect(), false);

        let live = list_windows(&winsys, "Placekeeper").unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].title, "Notes");
    }

    #[test]
    fn test_drops_own_windows_by_title_prefix() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Placekeeper - saved placements", "placekeeper", rect(), false);
        winsys.add_window(2, "Notes", "notes.exe", rect(), false);

        let live = list_windows(&winsys, "Placekeeper").unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].title, "Notes");
    }

    #[test]
    fn test_sorted_by_title_case_insensitively() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "zeta", "z.exe", rect(), false);
        winsys.add_window(2, "Alpha", "a.exe", rect(), false);
        winsys.add_window(3, "beta", "b.exe", rect(), false);

        let live = list_windows(&winsys, "").unwrap();
        let titles: Vec<&str> = live.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_resolves_process_names() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(), false);

        let live = list_windows(&winsys, "").unwrap();
        assert_eq!(live[0].process_name, "notes.exe");
        assert_eq!(live[0].label(), "Notes (notes.exe)");
    }
}
