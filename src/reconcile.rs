//! Periodic placement reconciliation
//!
//! One pass per tick: enumerate the live windows, pair each against every
//! saved record, and correct any divergence. The pass is idempotent; a window
//! already where its record says costs one placement query and a redundant
//! move, so running every second does not fight the user.

use tracing::{debug, error, info};

use crate::capture;
use crate::enumerate;
use crate::errors::{Error, Result};
use crate::matching;
use crate::persistence::{PlacementStore, WindowRecord};
use crate::types::{LiveWindow, WindowHandle, WindowState};
use crate::winsys::WindowSystem;

/// What one reconciliation pass saw, for front-ends to render
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// Live windows, sorted by title
    pub live: Vec<LiveWindow>,
    /// The caller's previously selected label, if that window is still present
    pub highlighted: Option<String>,
}

/// Owns the placement store and the window-system handle. Front-ends get
/// data snapshots out of `tick`; nothing shares mutable state with the loop.
pub struct Reconciler<W: WindowSystem> {
    winsys: W,
    store: PlacementStore,
    exclude_prefix: String,
}

impl<W: WindowSystem> Reconciler<W> {
    pub fn new(winsys: W, store: PlacementStore, exclude_prefix: impl Into<String>) -> Self {
        Self {
            winsys,
            store,
            exclude_prefix: exclude_prefix.into(),
        }
    }

    pub fn store(&self) -> &PlacementStore {
        &self.store
    }

    /// Fresh snapshot of the live windows, without reconciling anything
    pub fn live_windows(&self) -> Result<Vec<LiveWindow>> {
        enumerate::list_windows(&self.winsys, &self.exclude_prefix)
    }

    /// Run one reconciliation pass.
    ///
    /// Placement failures are isolated per window: logged, skipped, and the
    /// pass continues. Only an enumeration failure aborts the whole tick.
    pub fn tick(&mut self, selected_label: Option<&str>) -> Result<TickOutcome> {
        let live = self.live_windows()?;

        for window in &live {
            for (key, record) in self.store.iter() {
                if !matching::matches(window, record) {
                    continue;
                }
                debug!(
                    window = window.handle,
                    key = %key,
                    title = %window.title,
                    "Live window matches saved placement"
                );
                if let Err(e) = apply_placement(&self.winsys, window.handle, record) {
                    error!(
                        window = window.handle,
                        title = %window.title,
                        error = %e,
                        "Failed to apply placement, skipping window"
                    );
                }
            }
        }

        let highlighted = selected_label
            .filter(|selected| live.iter().any(|w| w.label() == *selected))
            .map(str::to_string);

        Ok(TickOutcome { live, highlighted })
    }

    /// Capture the placement of the live window with this exact title (or
    /// display label) and save it under a fresh key.
    ///
    /// A capture failure aborts without touching the store. A persistence
    /// failure surfaces with the in-memory record retained, so a retry of
    /// `save()` can still succeed.
    pub fn save_window(&mut self, title: &str) -> Result<(String, WindowRecord)> {
        let live = self.live_windows()?;
        let handle = live
            .iter()
            .find(|w| w.title == title)
            .or_else(|| live.iter().find(|w| w.label() == title))
            .map(|w| w.handle)
            .ok_or_else(|| Error::NotFound {
                kind: "live",
                label: title.to_string(),
            })?;

        // Re-read identity through the handle; the list text can be a tick stale
        let current_title = self.winsys.window_title(handle)?;
        let process_name = self.winsys.process_name(handle);
        let snapshot = capture::capture(&self.winsys, handle)?;
        debug!(
            window = handle,
            state = ?snapshot.state,
            current = ?snapshot.current,
            "Captured window placement"
        );
        let record = capture::to_record(snapshot, current_title, process_name);
        let key = self.store.insert(record.clone());
        self.store.save()?;
        info!(key = %key, title = %record.title, state = ?record.state, "Saved window placement");
        Ok((key, record))
    }

    /// Remove the saved placement rendering this label. Exactly one record
    /// goes away even when several render the same label.
    pub fn remove_saved(&mut self, label: &str) -> Result<()> {
        let key = self
            .store
            .remove_by_label(label)
            .ok_or_else(|| Error::NotFound {
                kind: "saved",
                label: label.to_string(),
            })?;
        self.store.save()?;
        info!(key = %key, label = %label, "Removed saved placement");
        Ok(())
    }
}

/// Apply one saved placement to one live window. Idempotent; safe to call
/// every tick even when the window is already correctly placed.
pub fn apply_placement(
    winsys: &impl WindowSystem,
    window: WindowHandle,
    record: &WindowRecord,
) -> Result<()> {
    let placement = winsys.placement(window)?;

    // An absolute move targets the restored frame; moving a maximized window
    // is ill-defined, so leave the maximized state first.
    if placement.maximized {
        winsys.restore(window)?;
    }
    winsys.set_bounds(window, record.rect())?;
    winsys.raise(window)?;
    if record.state == WindowState::Maximized {
        winsys.maximize(window)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;
    use crate::winsys::fake::{FakeWindowSystem, Op};

    fn record(title: &str, process_name: &str, rect: Rect, state: WindowState) -> WindowRecord {
        WindowRecord {
            title: title.to_string(),
            process_name: process_name.to_string(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            state,
        }
    }

    fn rect(x: i32, y: i32, width: i32, height: i32) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    fn store_with(records: Vec<WindowRecord>) -> (PlacementStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlacementStore::load(dir.path().join("positions.json")).unwrap();
        for rec in records {
            store.insert(rec);
        }
        (store, dir)
    }

    #[test]
    fn test_tick_moves_window_matching_by_title() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(500, 500, 600, 600), false);

        let saved = rect(100, 100, 400, 300);
        let (store, _dir) = store_with(vec![record("Notes", "notes.exe", saved, WindowState::Restored)]);
        let mut reconciler = Reconciler::new(winsys, store, "Placekeeper");

        reconciler.tick(None).unwrap();
        let win = reconciler.winsys.window(1);
        assert_eq!(win.normal, saved);
        assert!(!win.maximized);
    }

    #[test]
    fn test_tick_restores_positions_then_maximizes() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(500, 500, 600, 600), false);

        let saved = rect(0, 0, 800, 600);
        let (store, _dir) = store_with(vec![record("Notes", "notes.exe", saved, WindowState::Maximized)]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        reconciler.tick(None).unwrap();
        let win = reconciler.winsys.window(1);
        assert_eq!(win.normal, saved);
        assert!(win.maximized);
        assert_eq!(
            reconciler.winsys.ops_for(1),
            [Op::SetBounds(saved), Op::Raise, Op::Maximize]
        );
    }

    #[test]
    fn test_apply_placement_restores_a_maximized_window_before_moving() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(500, 500, 600, 600), true);

        let saved = record("Notes", "notes.exe", rect(100, 100, 400, 300), WindowState::Restored);
        apply_placement(&winsys, 1, &saved).unwrap();

        let win = winsys.window(1);
        assert_eq!(win.normal, rect(100, 100, 400, 300));
        assert!(!win.maximized);
        assert_eq!(
            winsys.ops_for(1),
            [Op::Restore, Op::SetBounds(rect(100, 100, 400, 300)), Op::Raise]
        );
    }

    #[test]
    fn test_apply_placement_is_idempotent() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(500, 500, 600, 600), false);

        let saved = record("Notes", "notes.exe", rect(0, 0, 800, 600), WindowState::Maximized);
        apply_placement(&winsys, 1, &saved).unwrap();
        let after_first = winsys.window(1);

        apply_placement(&winsys, 1, &saved).unwrap();
        let after_second = winsys.window(1);

        assert_eq!(after_first.normal, after_second.normal);
        assert_eq!(after_first.maximized, after_second.maximized);
    }

    #[test]
    fn test_minimized_state_is_never_actively_applied() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(500, 500, 600, 600), false);

        let saved = record("Notes", "notes.exe", rect(100, 100, 400, 300), WindowState::Minimized);
        apply_placement(&winsys, 1, &saved).unwrap();

        // Positioned and raised like a restored window; no extra transition
        assert_eq!(
            winsys.ops_for(1),
            [Op::SetBounds(rect(100, 100, 400, 300)), Op::Raise]
        );
    }

    #[test]
    fn test_tick_isolates_failing_window() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Broken", "broken.exe", rect(0, 0, 100, 100), false);
        winsys.add_window(2, "Notes", "notes.exe", rect(500, 500, 600, 600), false);
        winsys.fail_window(1);

        let (store, _dir) = store_with(vec![
            record("Broken", "broken.exe", rect(10, 10, 200, 200), WindowState::Restored),
            record("Notes", "notes.exe", rect(100, 100, 400, 300), WindowState::Restored),
        ]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        // The failing window must not abort the pass
        let outcome = reconciler.tick(None).unwrap();
        assert_eq!(outcome.live.len(), 2);
        assert_eq!(reconciler.winsys.window(2).normal, rect(100, 100, 400, 300));
    }

    #[test]
    fn test_tick_applies_every_matching_record_in_key_order() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(500, 500, 600, 600), false);

        // Two records match the same window; the later key wins
        let _dir = tempfile::tempdir().unwrap();
        let mut store = PlacementStore::load(_dir.path().join("positions.json")).unwrap();
        let mut keys: Vec<String> = vec![
            store.insert(record("Notes", "notes.exe", rect(10, 10, 100, 100), WindowState::Restored)),
            store.insert(record("Notes", "notes.exe", rect(20, 20, 200, 200), WindowState::Restored)),
        ];
        keys.sort();
        let winning = store.get(&keys[1]).unwrap().rect();

        let mut reconciler = Reconciler::new(winsys, store, "");
        reconciler.tick(None).unwrap();
        assert_eq!(reconciler.winsys.window(1).normal, winning);
    }

    #[test]
    fn test_tick_preserves_selection_while_window_lives() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(0, 0, 100, 100), false);

        let (store, _dir) = store_with(vec![]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        let outcome = reconciler.tick(Some("Notes (notes.exe)")).unwrap();
        assert_eq!(outcome.highlighted.as_deref(), Some("Notes (notes.exe)"));

        let outcome = reconciler.tick(Some("Gone (gone.exe)")).unwrap();
        assert_eq!(outcome.highlighted, None);
    }

    #[test]
    fn test_save_window_round_trip() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(100, 100, 400, 300), true);

        let (store, _dir) = store_with(vec![]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        let (_, saved) = reconciler.save_window("Notes").unwrap();
        assert_eq!(saved.rect(), rect(100, 100, 400, 300));
        assert_eq!(saved.state, WindowState::Maximized);

        // Drag the window elsewhere and un-maximize it; the next tick puts
        // both the geometry and the maximized state back.
        {
            let winsys = &reconciler.winsys;
            winsys.restore(1).unwrap();
            winsys.set_bounds(1, rect(700, 700, 300, 200)).unwrap();
        }
        reconciler.tick(None).unwrap();
        let win = reconciler.winsys.window(1);
        assert_eq!(win.normal, rect(100, 100, 400, 300));
        assert!(win.maximized);
    }

    #[test]
    fn test_save_window_vanished() {
        let winsys = FakeWindowSystem::new();
        let (store, _dir) = store_with(vec![]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        assert!(matches!(
            reconciler.save_window("Notes"),
            Err(Error::NotFound { kind: "live", .. })
        ));
    }

    #[test]
    fn test_save_window_capture_failure_leaves_store_untouched() {
        let winsys = FakeWindowSystem::new();
        winsys.add_window(1, "Notes", "notes.exe", rect(0, 0, 100, 100), false);
        winsys.fail_window(1);

        let (store, _dir) = store_with(vec![]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        assert!(matches!(
            reconciler.save_window("Notes"),
            Err(Error::OsQuery { .. })
        ));
        assert!(reconciler.store().is_empty());
    }

    #[test]
    fn test_remove_saved_unknown_label() {
        let winsys = FakeWindowSystem::new();
        let (store, _dir) = store_with(vec![]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        assert!(matches!(
            reconciler.remove_saved("Notes (notes.exe)"),
            Err(Error::NotFound { kind: "saved", .. })
        ));
    }

    #[test]
    fn test_remove_saved_removes_one_record() {
        let winsys = FakeWindowSystem::new();
        let (store, _dir) = store_with(vec![
            record("Notes", "notes.exe", rect(0, 0, 100, 100), WindowState::Restored),
        ]);
        let mut reconciler = Reconciler::new(winsys, store, "");

        reconciler.remove_saved("Notes (notes.exe)").unwrap();
        assert!(reconciler.store().is_empty());
    }
}
