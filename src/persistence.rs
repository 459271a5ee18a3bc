//! Saved window placements and their on-disk form
//!
//! The store is a flat JSON object mapping an opaque generated key to one
//! record per saved window. Keys are UUIDs minted at save time; they carry no
//! meaning beyond identity and stay stable across sessions, unlike window
//! handles. Writes go through a temp file and rename so an interrupted save
//! never corrupts the previous state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::matching::UNKNOWN_PROCESS;
use crate::errors::{Error, Result};
use crate::types::{Rect, WindowState};

/// One saved window placement.
///
/// `x/y/width/height` are the normalized (non-maximized) bounding box, even
/// when `state` is maximized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowRecord {
    pub title: String,
    pub process_name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub state: WindowState,
}

impl WindowRecord {
    /// Display label, mirrors `LiveWindow::label`
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.process_name)
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// A record needs at least one discriminating field with real content,
    /// otherwise matching degenerates to false positives.
    fn has_identity(&self) -> bool {
        !self.title.is_empty()
            || (!self.process_name.is_empty() && self.process_name != UNKNOWN_PROCESS)
    }
}

/// On-disk record shape. Files written before process tracking and state
/// tracking existed lack those two fields; they are legal on read and filled
/// in by [`migrate`], but never written back absent.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub title: String,
    #[serde(default)]
    pub process_name: Option<String>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub state: Option<WindowState>,
}

impl From<WindowRecord> for RawRecord {
    fn from(record: WindowRecord) -> Self {
        RawRecord {
            title: record.title,
            process_name: Some(record.process_name),
            x: record.x,
            y: record.y,
            width: record.width,
            height: record.height,
            state: Some(record.state),
        }
    }
}

/// Upgrade raw records to the current format.
///
/// Missing process names become the unknown sentinel and missing states
/// default to restored, so older records stay matchable and reconcilable.
/// Records that cannot hold their invariants are dropped with a warning.
/// Returns the upgraded mapping and whether anything changed; callers
/// re-persist only in that case, which makes the pass idempotent.
pub fn migrate(raw: BTreeMap<String, RawRecord>) -> (BTreeMap<String, WindowRecord>, bool) {
    let mut changed = false;
    let mut records = BTreeMap::new();

    for (key, rec) in raw {
        if rec.process_name.is_none() || rec.state.is_none() {
            changed = true;
        }
        let record = WindowRecord {
            title: rec.title,
            process_name: rec
                .process_name
                .unwrap_or_else(|| UNKNOWN_PROCESS.to_string()),
            x: rec.x,
            y: rec.y,
            width: rec.width,
            height: rec.height,
            state: rec.state.unwrap_or(WindowState::Restored),
        };

        if record.width <= 0 || record.height <= 0 {
            warn!(
                key = %key,
                title = %record.title,
                width = record.width,
                height = record.height,
                "Dropping saved placement with non-positive size"
            );
            changed = true;
            continue;
        }
        if !record.has_identity() {
            warn!(key = %key, "Dropping saved placement with no usable identity");
            changed = true;
            continue;
        }

        records.insert(key, record);
    }

    (records, changed)
}

/// In-memory collection of saved placements, backed by one JSON file
pub struct PlacementStore {
    path: PathBuf,
    records: BTreeMap<String, WindowRecord>,
}

impl PlacementStore {
    /// Load the store from disk. A missing backing file yields an empty
    /// store, never an error; anything else unreadable is surfaced.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw: BTreeMap<String, RawRecord> = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| Error::persistence(&path, e))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No saved placements yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(Error::persistence(&path, e)),
        };

        let (records, migrated) = migrate(raw);
        let store = Self { path, records };
        if migrated {
            info!(count = store.records.len(), "Upgraded saved placements to the current format");
            store.save()?;
        }
        Ok(store)
    }

    /// Serialize the full mapping, overwriting prior content. Last writer
    /// wins; the write is temp-file-then-rename so a crash mid-write leaves
    /// the previous file intact.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| Error::persistence(&self.path, e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::persistence(&self.path, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::persistence(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::persistence(&self.path, e))?;

        debug!(path = %self.path.display(), count = self.records.len(), "Wrote saved placements");
        Ok(())
    }

    /// Insert a record under a fresh opaque key
    pub fn insert(&mut self, record: WindowRecord) -> String {
        let key = Uuid::new_v4().to_string();
        self.records.insert(key.clone(), record);
        key
    }

    /// Remove the first record (in key order) rendering this label.
    /// Two records can coincidentally render the same label; exactly one
    /// entry is removed.
    pub fn remove_by_label(&mut self, label: &str) -> Option<String> {
        let key = self
            .records
            .iter()
            .find(|(_, record)| record.label() == label)
            .map(|(key, _)| key.clone())?;
        self.records.remove(&key);
        Some(key)
    }

    /// Records in key order. The order is deterministic, which also fixes
    /// the winner when several records match one window: the last match in
    /// key order is applied last.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &WindowRecord)> {
        self.records.iter()
    }

    pub fn get(&self, key: &str) -> Option<&WindowRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
