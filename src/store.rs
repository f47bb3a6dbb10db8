//! Preset store: the current snapshot and the saved preset list, persisted
//! in a flat key-value store.
//!
//! Both entries are read once when the store is opened. The current snapshot
//! is written back on every change; the preset list is rewritten in full on
//! every add, rename and delete.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::StoreError;
use crate::params::ParameterSnapshot;

pub const CURRENT_STATE_KEY: &str = "sfxia_current_state";
pub const SAVED_EFFECTS_KEY: &str = "sfxia_saved_effects";

// ── Backends ────────────────────────────────────────────────

/// A flat string-to-string store (browser `localStorage`, a JSON file, …).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-process store. Used by tests and by hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(feature = "native")]
pub use file::FileStore;

#[cfg(feature = "native")]
mod file {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::KeyValueStore;
    use crate::error::StoreError;

    /// A JSON object on disk, rewritten on every `set`.
    #[derive(Debug)]
    pub struct FileStore {
        path: PathBuf,
        entries: BTreeMap<String, String>,
    }

    impl FileStore {
        /// Open (or lazily create) the store at `path`.
        pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
            let path = path.as_ref().to_path_buf();
            let entries = match fs::read_to_string(&path) {
                Ok(text) => serde_json::from_str(&text)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
                Err(e) => return Err(e.into()),
            };
            Ok(FileStore { path, entries })
        }

        /// Open the store in the platform data directory.
        pub fn open_default() -> Result<Self, StoreError> {
            let dirs = directories::ProjectDirs::from("net", "sfxia", "sfxia")
                .ok_or(StoreError::NoDataDir)?;
            Self::open(dirs.data_dir().join("store.json"))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Option<String> {
            self.entries.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            self.entries.insert(key.to_string(), value);
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
            Ok(())
        }
    }
}

// ── Presets ─────────────────────────────────────────────────

/// A named, saved snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub name: String,
    pub snapshot: ParameterSnapshot,
}

/// On-disk form of a preset: the snapshot travels as JSON text.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPreset {
    name: String,
    data: String,
}

/// The current snapshot plus a counter bumped on every change, so hosts can
/// tell when to redraw or re-export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentState {
    pub snapshot: ParameterSnapshot,
    pub version: u64,
}

pub struct PresetStore<S: KeyValueStore> {
    store: S,
    current: CurrentState,
    presets: Vec<Preset>,
}

impl<S: KeyValueStore> PresetStore<S> {
    /// Load the current snapshot and preset list from `store`.
    ///
    /// Unreadable entries fall back to defaults (current state) or are
    /// skipped (individual presets).
    pub fn open(store: S) -> Self {
        let mut snapshot = ParameterSnapshot::default();
        if let Some(text) = store.get(CURRENT_STATE_KEY) {
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&text) {
                Ok(entries) => {
                    snapshot.merge_json(&entries);
                }
                Err(e) => log::warn!("ignoring unreadable current state: {e}"),
            }
        }

        let mut presets = Vec::new();
        if let Some(text) = store.get(SAVED_EFFECTS_KEY) {
            match serde_json::from_str::<Vec<StoredPreset>>(&text) {
                Ok(stored) => {
                    for item in stored {
                        match serde_json::from_str::<ParameterSnapshot>(&item.data) {
                            Ok(snapshot) => presets.push(Preset {
                                name: item.name,
                                snapshot,
                            }),
                            Err(e) => log::warn!("skipping preset {:?}: {e}", item.name),
                        }
                    }
                }
                Err(e) => log::warn!("ignoring unreadable preset list: {e}"),
            }
        }

        log::debug!("opened preset store with {} preset(s)", presets.len());

        PresetStore {
            store,
            current: CurrentState {
                snapshot,
                version: 0,
            },
            presets,
        }
    }

    pub fn current(&self) -> &ParameterSnapshot {
        &self.current.snapshot
    }

    pub fn state(&self) -> CurrentState {
        self.current
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Index of the first preset called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.presets.iter().position(|p| p.name == name)
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    // ── current snapshot ────────────────────────────────────

    /// Set one parameter. Returns `Ok(false)` for an unknown id.
    pub fn set_parameter(&mut self, id: &str, value: f64) -> Result<bool, StoreError> {
        let mut next = self.current.snapshot;
        if !next.set(id, value) {
            return Ok(false);
        }
        self.replace_current(next)?;
        Ok(true)
    }

    /// Replace the whole current snapshot and persist it.
    pub fn replace_current(&mut self, snapshot: ParameterSnapshot) -> Result<(), StoreError> {
        self.current = CurrentState {
            snapshot,
            version: self.current.version + 1,
        };
        self.store
            .set(CURRENT_STATE_KEY, serde_json::to_string(&snapshot)?)
    }

    /// Randomize every parameter.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ParameterSnapshot, StoreError> {
        let snapshot = ParameterSnapshot::random(rng);
        self.replace_current(snapshot)?;
        Ok(snapshot)
    }

    /// The share token for the current snapshot.
    pub fn export_token(&self) -> String {
        codec::encode(&self.current.snapshot)
    }

    /// Apply a pasted share token over the current snapshot.
    ///
    /// Fails softly: malformed text leaves the state untouched and returns
    /// `Ok(false)`. Tokens may carry a subset of ids; only those are applied.
    pub fn import_token(&mut self, text: &str) -> Result<bool, StoreError> {
        let entries = match codec::decode_entries(text) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("import ignored: {e}");
                return Ok(false);
            }
        };
        let mut next = self.current.snapshot;
        if next.merge_json(&entries) > 0 {
            self.replace_current(next)?;
        }
        Ok(true)
    }

    // ── preset list ─────────────────────────────────────────

    /// Save the current snapshot at the end of the list. Without a name the
    /// preset is called `SFX #n`. Returns the new preset's index.
    pub fn save_current(&mut self, name: Option<&str>) -> Result<usize, StoreError> {
        let name = match name {
            Some(n) => n.to_string(),
            None => format!("SFX #{}", self.presets.len() + 1),
        };
        self.presets.push(Preset {
            name,
            snapshot: self.current.snapshot,
        });
        self.persist_presets()?;
        Ok(self.presets.len() - 1)
    }

    pub fn rename(&mut self, index: usize, name: &str) -> Result<(), StoreError> {
        let len = self.presets.len();
        let preset = self
            .presets
            .get_mut(index)
            .ok_or(StoreError::NoSuchPreset { index, len })?;
        preset.name = name.to_string();
        self.persist_presets()
    }

    pub fn delete(&mut self, index: usize) -> Result<Preset, StoreError> {
        self.check_index(index)?;
        let removed = self.presets.remove(index);
        self.persist_presets()?;
        Ok(removed)
    }

    /// Make a saved preset the current snapshot.
    pub fn load(&mut self, index: usize) -> Result<ParameterSnapshot, StoreError> {
        self.check_index(index)?;
        let snapshot = self.presets[index].snapshot;
        self.replace_current(snapshot)?;
        Ok(snapshot)
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index < self.presets.len() {
            Ok(())
        } else {
            Err(StoreError::NoSuchPreset {
                index,
                len: self.presets.len(),
            })
        }
    }

    fn persist_presets(&mut self) -> Result<(), StoreError> {
        let stored = self
            .presets
            .iter()
            .map(|p| StoredPreset {
                name: p.name.clone(),
                data: codec::to_json(&p.snapshot),
            })
            .collect::<Vec<_>>();
        self.store
            .set(SAVED_EFFECTS_KEY, serde_json::to_string(&stored)?)
    }
}
