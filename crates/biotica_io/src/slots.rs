//! Save-slot storage on the local filesystem. One directory per world id,
//! one container file per slot.

use crate::error::{LoadError, Result};
use crate::save::{self, SaveRecord};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SAVE_EXTENSION: &str = "biosave";
pub const DEFAULT_SLOT: &str = "auto";

pub struct SaveStore {
    root: PathBuf,
}

impl SaveStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn slot_path(&self, world_id: Uuid, slot: &str) -> PathBuf {
        self.root
            .join(world_id.to_string())
            .join(format!("{slot}.{SAVE_EXTENSION}"))
    }

    pub fn write(&self, record: &SaveRecord, slot: &str) -> Result<PathBuf> {
        let path = self.slot_path(record.world_id, slot);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let bytes = save::encode(record)?;
        // Write-then-rename so a crash mid-write never corrupts the slot.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    pub fn read(&self, world_id: Uuid, slot: &str) -> Result<SaveRecord> {
        self.read_path(&self.slot_path(world_id, slot))
    }

    pub fn read_path(&self, path: &Path) -> Result<SaveRecord> {
        let bytes = fs::read(path)?;
        save::decode(&bytes)
    }

    /// World ids that have at least one slot on disk.
    pub fn list_worlds(&self) -> Result<Vec<Uuid>> {
        let mut out = Vec::new();
        if !self.root.exists() {
            return Ok(out);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Ok(id) = entry.file_name().to_string_lossy().parse::<Uuid>() {
                out.push(id);
            }
        }
        out.sort();
        Ok(out)
    }

    /// Slot names available for a world, sorted.
    pub fn list_slots(&self, world_id: Uuid) -> Result<Vec<String>> {
        let dir = self.root.join(world_id.to_string());
        let mut out = Vec::new();
        if !dir.exists() {
            return Ok(out);
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(SAVE_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    out.push(stem.to_string());
                }
            }
        }
        out.sort();
        Ok(out)
    }

    /// Resolve a world by id, preferring the requested slot.
    pub fn load_world(&self, world_id: Uuid, slot: Option<&str>) -> Result<SaveRecord> {
        let slot = slot.unwrap_or(DEFAULT_SLOT);
        let path = self.slot_path(world_id, slot);
        if !path.exists() {
            return Err(LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no slot '{slot}' for world {world_id}"),
            )));
        }
        self.read_path(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotica_core::{Simulation, WorldInit};

    fn temp_store(tag: &str) -> SaveStore {
        let dir = std::env::temp_dir().join(format!("biotica-slots-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        SaveStore::new(dir)
    }

    fn small_sim() -> Simulation {
        let mut sim = Simulation::new(WorldInit {
            seed: 7,
            width: 32,
            height: 24,
            initial_creatures: 30,
            ..WorldInit::default()
        });
        sim.run_ticks(20);
        sim
    }

    #[test]
    fn write_then_read_roundtrips() {
        let store = temp_store("rw");
        let sim = small_sim();
        let id = Uuid::new_v4();
        let record = SaveRecord::build(&sim, id);
        store.write(&record, DEFAULT_SLOT).expect("write");

        let loaded = store.load_world(id, None).expect("load");
        assert_eq!(loaded.world_id, id);
        let restored = loaded.restore().expect("restore");
        assert_eq!(restored.state_hash(), sim.state_hash());

        assert_eq!(store.list_worlds().expect("list"), vec![id]);
        assert_eq!(store.list_slots(id).expect("slots"), vec![DEFAULT_SLOT.to_string()]);
    }

    #[test]
    fn missing_slot_is_an_io_error() {
        let store = temp_store("missing");
        let err = store.load_world(Uuid::new_v4(), Some("nope")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
        assert_eq!(err.exit_code(), 4);
    }
}
