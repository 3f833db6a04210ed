//! The save/restore contract: a gzipped JSON container holding every piece
//! of deterministic kernel state (per-tile blobs hex-encoded by the kernel's
//! own serde codecs), plus wall-clock header metadata that never affects
//! determinism.
//!
//! Round-trip invariant: restoring a save and running N ticks produces
//! byte-identical state to a fresh run of the same seed advanced to the same
//! total tick count.

use crate::error::{LoadError, Result};
use biotica_core::Simulation;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;
pub const MIN_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveRecord {
    pub schema_version: u32,
    /// Stable identity of the world across save slots. Header metadata.
    pub world_id: Uuid,
    /// Wall-clock stamp. Header metadata, excluded from determinism.
    pub saved_at: String,
    pub reset_token: u64,
    pub state: Simulation,
}

impl SaveRecord {
    #[must_use]
    pub fn build(sim: &Simulation, world_id: Uuid) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            world_id,
            saved_at: chrono::Utc::now().to_rfc3339(),
            reset_token: sim.reset_token(),
            state: sim.clone(),
        }
    }

    /// Validate and hand back a ready kernel. Everything is checked before
    /// the caller sees a `Simulation`, so failure leaves no half-state.
    pub fn restore(self) -> Result<Simulation> {
        let mut sim = self.state;
        if !sim.world.arrays_consistent() {
            return Err(LoadError::corrupt("per-tile array lengths disagree"));
        }
        for rec in &sim.registry.species {
            if !rec.lineage_is_wellformed() {
                return Err(LoadError::corrupt(format!(
                    "species {} lineage does not end with itself",
                    rec.id
                )));
            }
            if let Some(parent) = &rec.parent_species_id {
                if sim.registry.get(parent).is_none() {
                    return Err(LoadError::corrupt(format!(
                        "species {} references missing parent {parent}",
                        rec.id
                    )));
                }
            }
        }
        for c in &sim.creatures.creatures {
            if sim.registry.get(&c.species_id).is_none() {
                return Err(LoadError::corrupt(format!(
                    "creature {} references missing species {}",
                    c.id, c.species_id
                )));
            }
            if c.x >= sim.world.width || c.y >= sim.world.height {
                return Err(LoadError::corrupt(format!("creature {} out of bounds", c.id)));
            }
        }
        for a in &sim.civ.agents {
            if sim.civ.faction(a.faction_id).is_none() {
                return Err(LoadError::corrupt(format!(
                    "agent {} references missing faction {}",
                    a.id, a.faction_id
                )));
            }
        }
        sim.restore_reset_token(self.reset_token);
        sim.rehydrate();
        Ok(sim)
    }
}

/// Serialize into the gzipped container.
pub fn encode(record: &SaveRecord) -> Result<Vec<u8>> {
    let json =
        serde_json::to_vec(record).map_err(|e| LoadError::corrupt(format!("encode: {e}")))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Decode a container, applying the schema gate before the full parse.
pub fn decode(bytes: &[u8]) -> Result<SaveRecord> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| LoadError::corrupt(format!("gzip: {e}")))?;

    // Probe the version first so schema errors are reported as such even
    // when the rest of the payload no longer parses.
    #[derive(Deserialize)]
    struct VersionProbe {
        schema_version: u32,
    }
    let probe: VersionProbe = serde_json::from_slice(&json)
        .map_err(|e| LoadError::corrupt(format!("header: {e}")))?;
    if probe.schema_version > SCHEMA_VERSION {
        return Err(LoadError::SchemaTooNew {
            found: probe.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    if probe.schema_version < MIN_SCHEMA_VERSION {
        return Err(LoadError::SchemaUnsupported {
            found: probe.schema_version,
            minimum: MIN_SCHEMA_VERSION,
        });
    }

    let mut value: serde_json::Value = serde_json::from_slice(&json)
        .map_err(|e| LoadError::corrupt(format!("payload: {e}")))?;
    migrate(&mut value, probe.schema_version);
    serde_json::from_value(value).map_err(|e| LoadError::corrupt(format!("record: {e}")))
}

/// Migrations are applied monotonically from the on-disk version up to
/// [`SCHEMA_VERSION`]. Version 1 is current, so this is a ladder with no
/// rungs yet.
fn migrate(_value: &mut serde_json::Value, from: u32) {
    debug_assert!((MIN_SCHEMA_VERSION..=SCHEMA_VERSION).contains(&from));
}
