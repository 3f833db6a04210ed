use biotica_data::{Biome, SimTuning, VolcanoState};
use serde::{Deserialize, Serialize};

/// Serialize dense byte arrays as hex strings: per-tile blobs stay compact
/// binary in the textual save container instead of JSON number arrays.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Tile array codec: biome bytes, hex-encoded like the other fields.
mod biome_hex {
    use biotica_data::Biome;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tiles: &[Biome], ser: S) -> Result<S::Ok, S::Error> {
        let bytes: Vec<u8> = tiles.iter().map(|b| *b as u8).collect();
        ser.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Biome>, D::Error> {
        let s = String::deserialize(de)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .iter()
            .map(|&v| {
                Biome::from_u8(v)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid biome byte {v}")))
            })
            .collect()
    }
}

/// The tile grid and per-tile environmental fields, stored as parallel dense
/// byte arrays (struct-of-arrays) indexed row-major `y * width + x`.
///
/// Invariant: every field vector has length `width * height`. Violations are
/// bugs and panic at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub width: u16,
    pub height: u16,
    pub tick: u64,
    pub seed: u32,
    #[serde(with = "biome_hex")]
    pub tiles: Vec<Biome>,
    #[serde(with = "hex_bytes")]
    pub temperature: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub humidity: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub fertility: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub hazard: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub plant_biomass: Vec<u8>,
    pub volcano: Option<VolcanoState>,
    pub tuning: SimTuning,
}

impl WorldState {
    pub fn new(
        width: u16,
        height: u16,
        seed: u32,
        tiles: Vec<Biome>,
        temperature: Vec<u8>,
        humidity: Vec<u8>,
        fertility: Vec<u8>,
        volcano: Option<VolcanoState>,
        tuning: SimTuning,
    ) -> Self {
        let n = width as usize * height as usize;
        assert!(width > 0 && height > 0, "world dimensions must be positive");
        assert_eq!(tiles.len(), n, "tile array length mismatch");
        assert_eq!(temperature.len(), n, "temperature array length mismatch");
        assert_eq!(humidity.len(), n, "humidity array length mismatch");
        assert_eq!(fertility.len(), n, "fertility array length mismatch");
        Self {
            width,
            height,
            tick: 0,
            seed,
            tiles,
            temperature,
            humidity,
            fertility,
            hazard: vec![0; n],
            plant_biomass: vec![0; n],
            volcano,
            tuning,
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn index(&self, x: u16, y: u16) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    #[must_use]
    pub fn biome_at(&self, x: u16, y: u16) -> Biome {
        self.tiles[self.index(x, y)]
    }

    pub fn set_biome(&mut self, x: u16, y: u16, b: Biome) {
        let i = self.index(x, y);
        self.tiles[i] = b;
    }

    /// Clamp an arbitrary coordinate into the grid.
    #[must_use]
    pub fn clamp_pos(&self, x: i32, y: i32) -> (u16, u16) {
        (
            x.clamp(0, i32::from(self.width) - 1) as u16,
            y.clamp(0, i32::from(self.height) - 1) as u16,
        )
    }

    /// Validate the parallel-array invariant; used by the loader before a
    /// restored world is committed.
    #[must_use]
    pub fn arrays_consistent(&self) -> bool {
        let n = self.cell_count();
        self.tiles.len() == n
            && self.temperature.len() == n
            && self.humidity.len() == n
            && self.fertility.len() == n
            && self.hazard.len() == n
            && self.plant_biomass.len() == n
    }

    /// Tile byte view used by the save codec and state hash.
    #[must_use]
    pub fn tiles_as_bytes(&self) -> Vec<u8> {
        self.tiles.iter().map(|b| *b as u8).collect()
    }

    pub fn tiles_from_bytes(bytes: &[u8]) -> Option<Vec<Biome>> {
        bytes.iter().map(|&v| Biome::from_u8(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> WorldState {
        let n = 4 * 3;
        WorldState::new(
            4,
            3,
            1,
            vec![Biome::Grassland; n],
            vec![128; n],
            vec![128; n],
            vec![128; n],
            None,
            SimTuning::default(),
        )
    }

    #[test]
    fn index_is_row_major() {
        let w = tiny();
        assert_eq!(w.index(0, 0), 0);
        assert_eq!(w.index(3, 0), 3);
        assert_eq!(w.index(0, 1), 4);
        assert_eq!(w.index(2, 2), 10);
    }

    #[test]
    fn arrays_share_length() {
        let w = tiny();
        assert!(w.arrays_consistent());
        assert_eq!(w.hazard.len(), w.cell_count());
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn mismatched_arrays_panic() {
        let _ = WorldState::new(
            4,
            3,
            1,
            vec![Biome::Grassland; 12],
            vec![128; 11],
            vec![128; 12],
            vec![128; 12],
            None,
            SimTuning::default(),
        );
    }

    #[test]
    fn tile_bytes_roundtrip() {
        let w = tiny();
        let bytes = w.tiles_as_bytes();
        let back = WorldState::tiles_from_bytes(&bytes).expect("valid bytes");
        assert_eq!(back, w.tiles);
        assert!(WorldState::tiles_from_bytes(&[200]).is_none());
    }
}
