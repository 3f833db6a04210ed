//! Deterministic terrain genesis: an fBm biome map from `(width, height,
//! seed)` plus initial temperature/humidity/fertility fields. This runs once
//! per world and is a pure function of its inputs; nothing here touches the
//! kernel RNG streams.

use biotica_data::{Biome, VolcanoState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct GeneratedTerrain {
    pub tiles: Vec<Biome>,
    pub temperature: Vec<u8>,
    pub humidity: Vec<u8>,
    pub fertility: Vec<u8>,
    pub volcano: Option<VolcanoState>,
}

pub struct TerrainParams {
    /// Scales initial forest/jungle coverage, `[0, 1]`.
    pub tree_density: f32,
    /// 0 or 1 volcano anchors.
    pub volcano_count: u8,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            tree_density: 0.5,
            volcano_count: 1,
        }
    }
}

const SEA_LEVEL: f32 = 0.34;
const DEEP_LEVEL: f32 = 0.26;
const BEACH_LEVEL: f32 = 0.37;
const HILL_LEVEL: f32 = 0.70;
const MOUNTAIN_LEVEL: f32 = 0.80;
const PEAK_LEVEL: f32 = 0.90;

pub const VOLCANO_MIN_INTERVAL: u32 = 1800;
pub const VOLCANO_MAX_INTERVAL: u32 = 5400;
pub const VOLCANO_MAX_LAVA_TILES: u32 = 16;

pub fn generate(width: u16, height: u16, seed: u32, params: &TerrainParams) -> GeneratedTerrain {
    let w = width as usize;
    let h = height as usize;
    let n = w * h;
    let seed64 = u64::from(seed);

    let mut tiles = vec![Biome::Grassland; n];
    let mut temperature = vec![0u8; n];
    let mut humidity = vec![0u8; n];
    let mut fertility = vec![0u8; n];

    let tree_bias = params.tree_density.clamp(0.0, 1.0) * 0.25 - 0.125;

    for idx in 0..n {
        let x = (idx % w) as f32;
        let y = (idx / w) as f32;

        let elevation = value_noise(x, y, seed64);
        let moisture = (value_noise(x, y, seed64.wrapping_add(101)) + tree_bias).clamp(0.0, 1.0);
        // Warmer toward the equator band at mid-height, cooled by altitude.
        let latitude = 1.0 - ((y / h.max(1) as f32) - 0.5).abs() * 2.0;
        let warmth = (latitude * 0.75 + value_noise(x, y, seed64.wrapping_add(202)) * 0.25
            - (elevation - SEA_LEVEL).max(0.0) * 0.5)
            .clamp(0.0, 1.0);

        let biome = classify(elevation, moisture, warmth);
        tiles[idx] = biome;
        temperature[idx] = (warmth * 255.0) as u8;
        humidity[idx] = if biome.is_water() {
            220
        } else {
            (moisture * 255.0) as u8
        };
        fertility[idx] = base_fertility(biome, moisture);
    }

    // Seeded feature placement for the volcano anchor: highest-preference is
    // a Mountain/Rock tile, falling back to any land tile.
    let volcano = if params.volcano_count > 0 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed64.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut anchor = None;
        for _ in 0..256 {
            let x = rng.gen_range(0..w) as u16;
            let y = rng.gen_range(0..h) as u16;
            let idx = y as usize * w + x as usize;
            if matches!(tiles[idx], Biome::Mountain | Biome::Rock | Biome::Hills) {
                anchor = Some((x, y));
                break;
            }
            if anchor.is_none() && !tiles[idx].is_water() {
                anchor = Some((x, y));
            }
        }
        anchor.map(|(x, y)| VolcanoState {
            x,
            y,
            min_interval_ticks: VOLCANO_MIN_INTERVAL,
            max_interval_ticks: VOLCANO_MAX_INTERVAL,
            max_lava_tiles: VOLCANO_MAX_LAVA_TILES,
            next_eruption_tick: u64::from(VOLCANO_MIN_INTERVAL),
            active_eruption: None,
        })
    } else {
        None
    };

    GeneratedTerrain {
        tiles,
        temperature,
        humidity,
        fertility,
        volcano,
    }
}

fn classify(elevation: f32, moisture: f32, warmth: f32) -> Biome {
    if elevation < DEEP_LEVEL {
        return Biome::DeepWater;
    }
    if elevation < SEA_LEVEL {
        return Biome::ShallowWater;
    }
    if elevation < BEACH_LEVEL {
        return Biome::Beach;
    }
    if elevation >= PEAK_LEVEL {
        return if warmth < 0.35 { Biome::Snow } else { Biome::Rock };
    }
    if elevation >= MOUNTAIN_LEVEL {
        return Biome::Mountain;
    }
    if elevation >= HILL_LEVEL {
        return Biome::Hills;
    }
    if warmth < 0.22 {
        return Biome::Snow;
    }
    match (warmth > 0.62, moisture) {
        (true, m) if m < 0.28 => Biome::Desert,
        (true, m) if m < 0.5 => Biome::Savanna,
        (true, m) if m < 0.75 => Biome::Grassland,
        (true, _) => Biome::Jungle,
        (false, m) if m < 0.3 => Biome::Grassland,
        (false, m) if m < 0.65 => Biome::Forest,
        (false, _) => Biome::Swamp,
    }
}

fn base_fertility(biome: Biome, moisture: f32) -> u8 {
    let base: f32 = match biome {
        Biome::Jungle => 0.9,
        Biome::Swamp => 0.8,
        Biome::Forest => 0.75,
        Biome::Grassland => 0.65,
        Biome::Savanna => 0.45,
        Biome::Beach | Biome::Hills => 0.3,
        Biome::Desert => 0.1,
        Biome::Mountain | Biome::Scorched => 0.08,
        _ => 0.0,
    };
    ((base * 0.7 + moisture * 0.3) * 255.0) as u8
}

/// Three-octave value noise in `[0, 1]`. Self-contained integer-hash lattice
/// noise, stable across platforms.
fn value_noise(x: f32, y: f32, seed: u64) -> f32 {
    let n1 = hash_noise(x * 0.10, y * 0.10, seed) * 0.5;
    let n2 = hash_noise(x * 0.05, y * 0.05, seed.wrapping_add(1)) * 0.3;
    let n3 = hash_noise(x * 0.02, y * 0.02, seed.wrapping_add(2)) * 0.2;
    (n1 + n2 + n3).clamp(0.0, 1.0)
}

fn hash_noise(x: f32, y: f32, seed: u64) -> f32 {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let fx = x - x.floor();
    let fy = y - y.floor();
    let ux = fx * fx * (3.0 - 2.0 * fx);
    let uy = fy * fy * (3.0 - 2.0 * fy);
    let v00 = lattice(ix, iy, seed);
    let v10 = lattice(ix + 1, iy, seed);
    let v01 = lattice(ix, iy + 1, seed);
    let v11 = lattice(ix + 1, iy + 1, seed);
    let v0 = v00 + ux * (v10 - v00);
    let v1 = v01 + ux * (v11 - v01);
    v0 + uy * (v1 - v0)
}

fn lattice(x: i32, y: i32, seed: u64) -> f32 {
    let n = (x.wrapping_mul(127) ^ y.wrapping_mul(311)) as u64 ^ seed;
    let n = n.wrapping_mul(0x517c_c1b7_2722_0a95);
    let n = n ^ (n >> 32);
    (n & 0xFF_FFFF) as f32 / 0xFF_FFFF as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = generate(64, 48, 12345, &TerrainParams::default());
        let b = generate(64, 48, 12345, &TerrainParams::default());
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.volcano, b.volcano);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(64, 48, 1, &TerrainParams::default());
        let b = generate(64, 48, 2, &TerrainParams::default());
        assert_ne!(a.tiles, b.tiles);
    }

    #[test]
    fn volcano_lands_inside_grid() {
        let g = generate(40, 30, 7, &TerrainParams::default());
        if let Some(v) = g.volcano {
            assert!(v.x < 40 && v.y < 30);
            assert!(v.next_eruption_tick >= u64::from(VOLCANO_MIN_INTERVAL));
        }
    }

    #[test]
    fn volcano_count_zero_yields_none() {
        let g = generate(
            40,
            30,
            7,
            &TerrainParams {
                volcano_count: 0,
                ..TerrainParams::default()
            },
        );
        assert!(g.volcano.is_none());
    }

    #[test]
    fn water_tiles_get_low_fertility() {
        let g = generate(64, 48, 99, &TerrainParams::default());
        for (i, t) in g.tiles.iter().enumerate() {
            if t.is_water() {
                // Base fertility of water is 0; only the moisture share remains.
                assert!(g.fertility[i] <= 80, "water fertility {} too high", g.fertility[i]);
            }
        }
    }
}
