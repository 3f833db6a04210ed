use serde::{Deserialize, Serialize};

/// Closed biome enum. The discriminants are the on-disk byte values of the
/// tile array; renumbering is a schema break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Biome {
    DeepWater = 0,
    ShallowWater = 1,
    Beach = 2,
    Grassland = 3,
    Forest = 4,
    Jungle = 5,
    Desert = 6,
    Savanna = 7,
    Swamp = 8,
    Hills = 9,
    Mountain = 10,
    Snow = 11,
    Rock = 12,
    Lava = 13,
    Scorched = 14,
}

impl Biome {
    pub const COUNT: usize = 15;

    #[must_use]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::DeepWater),
            1 => Some(Self::ShallowWater),
            2 => Some(Self::Beach),
            3 => Some(Self::Grassland),
            4 => Some(Self::Forest),
            5 => Some(Self::Jungle),
            6 => Some(Self::Desert),
            7 => Some(Self::Savanna),
            8 => Some(Self::Swamp),
            9 => Some(Self::Hills),
            10 => Some(Self::Mountain),
            11 => Some(Self::Snow),
            12 => Some(Self::Rock),
            13 => Some(Self::Lava),
            14 => Some(Self::Scorched),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(self, Self::DeepWater | Self::ShallowWater)
    }

    /// Tiles a land creature can stand on.
    #[must_use]
    pub fn walkable(self) -> bool {
        !matches!(self, Self::DeepWater | Self::Lava)
    }

    /// Whether plant biomass accumulates here at all.
    #[must_use]
    pub fn supports_plants(self) -> bool {
        !matches!(
            self,
            Self::DeepWater | Self::ShallowWater | Self::Lava | Self::Snow | Self::Rock
        )
    }

    /// Relative plant growth multiplier, in eighths (integer math keeps the
    /// growth path bit-stable).
    #[must_use]
    pub fn growth_eighths(self) -> u16 {
        match self {
            Self::Jungle => 14,
            Self::Swamp | Self::Forest => 11,
            Self::Grassland => 8,
            Self::Savanna => 6,
            Self::Beach | Self::Hills => 4,
            Self::Desert | Self::Scorched => 1,
            Self::Mountain => 2,
            _ => 0,
        }
    }
}

/// Optional volcano anchor for a world. At most one per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolcanoState {
    pub x: u16,
    pub y: u16,
    pub min_interval_ticks: u32,
    pub max_interval_ticks: u32,
    pub max_lava_tiles: u32,
    pub next_eruption_tick: u64,
    pub active_eruption: Option<u64>,
}
