//! Territory ownership: per-tile owner index plus a control magnitude.
//!
//! Control is contested in place: an agent reinforces its faction's hold on
//! the tile it stands on, erodes a rival's, and flips ownership when the
//! rival's control is ground down. All arithmetic is `u8`-saturating, so the
//! maps are bit-stable. The reference increments are pinned here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Control gained on the agent's own tile per tick.
pub const CONTROL_GAIN_SELF: u8 = 12;
/// Control gained on the ring around the agent per tick.
pub const CONTROL_GAIN_RADIUS: u8 = 3;
/// Owned tiles decay every `DECAY_PERIOD` ticks by `max(1, control/64)`.
pub const DECAY_PERIOD: u64 = 8;

pub const UNCLAIMED: u8 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritoryMap {
    width: u16,
    height: u16,
    /// Faction id per tile; `0` is unclaimed. Faction ids fit in `u8` (the
    /// kernel caps faction count well below 255).
    #[serde(with = "crate::world::hex_bytes")]
    pub owner: Vec<u8>,
    /// Control magnitude of the owning faction, `[0, 255]`.
    #[serde(with = "crate::world::hex_bytes")]
    pub control: Vec<u8>,
    /// Bumped exactly when the owner map changes.
    pub version: u64,
}

impl TerritoryMap {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            owner: vec![UNCLAIMED; n],
            control: vec![0; n],
            version: 0,
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Apply one agent's presence: full gain on its tile, ring gain around it.
    pub fn apply_presence(&mut self, x: u16, y: u16, faction: u8) {
        self.reinforce(x, y, faction, CONTROL_GAIN_SELF);
        for (dx, dy) in [(1i32, 0i32), (-1, 0), (0, 1), (0, -1)] {
            let nx = i32::from(x) + dx;
            let ny = i32::from(y) + dy;
            if nx >= 0 && ny >= 0 && nx < i32::from(self.width) && ny < i32::from(self.height) {
                self.reinforce(nx as u16, ny as u16, faction, CONTROL_GAIN_RADIUS);
            }
        }
    }

    fn reinforce(&mut self, x: u16, y: u16, faction: u8, gain: u8) {
        let i = self.index(x, y);
        if self.owner[i] == faction {
            self.control[i] = self.control[i].saturating_add(gain);
        } else if self.owner[i] == UNCLAIMED || self.control[i] < gain {
            self.owner[i] = faction;
            self.control[i] = gain;
            self.version += 1;
        } else {
            self.control[i] -= gain;
        }
    }

    /// Periodic decay of held ground. Tiles that hit zero control revert to
    /// unclaimed.
    pub fn decay(&mut self, tick: u64) {
        if tick % DECAY_PERIOD != 0 {
            return;
        }
        for i in 0..self.owner.len() {
            if self.owner[i] == UNCLAIMED {
                continue;
            }
            let loss = (self.control[i] / 64).max(1);
            self.control[i] = self.control[i].saturating_sub(loss);
            if self.control[i] == 0 {
                self.owner[i] = UNCLAIMED;
                self.version += 1;
            }
        }
    }

    /// Tiles owned per faction.
    #[must_use]
    pub fn census(&self) -> BTreeMap<u8, u32> {
        let mut counts = BTreeMap::new();
        for &o in &self.owner {
            if o != UNCLAIMED {
                *counts.entry(o).or_insert(0) += 1;
            }
        }
        counts
    }

    #[must_use]
    pub fn owner_at(&self, x: u16, y: u16) -> u8 {
        self.owner[self.index(x, y)]
    }

    /// A border tile is owned and 4-adjacent to a differently-owned tile.
    #[must_use]
    pub fn is_border(&self, x: u16, y: u16) -> bool {
        let own = self.owner_at(x, y);
        if own == UNCLAIMED {
            return false;
        }
        for (dx, dy) in [(1i32, 0i32), (-1, 0), (0, 1), (0, -1)] {
            let nx = i32::from(x) + dx;
            let ny = i32::from(y) + dy;
            if nx >= 0 && ny >= 0 && nx < i32::from(self.width) && ny < i32::from(self.height) {
                if self.owner[self.index(nx as u16, ny as u16)] != own {
                    return true;
                }
            }
        }
        false
    }

    /// Count of 4-adjacent tile pairs owned by the two given factions, a
    /// cheap contact metric for diplomacy.
    #[must_use]
    pub fn border_contact(&self, a: u8, b: u8) -> u32 {
        let mut contact = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.owner_at(x, y) != a {
                    continue;
                }
                if x + 1 < self.width && self.owner_at(x + 1, y) == b {
                    contact += 1;
                }
                if y + 1 < self.height && self.owner_at(x, y + 1) == b {
                    contact += 1;
                }
                if x > 0 && self.owner_at(x - 1, y) == b {
                    contact += 1;
                }
                if y > 0 && self.owner_at(x, y - 1) == b {
                    contact += 1;
                }
            }
        }
        contact
    }

    /// Remap ownership of every tile of `from` to `to` (faction split).
    pub fn transfer_region(&mut self, from: u8, to: u8, predicate: impl Fn(u16, u16) -> bool) {
        let mut changed = false;
        for y in 0..self.height {
            for x in 0..self.width {
                let i = self.index(x, y);
                if self.owner[i] == from && predicate(x, y) {
                    self.owner[i] = to;
                    changed = true;
                }
            }
        }
        if changed {
            self.version += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_claims_unclaimed_ground() {
        let mut t = TerritoryMap::new(16, 16);
        t.apply_presence(8, 8, 1);
        assert_eq!(t.owner_at(8, 8), 1);
        assert_eq!(t.control[t.index(8, 8)], CONTROL_GAIN_SELF);
        assert_eq!(t.owner_at(9, 8), 1);
        assert_eq!(t.version, 5);
    }

    #[test]
    fn sustained_pressure_flips_ownership() {
        let mut t = TerritoryMap::new(8, 8);
        for _ in 0..10 {
            t.apply_presence(4, 4, 1);
        }
        let v = t.version;
        for _ in 0..40 {
            t.apply_presence(4, 4, 2);
        }
        assert_eq!(t.owner_at(4, 4), 2);
        assert!(t.version > v);
    }

    #[test]
    fn census_matches_owner_map() {
        let mut t = TerritoryMap::new(8, 8);
        t.apply_presence(1, 1, 1);
        t.apply_presence(6, 6, 2);
        let census = t.census();
        let ones = t.owner.iter().filter(|&&o| o == 1).count() as u32;
        let twos = t.owner.iter().filter(|&&o| o == 2).count() as u32;
        assert_eq!(census.get(&1), Some(&ones));
        assert_eq!(census.get(&2), Some(&twos));
    }

    #[test]
    fn decay_eventually_releases_tiles() {
        let mut t = TerritoryMap::new(4, 4);
        t.apply_presence(2, 2, 1);
        for tick in 0..2000 {
            t.decay(tick);
        }
        assert_eq!(t.owner_at(2, 2), UNCLAIMED);
        assert!(t.census().is_empty());
    }

    #[test]
    fn version_is_stable_without_changes() {
        let mut t = TerritoryMap::new(4, 4);
        t.apply_presence(2, 2, 1);
        let v = t.version;
        // Reinforcing owned ground changes control, not ownership.
        t.apply_presence(2, 2, 1);
        assert_eq!(t.version, v);
    }

    #[test]
    fn border_detection() {
        let mut t = TerritoryMap::new(8, 8);
        for _ in 0..5 {
            t.apply_presence(2, 2, 1);
            t.apply_presence(4, 2, 2);
        }
        assert!(t.is_border(3, 2) || t.is_border(2, 2));
        assert!(t.border_contact(1, 2) > 0);
    }
}
