//! World-genesis acceptance. An external tuner proposes a `TuningPatch` plus
//! reason codes; the kernel applies it exactly once at reset, clamped, under
//! a monotonic reset token so a superseded tuner run can never mutate a
//! newer world.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenesisSummary {
    pub applied: bool,
    pub applied_tick: u64,
    pub reason_codes: Vec<String>,
}

/// Outcome of offering a tuning patch to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenesisOutcome {
    Applied,
    /// The reset token did not match: the proposing task was superseded and
    /// must abort silently.
    StaleToken,
    /// A patch was already accepted for this world.
    AlreadyApplied,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_defaults_to_unapplied() {
        let s = GenesisSummary::default();
        assert!(!s.applied);
        assert!(s.reason_codes.is_empty());
    }
}
