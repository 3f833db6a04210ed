//! Relations between faction pairs: trust/tension drift from border contact
//! and agent interactions, with threshold-driven status transitions.

use super::territory::TerritoryMap;
use crate::log::{EventLog, LogEvent};
use biotica_data::{Faction, LogCategory, Relation, RelationStatus, Strategy};

pub const WAR_TENSION: f32 = 0.7;
pub const PEACE_TENSION: f32 = 0.25;
pub const TRADE_TRUST: f32 = 0.65;
pub const ALLY_TRUST: f32 = 0.85;

/// Ensure both directed relations exist for every live faction pair.
pub fn ensure_relations(factions: &[Faction], relations: &mut Vec<Relation>) {
    for a in factions {
        for b in factions {
            if a.id == b.id {
                continue;
            }
            if !relations.iter().any(|r| r.from == a.id && r.to == b.id) {
                relations.push(Relation::new(a.id, b.id));
            }
        }
    }
}

/// Per-tick drift of every relation, plus status transitions at the pinned
/// thresholds. Interaction pressure arrives via the agent phase having
/// already adjusted trust/tension; this step applies contact and decay.
pub fn step(
    factions: &[Faction],
    relations: &mut [Relation],
    territory: &TerritoryMap,
    log: &mut EventLog,
    tick: u64,
) {
    // Border contact is symmetric and somewhat expensive; sample it on a
    // coarse cadence.
    let sample_contact = tick % 16 == 0;

    for rel in relations.iter_mut() {
        let Some(from) = factions.iter().find(|f| f.id == rel.from) else {
            continue;
        };
        let Some(to) = factions.iter().find(|f| f.id == rel.to) else {
            continue;
        };

        if sample_contact {
            let contact = territory.border_contact(rel.from as u8, rel.to as u8);
            if contact > 0 {
                let pressure = (contact as f32 / 64.0).min(0.04);
                match (from.strategy, to.strategy) {
                    (Strategy::Trade, _) | (_, Strategy::Trade) => {
                        rel.trust += pressure;
                        rel.tension -= pressure * 0.5;
                    }
                    (Strategy::Militarize, _) | (_, Strategy::Militarize) => {
                        rel.tension += pressure * 1.5;
                    }
                    _ => {
                        rel.tension += pressure * from.culture.aggression.max(to.culture.aggression);
                        rel.trust += pressure * from.culture.trade_affinity.min(to.culture.trade_affinity);
                    }
                }
            }
        }

        // Everything relaxes toward neutral absent pressure.
        rel.tension = (rel.tension - 0.0005).clamp(0.0, 1.0);
        rel.trust = (rel.trust + (0.5 - rel.trust) * 0.0005).clamp(0.0, 1.0);
        rel.intensity = (rel.intensity * 0.995).clamp(0.0, 1.0);

        let old = rel.status;
        rel.status = next_status(rel);
        if rel.status != old {
            LogEvent::new(
                tick,
                LogCategory::CivDiplomacy,
                format!(
                    "faction {} now {:?} toward faction {}",
                    rel.from, rel.status, rel.to
                ),
            )
            .faction(rel.from)
            .emit(log);
            if rel.status == RelationStatus::War {
                rel.intensity = 1.0;
            }
        }
    }
}

fn next_status(rel: &Relation) -> RelationStatus {
    match rel.status {
        RelationStatus::War => {
            if rel.tension < PEACE_TENSION {
                RelationStatus::Neutral
            } else {
                RelationStatus::War
            }
        }
        RelationStatus::Ally => {
            if rel.tension > WAR_TENSION {
                RelationStatus::War
            } else if rel.trust < TRADE_TRUST {
                RelationStatus::Neutral
            } else {
                RelationStatus::Ally
            }
        }
        RelationStatus::Trade => {
            if rel.tension > WAR_TENSION {
                RelationStatus::War
            } else if rel.trust >= ALLY_TRUST {
                RelationStatus::Ally
            } else if rel.trust < TRADE_TRUST * 0.8 {
                RelationStatus::Neutral
            } else {
                RelationStatus::Trade
            }
        }
        RelationStatus::Neutral => {
            if rel.tension > WAR_TENSION {
                RelationStatus::War
            } else if rel.trust >= ALLY_TRUST {
                RelationStatus::Ally
            } else if rel.trust >= TRADE_TRUST {
                RelationStatus::Trade
            } else {
                RelationStatus::Neutral
            }
        }
    }
}

/// Find the directed relation, if present.
#[must_use]
pub fn relation_between(relations: &[Relation], from: u32, to: u32) -> Option<&Relation> {
    relations.iter().find(|r| r.from == from && r.to == to)
}

pub fn relation_between_mut(
    relations: &mut [Relation],
    from: u32,
    to: u32,
) -> Option<&mut Relation> {
    relations.iter_mut().find(|r| r.from == from && r.to == to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(trust: f32, tension: f32, status: RelationStatus) -> Relation {
        Relation {
            from: 1,
            to: 2,
            status,
            trust,
            tension,
            intensity: 0.0,
        }
    }

    #[test]
    fn tension_above_threshold_means_war() {
        let r = relation(0.5, 0.8, RelationStatus::Neutral);
        assert_eq!(next_status(&r), RelationStatus::War);
    }

    #[test]
    fn war_ends_only_below_peace_tension() {
        let still = relation(0.5, 0.4, RelationStatus::War);
        assert_eq!(next_status(&still), RelationStatus::War);
        let over = relation(0.5, 0.1, RelationStatus::War);
        assert_eq!(next_status(&over), RelationStatus::Neutral);
    }

    #[test]
    fn high_trust_builds_trade_then_alliance() {
        let t = relation(0.7, 0.1, RelationStatus::Neutral);
        assert_eq!(next_status(&t), RelationStatus::Trade);
        let a = relation(0.9, 0.1, RelationStatus::Trade);
        assert_eq!(next_status(&a), RelationStatus::Ally);
    }
}
