//! # Biotica Core
//!
//! The deterministic simulation kernel: a seeded 2D world in which terrain,
//! weather events, plant biomass, genome-driven fauna and tribal
//! civilizations advance in lockstep on a fixed-rate tick loop.
//!
//! Everything in this crate is bit-reproducible from
//! `(seed, initial config, tick count)`: no wall clock, no OS entropy, no
//! hash-order iteration inside a tick. Wall-clock strings appear only as
//! log/save metadata and are excluded from state hashes.
//!
//! ## Architecture
//!
//! - **Single-threaded kernel**: one logical thread owns the tick loop and
//!   mutates state; external consumers read [`snapshot::WorldSnapshot`]
//!   projections or go through the [`router::ToolRouter`] between ticks.
//! - **Fixed subsystem order per tick**: events → environment → plants →
//!   creatures → civilization → log/snapshot.
//! - **Budgeted field updates**: diffusion and plant growth touch a bounded
//!   number of cells per tick, cycling deterministically through the grid.
//! - **Owned acceleration structures**: each population subsystem rebuilds
//!   its own spatial index; indices never escape their owner.

/// Tribal civilizations: agents, factions, territory, language, diplomacy
pub mod civ;
/// Immutable item catalog and faction-local recipe evolution
pub mod crafting;
/// Individual fauna: perception, decision, movement, reproduction, death
pub mod creatures;
/// Budgeted diffusion of temperature/humidity/fertility and hazard decay
pub mod environment;
/// Environmental event state machine (drought, storm, eruption, ...)
pub mod events;
/// World-genesis tuning acceptance with reset-token invalidation
pub mod genesis;
/// The Simulation kernel: subsystem ownership, tick ordering, state hash
pub mod kernel;
/// Bounded ring buffer of structured domain events
pub mod log;
/// Plant biomass growth and decay per tile
pub mod plants;
/// Seeded deterministic PRNG with per-subsystem streams
pub mod rng;
/// Read-only query facade for external consumers
pub mod router;
/// Fixed-timestep accumulator, speed control, pause semantics
pub mod scheduler;
/// Per-tick immutable projection of the world
pub mod snapshot;
/// Uniform-grid spatial index with deterministic query order
pub mod spatial;
/// Species registry: centroid assignment, drift, speciation
pub mod species;
/// Deterministic fBm terrain genesis
pub mod terrain;
/// Tile grid and per-tile environmental fields
pub mod world;

pub use kernel::{Preset, Simulation, WorldInit, WorldProfile};
pub use rng::KernelRng;
pub use scheduler::{Scheduler, FIXED_STEP_MS, MAX_STEPS_PER_FRAME, SPEED_STEPS};
pub use snapshot::WorldSnapshot;
