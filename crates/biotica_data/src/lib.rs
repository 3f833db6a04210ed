//! Pure data types shared by every Biotica crate.
//!
//! Nothing in here advances the simulation: these are the serializable
//! records the kernel mutates and the save contract captures. Logic is
//! limited to bounds clamping and cheap derivations.

pub mod data;

pub use data::genome;

pub use data::civ::*;
pub use data::creature::*;
pub use data::genome::*;
pub use data::items::*;
pub use data::log::*;
pub use data::species::*;
pub use data::tile::*;
pub use data::tuning::*;
