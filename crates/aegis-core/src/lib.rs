//! Core vocabulary for the AEGIS C2 simulation.
//!
//! This crate defines the types shared across the command hierarchy:
//! identifiers, protocol messages, asset and track records, enums, and
//! default tuning constants. It carries no engine logic and no dependency
//! on any runtime framework.

pub mod asset;
pub mod constants;
pub mod enums;
pub mod id;
pub mod messages;
pub mod track;

pub use asset::{AssetMap, AssetRecord, ChainAdjust, SensorRecord, WeaponRecord};
pub use id::Id;
pub use track::TrackRecord;

#[cfg(test)]
mod tests;
