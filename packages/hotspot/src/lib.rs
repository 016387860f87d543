#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash hotspot detection.
//!
//! Two detectors work over a filtered record set:
//!
//! - [`grid::detect`] bins records into fixed-size cells and reports dense
//!   cells.
//! - [`neighbor::detect`] sweeps the records in order and groups each
//!   unclaimed record with its unclaimed neighbors.
//!
//! Both are pure: they borrow the records and never modify them.

pub mod grid;
pub mod neighbor;
pub mod outline;

pub use crash_map_hotspot_models::{GridCell, GridHotspot, Hotspot, NeighborHotspot};
pub use grid::{GridSpec, rank_by_density};
pub use neighbor::sort_by_size;
pub use outline::{hotspot_feature, outlines};

/// Default grid cell edge length.
pub const DEFAULT_CELL_SIZE_KM: f64 = 0.5;

/// Default neighbor search radius.
pub const DEFAULT_RADIUS_KM: f64 = 0.3;

/// Detects grid hotspots. See [`grid::detect`].
#[must_use]
pub fn detect_grid_hotspots<'a, I>(records: I, cell_size_km: f64) -> Vec<GridHotspot<'a>>
where
    I: IntoIterator<Item = &'a crash_map_crash_models::CrashRecord>,
{
    grid::detect(records, cell_size_km)
}

/// Detects neighbor hotspots. See [`neighbor::detect`].
#[must_use]
pub fn detect_neighbor_hotspots<'a, I>(records: I, radius_km: f64) -> Vec<NeighborHotspot<'a>>
where
    I: IntoIterator<Item = &'a crash_map_crash_models::CrashRecord>,
{
    neighbor::detect(records, radius_km)
}
