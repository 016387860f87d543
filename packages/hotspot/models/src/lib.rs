#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot cluster types.
//!
//! Clusters borrow the records they group: they are recomputed for every
//! analysis request and never outlive the record set they were built from.

use crash_map_crash_models::CrashRecord;
use crash_map_spatial::{BoundingBox, LonLat, circle_polygon};
use geo::Polygon;
use serde::Serialize;

/// Minimum number of records a grid cell needs to become a hotspot.
pub const GRID_MIN_POINTS: usize = 4;

/// Below this many input records the grid detector reports nothing.
pub const GRID_MIN_INPUT: usize = 8;

/// Minimum number of neighbors (excluding the seed) for a neighbor hotspot.
pub const NEIGHBOR_MIN_NEIGHBORS: usize = 3;

/// Below this many input records the neighbor detector reports nothing.
pub const NEIGHBOR_MIN_INPUT: usize = 4;

/// Vertices used when drawing a neighbor hotspot outline.
pub const CIRCLE_SEGMENTS: u32 = 64;

/// Common view over both hotspot kinds.
pub trait Hotspot {
    /// Stable identifier within one detection pass.
    fn id(&self) -> String;

    /// Records in the cluster.
    fn points(&self) -> &[&CrashRecord];

    /// Representative location.
    fn center(&self) -> LonLat;

    /// Records per km², if the detector measures it.
    fn density(&self) -> Option<f64>;

    /// Polygon to redraw the hotspot's extent.
    fn outline(&self) -> Polygon<f64>;

    /// Number of records in the cluster.
    fn count(&self) -> usize {
        self.points().len()
    }
}

/// Integer grid coordinates of a cell. `row` counts latitude steps from the
/// equator and `col` longitude steps from the prime meridian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GridCell {
    /// Latitude index.
    pub row: i64,
    /// Longitude index.
    pub col: i64,
}

/// A grid cell dense enough to be a hotspot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridHotspot<'a> {
    /// Cell coordinates.
    pub cell: GridCell,
    /// Geometric center of the cell.
    pub center: LonLat,
    /// Cell extent in degrees.
    pub bounds: BoundingBox,
    /// Physical cell area in km².
    pub area_km2: f64,
    /// Records per km².
    pub density: f64,
    /// Records that fell in the cell, in input order.
    #[serde(skip)]
    pub points: Vec<&'a CrashRecord>,
}

impl Hotspot for GridHotspot<'_> {
    fn id(&self) -> String {
        format!("cell-{}-{}", self.cell.row, self.cell.col)
    }

    fn points(&self) -> &[&CrashRecord] {
        &self.points
    }

    fn center(&self) -> LonLat {
        self.center
    }

    fn density(&self) -> Option<f64> {
        Some(self.density)
    }

    fn outline(&self) -> Polygon<f64> {
        self.bounds.to_polygon()
    }
}

/// A group of mutually close records found by the neighbor sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborHotspot<'a> {
    /// Sequential identifier, `hotspot-1` for the first cluster found.
    pub id: String,
    /// Centroid of the member records.
    pub center: LonLat,
    /// Search radius the cluster was built with.
    pub radius_km: f64,
    /// Seed record first, then its neighbors in input order.
    #[serde(skip)]
    pub points: Vec<&'a CrashRecord>,
}

impl Hotspot for NeighborHotspot<'_> {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn points(&self) -> &[&CrashRecord] {
        &self.points
    }

    fn center(&self) -> LonLat {
        self.center
    }

    fn density(&self) -> Option<f64> {
        None
    }

    fn outline(&self) -> Polygon<f64> {
        circle_polygon(self.center, self.radius_km, CIRCLE_SEGMENTS)
    }
}
