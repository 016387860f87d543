//! R-tree index over point positions.
//!
//! Answers "which points lie within `r` km of here" without scanning every
//! point. Candidates come from a padded degree envelope and are then
//! filtered by exact haversine distance.

use rstar::{AABB, RTree, primitives::GeomWithData};

use crate::{KM_PER_DEGREE, LonLat, haversine_distance_km, km_to_lat_degrees};

type IndexedPoint = GeomWithData<LonLat, usize>;

/// Latitude used to size the longitude padding never exceeds this.
const MAX_PADDING_LATITUDE: f64 = 89.0;

/// Spatial index of points, each tagged with its position in the input
/// slice.
pub struct PointIndex {
    points: Vec<LonLat>,
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Builds an index over `points`.
    #[must_use]
    pub fn new(points: Vec<LonLat>) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new(*p, i))
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} points", tree.size());

        Self { points, tree }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position of the point at `index`.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<LonLat> {
        self.points.get(index).copied()
    }

    /// Indices of every point within `radius_km` of `center` (inclusive),
    /// in ascending index order.
    #[must_use]
    pub fn within_km(&self, center: LonLat, radius_km: f64) -> Vec<usize> {
        let lat_pad = km_to_lat_degrees(radius_km);
        let widest_lat = (center[1].abs() + lat_pad).min(MAX_PADDING_LATITUDE);
        let lng_pad = 1.5 * radius_km / (KM_PER_DEGREE * widest_lat.to_radians().cos());

        let envelope = AABB::from_corners(
            [center[0] - lng_pad, center[1] - lat_pad * 1.5],
            [center[0] + lng_pad, center[1] + lat_pad * 1.5],
        );

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|entry| haversine_distance_km(center, *entry.geom()) <= radius_km)
            .map(|entry| entry.data)
            .collect();
        hits.sort_unstable();
        hits
    }
}
