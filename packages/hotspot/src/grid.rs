//! Grid hotspot detector.
//!
//! Cells are anchored at latitude/longitude zero, one `cell_size_km` tall.
//! Cell width is derived once, at the mid-latitude of the input's bounding
//! box, so cells far from that latitude are not exactly square.

use std::collections::BTreeMap;

use crash_map_crash_models::CrashRecord;
use crash_map_hotspot_models::{GRID_MIN_INPUT, GRID_MIN_POINTS, GridCell, GridHotspot};
use crash_map_spatial::{BoundingBox, LonLat, bounding_box, km_to_lat_degrees, km_to_lng_degrees};

/// Cell dimensions in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Cell height in degrees of latitude.
    pub lat_step: f64,
    /// Cell width in degrees of longitude.
    pub lng_step: f64,
}

impl GridSpec {
    /// Grid of `cell_size_km` cells with widths scaled at `reference_lat`.
    #[must_use]
    pub fn new(cell_size_km: f64, reference_lat: f64) -> Self {
        Self {
            lat_step: km_to_lat_degrees(cell_size_km),
            lng_step: km_to_lng_degrees(cell_size_km, reference_lat),
        }
    }

    /// Grid scaled at the mid-latitude of the given points' bounding box,
    /// or `None` if there are no points.
    #[must_use]
    pub fn for_points<I>(points: I, cell_size_km: f64) -> Option<Self>
    where
        I: IntoIterator<Item = LonLat>,
    {
        let bounds = bounding_box(points)?;
        Some(Self::new(cell_size_km, bounds.center_lat()))
    }

    /// The cell containing `point`. Points on a cell's south or west edge
    /// belong to that cell.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, [lng, lat]: LonLat) -> GridCell {
        GridCell {
            row: (lat / self.lat_step).floor() as i64,
            col: (lng / self.lng_step).floor() as i64,
        }
    }

    /// Extent of `cell` in degrees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_bounds(&self, cell: GridCell) -> BoundingBox {
        let min_lat = cell.row as f64 * self.lat_step;
        let min_lng = cell.col as f64 * self.lng_step;
        BoundingBox {
            min_lng,
            min_lat,
            max_lng: min_lng + self.lng_step,
            max_lat: min_lat + self.lat_step,
        }
    }

    /// Geometric center of `cell`.
    #[must_use]
    pub fn cell_center(&self, cell: GridCell) -> LonLat {
        let b = self.cell_bounds(cell);
        [
            self.lng_step.mul_add(0.5, b.min_lng),
            self.lat_step.mul_add(0.5, b.min_lat),
        ]
    }
}

/// Bins records into cells and reports every cell holding at least four
/// records.
///
/// Returns nothing when given fewer than eight records or a cell size that
/// is not a positive number. Hotspots come back in cell order; use
/// [`rank_by_density`] to rank them.
#[must_use]
pub fn detect<'a, I>(records: I, cell_size_km: f64) -> Vec<GridHotspot<'a>>
where
    I: IntoIterator<Item = &'a CrashRecord>,
{
    let records: Vec<&CrashRecord> = records.into_iter().collect();

    if records.len() < GRID_MIN_INPUT {
        log::debug!(
            "Grid detection skipped: {} records (minimum {GRID_MIN_INPUT})",
            records.len()
        );
        return Vec::new();
    }
    if !(cell_size_km.is_finite() && cell_size_km > 0.0) {
        log::warn!("Grid detection skipped: invalid cell size {cell_size_km} km");
        return Vec::new();
    }

    let Some(grid) = GridSpec::for_points(records.iter().map(|r| r.coordinates), cell_size_km)
    else {
        return Vec::new();
    };

    let mut cells: BTreeMap<GridCell, Vec<&CrashRecord>> = BTreeMap::new();
    for record in records {
        cells
            .entry(grid.cell_of(record.coordinates))
            .or_default()
            .push(record);
    }
    let occupied = cells.len();

    let hotspots: Vec<GridHotspot<'a>> = cells
        .into_iter()
        .filter(|(_, points)| points.len() >= GRID_MIN_POINTS)
        .map(|(cell, points)| {
            let bounds = grid.cell_bounds(cell);
            let area_km2 = bounds.area_km2();
            #[allow(clippy::cast_precision_loss)]
            let density = points.len() as f64 / area_km2;

            GridHotspot {
                cell,
                center: grid.cell_center(cell),
                bounds,
                area_km2,
                density,
                points,
            }
        })
        .collect();

    log::debug!(
        "Grid detection: {occupied} occupied cells, {} hotspots at {cell_size_km} km",
        hotspots.len()
    );

    hotspots
}

/// Sorts hotspots by descending density. Equal densities keep their
/// relative order.
pub fn rank_by_density(hotspots: &mut [GridHotspot<'_>]) {
    hotspots.sort_by(|a, b| b.density.total_cmp(&a.density));
}

#[cfg(test)]
mod tests {
    use crash_map_crash_models::Severity;
    use crash_map_hotspot_models::Hotspot;
    use crash_map_spatial::haversine_distance_km;

    use super::*;
    use crate::test_support::record;

    /// Far-away records that pin the bounding box to a mid-latitude of
    /// 29.75° without landing near the test cluster.
    fn outliers() -> Vec<CrashRecord> {
        vec![
            record("far-1", -96.0, 29.0),
            record("far-2", -94.5, 30.5),
            record("far-3", -95.0, 29.2),
        ]
    }

    fn houston_grid() -> GridSpec {
        GridSpec::new(0.5, 29.75)
    }

    /// Points strictly inside the cell holding `anchor`.
    fn points_in_cell_of(anchor: LonLat, n: u32) -> Vec<LonLat> {
        let grid = houston_grid();
        let b = grid.cell_bounds(grid.cell_of(anchor));
        (0..n)
            .map(|i| {
                let t = f64::from(i + 1) / f64::from(n + 1);
                [
                    grid.lng_step.mul_add(t, b.min_lng),
                    grid.lat_step.mul_add(t, b.min_lat),
                ]
            })
            .collect()
    }

    #[test]
    fn cell_bounds_contain_their_points() {
        let grid = houston_grid();
        for p in [[-95.37, 29.76], [0.001, 0.001], [-0.001, -0.001], [151.2, -33.86]] {
            let cell = grid.cell_of(p);
            assert!(grid.cell_bounds(cell).contains(p), "{p:?}");
        }
    }

    #[test]
    fn points_on_a_cell_edge_start_that_cell() {
        let grid = GridSpec {
            lat_step: 0.5,
            lng_step: 0.5,
        };
        assert_eq!(grid.cell_of([1.0, 1.0]), GridCell { row: 2, col: 2 });
        assert_eq!(grid.cell_of([-0.5, -0.5]), GridCell { row: -1, col: -1 });
    }

    #[test]
    fn finds_one_dense_cell_among_scattered_points() {
        let mut records = outliers();
        for (i, p) in points_in_cell_of([-95.37, 29.76], 5).into_iter().enumerate() {
            records.push(record(&format!("c{i}"), p[0], p[1]));
        }
        assert_eq!(records.len(), 8);

        let hotspots = detect(&records, 0.5);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].count(), 5);
        assert!(hotspots[0].points.iter().all(|r| r.id.starts_with('c')));
    }

    #[test]
    fn fewer_than_eight_records_yield_nothing() {
        for n in 0..8 {
            let records: Vec<CrashRecord> = (0..n)
                .map(|i| record(&i.to_string(), -95.37, 29.76))
                .collect();
            assert!(detect(&records, 0.5).is_empty(), "n = {n}");
        }
    }

    #[test]
    fn three_points_in_a_cell_are_not_a_hotspot() {
        let mut records = outliers();
        for (i, p) in points_in_cell_of([-95.37, 29.76], 3).into_iter().enumerate() {
            records.push(record(&format!("c{i}"), p[0], p[1]));
        }
        records.push(record("x1", -95.8, 29.9));
        records.push(record("x2", -94.9, 29.4));
        assert_eq!(records.len(), 8);
        assert!(detect(&records, 0.5).is_empty());
    }

    #[test]
    fn density_uses_the_physical_cell_area() {
        let mut records = outliers();
        for (i, p) in points_in_cell_of([-95.37, 29.76], 8).into_iter().enumerate() {
            records.push(record(&format!("c{i}"), p[0], p[1]));
        }

        let hotspots = detect(&records, 0.5);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].count(), 8);

        let h = &hotspots[0];
        assert!((h.density - 8.0 / h.area_km2).abs() < 1e-9);
        assert!((h.area_km2 - h.bounds.area_km2()).abs() < f64::EPSILON);
        assert!(h.area_km2 > 0.2 && h.area_km2 < 0.3, "area {}", h.area_km2);
        assert_eq!(h.density(), Some(h.density));
    }

    #[test]
    fn invalid_cell_size_yields_nothing() {
        let records: Vec<CrashRecord> = (0..10)
            .map(|i| record(&i.to_string(), -95.37, 29.76))
            .collect();
        assert!(detect(&records, 0.0).is_empty());
        assert!(detect(&records, f64::NAN).is_empty());
        assert!(detect(&records, -1.0).is_empty());
    }

    #[test]
    fn detection_does_not_depend_on_record_order() {
        let mut records = outliers();
        for (i, p) in points_in_cell_of([-95.37, 29.76], 6).into_iter().enumerate() {
            records.push(record(&format!("c{i}"), p[0], p[1]));
        }
        let forward = detect(&records, 0.5);
        let backward = detect(records.iter().rev(), 0.5);
        assert_eq!(forward.len(), backward.len());
        assert_eq!(forward[0].cell, backward[0].cell);
        assert_eq!(forward[0].count(), backward[0].count());
    }

    #[test]
    fn ranks_by_descending_density() {
        let mut records = outliers();
        for (i, p) in points_in_cell_of([-95.37, 29.76], 4).into_iter().enumerate() {
            records.push(record(&format!("a{i}"), p[0], p[1]));
        }
        for (i, p) in points_in_cell_of([-95.30, 29.70], 6).into_iter().enumerate() {
            records.push(record(&format!("b{i}"), p[0], p[1]));
        }

        let mut hotspots = detect(&records, 0.5);
        assert_eq!(hotspots.len(), 2);
        rank_by_density(&mut hotspots);
        assert_eq!(hotspots[0].count(), 6);
        assert_eq!(hotspots[1].count(), 4);
        assert!(hotspots[0].density >= hotspots[1].density);
    }

    #[test]
    fn five_fatal_crashes_near_downtown_form_one_hotspot() {
        let anchor = [-95.37, 29.76];
        let grid = houston_grid();
        let center = grid.cell_center(grid.cell_of(anchor));

        let mut records = vec![
            record("a1", anchor[0], anchor[1]),
            record("a2", anchor[0], anchor[1]),
        ];
        for (i, t) in [0.1, 0.2, 0.3].into_iter().enumerate() {
            let p = [
                (center[0] - anchor[0]).mul_add(t, anchor[0]),
                (center[1] - anchor[1]).mul_add(t, anchor[1]),
            ];
            assert!(haversine_distance_km(anchor, p) < 0.2);
            records.push(record(&format!("n{i}"), p[0], p[1]));
        }
        records.extend(outliers());

        let hotspots = detect(&records, 0.5);
        assert_eq!(hotspots.len(), 1);

        let hotspot = &hotspots[0];
        assert_eq!(hotspot.count(), 5);
        assert!((hotspot.density - 5.0 / hotspot.bounds.area_km2()).abs() < 1e-9);

        let summary = crash_map_analytics::summarize_cluster(hotspot.points());
        assert_eq!(summary.severity_counts[&Severity::Fatal], 5);
        for severity in [
            Severity::SuspectedSerious,
            Severity::SuspectedMinor,
            Severity::PossibleInjury,
        ] {
            assert_eq!(summary.severity_counts[&severity], 0);
        }
    }
}
