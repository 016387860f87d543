//! Neighbor hotspot detector.
//!
//! A greedy sweep in input order: each record not yet claimed by an
//! earlier hotspot becomes a seed, and if at least three other unclaimed
//! records lie within the radius, the seed and all of them form a hotspot.
//! Membership therefore depends on record order; the same records in a
//! different order can produce different hotspots.

use crash_map_crash_models::CrashRecord;
use crash_map_hotspot_models::{NEIGHBOR_MIN_INPUT, NEIGHBOR_MIN_NEIGHBORS, NeighborHotspot};
use crash_map_spatial::{PointIndex, centroid};

/// Runs the neighbor sweep.
///
/// Returns nothing when given fewer than four records or a radius that is
/// negative or not a number. Hotspots are numbered `hotspot-1`,
/// `hotspot-2`, ... in the order they are found.
#[must_use]
pub fn detect<'a, I>(records: I, radius_km: f64) -> Vec<NeighborHotspot<'a>>
where
    I: IntoIterator<Item = &'a CrashRecord>,
{
    let records: Vec<&CrashRecord> = records.into_iter().collect();

    if records.len() < NEIGHBOR_MIN_INPUT {
        log::debug!(
            "Neighbor detection skipped: {} records (minimum {NEIGHBOR_MIN_INPUT})",
            records.len()
        );
        return Vec::new();
    }
    if !(radius_km.is_finite() && radius_km >= 0.0) {
        log::warn!("Neighbor detection skipped: invalid radius {radius_km} km");
        return Vec::new();
    }

    let index = PointIndex::new(records.iter().map(|r| r.coordinates).collect());
    let mut claimed = vec![false; records.len()];
    let mut hotspots = Vec::new();

    for (seed, record) in records.iter().enumerate() {
        if claimed[seed] {
            continue;
        }

        let neighbors: Vec<usize> = index
            .within_km(record.coordinates, radius_km)
            .into_iter()
            .filter(|&i| i != seed && !claimed[i])
            .collect();

        if neighbors.len() < NEIGHBOR_MIN_NEIGHBORS {
            continue;
        }

        let members: Vec<usize> = std::iter::once(seed).chain(neighbors).collect();
        for &i in &members {
            claimed[i] = true;
        }

        let points: Vec<&'a CrashRecord> = members.iter().map(|&i| records[i]).collect();
        let Some(center) = centroid(points.iter().map(|r| r.coordinates)) else {
            continue;
        };

        hotspots.push(NeighborHotspot {
            id: format!("hotspot-{}", hotspots.len() + 1),
            center,
            radius_km,
            points,
        });
    }

    log::debug!(
        "Neighbor detection: {} hotspots at {radius_km} km from {} records",
        hotspots.len(),
        records.len()
    );

    hotspots
}

/// Sorts hotspots by descending size. Equal sizes keep their relative
/// order.
pub fn sort_by_size(hotspots: &mut [NeighborHotspot<'_>]) {
    hotspots.sort_by(|a, b| b.points.len().cmp(&a.points.len()));
}

#[cfg(test)]
mod tests {
    use crash_map_crash_models::CrashKind;
    use crash_map_hotspot_models::Hotspot;
    use crash_map_spatial::haversine_distance_km;

    use super::*;
    use crate::test_support::record;

    /// Offsets a point by roughly `east_km` and `north_km`.
    fn offset(origin: [f64; 2], east_km: f64, north_km: f64) -> [f64; 2] {
        [
            origin[0] + east_km / (111.0 * origin[1].to_radians().cos()),
            origin[1] + north_km / 111.0,
        ]
    }

    const DOWNTOWN: [f64; 2] = [-95.37, 29.76];

    #[test]
    fn fewer_than_four_records_yield_nothing() {
        let records: Vec<CrashRecord> = (0..3)
            .map(|i| record(&i.to_string(), DOWNTOWN[0], DOWNTOWN[1]))
            .collect();
        assert!(detect(&records, 0.3).is_empty());
    }

    #[test]
    fn four_coincident_records_form_one_hotspot() {
        let records: Vec<CrashRecord> = (0..4)
            .map(|i| record(&i.to_string(), DOWNTOWN[0], DOWNTOWN[1]))
            .collect();
        let hotspots = detect(&records, 0.3);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].id, "hotspot-1");
        assert_eq!(hotspots[0].count(), 4);
        assert!((hotspots[0].center[0] - DOWNTOWN[0]).abs() < 1e-12);
        assert!((hotspots[0].center[1] - DOWNTOWN[1]).abs() < 1e-12);
    }

    #[test]
    fn three_close_records_are_not_enough() {
        let mut records: Vec<CrashRecord> = (0..3)
            .map(|i| record(&i.to_string(), DOWNTOWN[0], DOWNTOWN[1]))
            .collect();
        let far = offset(DOWNTOWN, 5.0, 0.0);
        records.push(record("far", far[0], far[1]));
        assert!(detect(&records, 0.3).is_empty());
    }

    #[test]
    fn every_hotspot_has_at_least_four_records() {
        let mut records = Vec::new();
        for i in 0..40_u32 {
            let east = f64::from(i % 8) * 0.15;
            let north = f64::from(i / 8) * 0.15;
            let p = offset(DOWNTOWN, east, north);
            records.push(record(&i.to_string(), p[0], p[1]));
        }

        let hotspots = detect(&records, 0.3);
        assert!(!hotspots.is_empty());
        for h in &hotspots {
            assert!(h.count() >= 4, "{} has {}", h.id, h.count());
        }
    }

    #[test]
    fn no_record_belongs_to_two_hotspots() {
        let mut records = Vec::new();
        for i in 0..30_u32 {
            let p = offset(DOWNTOWN, f64::from(i) * 0.1, 0.0);
            records.push(record(&i.to_string(), p[0], p[1]));
        }

        let hotspots = detect(&records, 0.3);
        let mut ids: Vec<&str> = hotspots
            .iter()
            .flat_map(|h| h.points.iter().map(|r| r.id.as_str()))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn members_are_within_radius_of_the_seed() {
        let mut records = Vec::new();
        for i in 0..20_u32 {
            let p = offset(DOWNTOWN, f64::from(i % 5) * 0.08, f64::from(i / 5) * 0.08);
            records.push(record(&i.to_string(), p[0], p[1]));
        }

        for h in detect(&records, 0.2) {
            let seed = h.points[0].coordinates;
            for r in &h.points {
                assert!(haversine_distance_km(seed, r.coordinates) <= 0.2);
            }
        }
    }

    #[test]
    fn seed_comes_first_then_neighbors_in_input_order() {
        let a = offset(DOWNTOWN, 0.0, 0.0);
        let b = offset(DOWNTOWN, 0.1, 0.0);
        let c = offset(DOWNTOWN, 0.0, 0.1);
        let d = offset(DOWNTOWN, -0.1, 0.0);
        let records = vec![
            record("d", d[0], d[1]),
            record("a", a[0], a[1]),
            record("b", b[0], b[1]),
            record("c", c[0], c[1]),
        ];

        let hotspots = detect(&records, 0.3);
        assert_eq!(hotspots.len(), 1);
        let ids: Vec<&str> = hotspots[0].points.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["d", "a", "b", "c"]);
    }

    #[test]
    fn membership_depends_on_record_order() {
        // Two groups of three around a shared middle record. Whichever group
        // is swept first claims the middle one.
        let west: Vec<[f64; 2]> = (1..=3)
            .map(|i| offset(DOWNTOWN, -0.05 * f64::from(i), 0.0))
            .collect();
        let east: Vec<[f64; 2]> = (1..=3)
            .map(|i| offset(DOWNTOWN, 0.05 * f64::from(i), 0.0))
            .collect();

        let mut west_first = Vec::new();
        for (i, p) in west.iter().enumerate() {
            west_first.push(record(&format!("w{i}"), p[0], p[1]));
        }
        west_first.push(record("mid", DOWNTOWN[0], DOWNTOWN[1]));
        for (i, p) in east.iter().enumerate() {
            west_first.push(record(&format!("e{i}"), p[0], p[1]));
        }

        let forward = detect(&west_first, 0.16);
        let backward = detect(west_first.iter().rev(), 0.16);

        fn first_ids(hotspots: &[NeighborHotspot<'_>]) -> Vec<String> {
            hotspots[0].points.iter().map(|r| r.id.clone()).collect()
        }

        assert!(first_ids(&forward).contains(&"mid".to_string()));
        assert!(first_ids(&forward).iter().any(|id| id.starts_with('w')));
        assert!(first_ids(&backward).contains(&"mid".to_string()));
        assert!(first_ids(&backward).iter().any(|id| id.starts_with('e')));
    }

    #[test]
    fn does_not_modify_records() {
        let records: Vec<CrashRecord> = (0..6)
            .map(|i| record(&i.to_string(), DOWNTOWN[0], DOWNTOWN[1]))
            .collect();
        let before = records.clone();
        let _ = detect(&records, 0.3);
        let again = detect(&records, 0.3);
        assert_eq!(records, before);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].count(), 6);
        assert!(again[0].points.iter().all(|r| r.kind == CrashKind::Pedestrian));
    }

    #[test]
    fn sorts_by_descending_size() {
        let mut records = Vec::new();
        for i in 0..4 {
            records.push(record(&format!("small{i}"), DOWNTOWN[0], DOWNTOWN[1]));
        }
        let far = offset(DOWNTOWN, 10.0, 0.0);
        for i in 0..7 {
            records.push(record(&format!("big{i}"), far[0], far[1]));
        }

        let mut hotspots = detect(&records, 0.3);
        assert_eq!(hotspots[0].count(), 4);
        sort_by_size(&mut hotspots);
        assert_eq!(hotspots[0].count(), 7);
        assert_eq!(hotspots[0].id, "hotspot-2");
    }
}
