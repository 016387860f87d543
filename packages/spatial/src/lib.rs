#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geodesic helpers shared by the hotspot detectors.
//!
//! Points are `[longitude, latitude]` pairs in degrees (`GeoJSON` order).
//! Degree/kilometre conversions use a flat 111 km per degree, which is
//! accurate enough for sub-kilometre work at regional scale. Longitude
//! scaling diverges towards the poles, so every function here assumes
//! `|latitude|` well below 90°. The antimeridian is not handled.

pub mod index;

pub use index::PointIndex;

use geo::{Coord, LineString, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// A `[longitude, latitude]` pair in degrees.
pub type LonLat = [f64; 2];

/// Mean Earth radius used by [`haversine_distance_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two points, in kilometres.
#[must_use]
pub fn haversine_distance_km(a: LonLat, b: LonLat) -> f64 {
    let d_lat = (b[1] - a[1]).to_radians();
    let d_lon = (b[0] - a[0]).to_radians();

    let h = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + a[1].to_radians().cos()
            * b[1].to_radians().cos()
            * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Converts a north-south distance to degrees of latitude.
#[must_use]
pub fn km_to_lat_degrees(km: f64) -> f64 {
    km / KM_PER_DEGREE
}

/// Converts an east-west distance to degrees of longitude at the given
/// latitude.
#[must_use]
pub fn km_to_lng_degrees(km: f64, at_latitude: f64) -> f64 {
    km / (KM_PER_DEGREE * at_latitude.to_radians().cos())
}

/// Arithmetic mean of the given points, or `None` if there are none.
#[must_use]
pub fn centroid<I>(points: I) -> Option<LonLat>
where
    I: IntoIterator<Item = LonLat>,
{
    let mut count = 0_u32;
    let mut sum = [0.0, 0.0];

    for [lng, lat] in points {
        sum[0] += lng;
        sum[1] += lat;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let n = f64::from(count);
    Some([sum[0] / n, sum[1] / n])
}

/// An axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Western edge.
    pub min_lng: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Eastern edge.
    pub max_lng: f64,
    /// Northern edge.
    pub max_lat: f64,
}

impl BoundingBox {
    /// Midpoint latitude.
    #[must_use]
    pub fn center_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Midpoint longitude.
    #[must_use]
    pub fn center_lng(&self) -> f64 {
        (self.min_lng + self.max_lng) / 2.0
    }

    /// Physical area in km², measured as the haversine length of the
    /// western edge times that of the southern edge.
    #[must_use]
    pub fn area_km2(&self) -> f64 {
        let south_west = [self.min_lng, self.min_lat];
        let height = haversine_distance_km(south_west, [self.min_lng, self.max_lat]);
        let width = haversine_distance_km(south_west, [self.max_lng, self.min_lat]);
        height * width
    }

    /// Whether the point lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, [lng, lat]: LonLat) -> bool {
        (self.min_lng..=self.max_lng).contains(&lng) && (self.min_lat..=self.max_lat).contains(&lat)
    }

    /// The box as a [`geo::Rect`].
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lng,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lng,
                y: self.max_lat,
            },
        )
    }

    /// The box as a closed polygon.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }
}

/// Bounding box of the given points, or `None` if there are none.
#[must_use]
pub fn bounding_box<I>(points: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = LonLat>,
{
    points.into_iter().fold(None, |acc, [lng, lat]| {
        Some(match acc {
            None => BoundingBox {
                min_lng: lng,
                min_lat: lat,
                max_lng: lng,
                max_lat: lat,
            },
            Some(b) => BoundingBox {
                min_lng: b.min_lng.min(lng),
                min_lat: b.min_lat.min(lat),
                max_lng: b.max_lng.max(lng),
                max_lat: b.max_lat.max(lat),
            },
        })
    })
}

/// Approximates a circle around `center` as a closed polygon.
///
/// The ring has `segments` distinct vertices, starting due east and
/// running counter-clockwise, followed by a copy of the first vertex. The
/// radius is converted with [`km_to_lng_degrees`] at the center's latitude
/// and applied on both axes.
#[must_use]
pub fn circle_polygon(center: LonLat, radius_km: f64, segments: u32) -> Polygon<f64> {
    let radius_deg = km_to_lng_degrees(radius_km, center[1]);
    let step = std::f64::consts::TAU / f64::from(segments.max(1));

    let ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let angle = f64::from(i) * step;
            Coord {
                x: radius_deg.mul_add(angle.cos(), center[0]),
                y: radius_deg.mul_add(angle.sin(), center[1]),
            }
        })
        .collect();

    Polygon::new(LineString::new(ring), vec![])
}
