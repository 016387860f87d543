//! `GeoJSON` projection of hotspot outlines.

use crash_map_hotspot_models::Hotspot;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};

/// One polygon feature for a hotspot, with `id`, `count` and (grid
/// hotspots only) `density` properties.
#[must_use]
pub fn hotspot_feature<H: Hotspot>(hotspot: &H) -> Feature {
    let outline = hotspot.outline();

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), JsonValue::from(hotspot.id()));
    properties.insert("count".to_string(), JsonValue::from(hotspot.count()));
    if let Some(density) = hotspot.density() {
        properties.insert("density".to_string(), JsonValue::from(density));
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&outline))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Outlines for every hotspot, in the given order.
#[must_use]
pub fn outlines<H: Hotspot>(hotspots: &[H]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: hotspots.iter().map(hotspot_feature).collect(),
        foreign_members: None,
    }
}
