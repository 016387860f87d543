//! `GeoJSON` point projection of crash records.
//!
//! This is the hand-off format to map consumers: one point feature per
//! record, carrying the record's display fields as properties.

use crash_map_crash_models::CrashRecord;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

/// One point feature for `record`.
#[must_use]
pub fn record_feature(record: &CrashRecord) -> Feature {
    let mut properties = JsonObject::new();
    let mut set = |key: &str, value: JsonValue| {
        properties.insert(key.to_string(), value);
    };

    set("id", record.id.clone().into());
    set("type", record.kind.to_string().into());
    set("severity", record.severity.code().into());
    set("severityLabel", record.severity.label().into());
    set("date", record.date.clone().into());
    set("year", record.year.map_or(JsonValue::Null, JsonValue::from));
    set("month", record.month.map_or(JsonValue::Null, JsonValue::from));
    set("time", record.time.clone().into());
    set("location", record.location.clone().into());
    set("streetName", record.street_name.clone().into());
    set("streetLabel", record.street_label().into());
    set(
        "speedLimit",
        record.speed_limit.map_or(JsonValue::Null, JsonValue::from),
    );
    set("factors", record.factors.clone().into());
    set("speedRelated", record.is_speed_related().into());
    set("weather", record.weather.clone().into());
    set("lightCondition", record.light_condition.clone().into());
    set("atIntersection", record.at_intersection.into());
    set(
        "intersectionDetails",
        record.intersection_details.as_str().into(),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            record.longitude(),
            record.latitude(),
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Feature collection with one point per record, in the given order.
#[must_use]
pub fn records_to_geojson<'a, I>(records: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a CrashRecord>,
{
    FeatureCollection {
        bbox: None,
        features: records.into_iter().map(record_feature).collect(),
        foreign_members: None,
    }
}
