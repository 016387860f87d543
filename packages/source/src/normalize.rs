//! Record normalizer.
//!
//! Maps [`RawRow`]s from either crash extract onto the canonical
//! [`CrashRecord`] schema. Rows without a usable location are dropped.

use crash_map_crash_models::{
    CrashKind, CrashRecord, Severity, UNKNOWN_STREET, parse_trailing_speed_limit,
};

use crate::delimited::RawRow;
use crate::parsing::{
    clean_factors, extract_coded_label, extract_severity_code, parse_coordinates, parse_flag,
    parse_intersection_detail, parse_leading_int, reformat_date,
};
use crate::source_def::FieldMapping;

fn field<'a>(row: &'a RawRow, column: &str) -> &'a str {
    row.get(column).map_or("", |v| v.trim())
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Resolves the posted speed limit. A dedicated column wins over the
/// trailing street-name token when both are present.
fn resolve_speed_limit(row: &RawRow, fields: &FieldMapping, street_name: &str) -> Option<u32> {
    let from_street = parse_trailing_speed_limit(street_name);
    let from_column = fields
        .speed_limit
        .as_deref()
        .and_then(|column| parse_leading_int::<u32>(field(row, column)))
        .filter(|&limit| limit > 0);

    match (from_column, from_street) {
        (Some(column), Some(street)) if column != street => {
            log::debug!(
                "Speed limit column ({column}) disagrees with street name \"{street_name}\"; using column"
            );
            Some(column)
        }
        (Some(column), _) => Some(column),
        (None, street) => street,
    }
}

fn normalize_row(row: &RawRow, kind: CrashKind, fields: &FieldMapping) -> Option<CrashRecord> {
    let coordinates = parse_coordinates(field(row, &fields.latitude), field(row, &fields.longitude))?;

    let street_name = non_empty_or(field(row, &fields.street_name), UNKNOWN_STREET);
    let speed_limit = resolve_speed_limit(row, fields, &street_name);

    Some(CrashRecord {
        id: field(row, &fields.id).to_string(),
        kind,
        coordinates: [coordinates.0, coordinates.1],
        severity: Severity::from_code(extract_severity_code(field(row, &fields.severity))),
        date: reformat_date(field(row, &fields.date)),
        year: parse_leading_int(field(row, &fields.year)),
        month: parse_leading_int(field(row, &fields.month)),
        time: field(row, &fields.time).to_string(),
        location: non_empty_or(field(row, &fields.location), "Unknown"),
        street_name,
        speed_limit,
        factors: clean_factors(field(row, &fields.factors)),
        weather: extract_coded_label(field(row, &fields.weather)),
        light_condition: extract_coded_label(field(row, &fields.light_condition)),
        at_intersection: parse_flag(field(row, &fields.at_intersection)),
        intersection_details: parse_intersection_detail(field(row, &fields.intersection_related)),
    })
}

/// Normalizes rows using the default CRIS column names.
#[must_use]
pub fn normalize(rows: &[RawRow], kind: CrashKind) -> Vec<CrashRecord> {
    normalize_with(rows, kind, &FieldMapping::default())
}

/// Normalizes rows using an explicit column mapping.
///
/// Output preserves input order. Rows whose coordinates are missing,
/// non-numeric, or zero are silently dropped.
#[must_use]
pub fn normalize_with(rows: &[RawRow], kind: CrashKind, fields: &FieldMapping) -> Vec<CrashRecord> {
    let records: Vec<CrashRecord> = rows
        .iter()
        .filter_map(|row| normalize_row(row, kind, fields))
        .collect();

    let dropped = rows.len() - records.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} {kind} rows without a usable location");
    }

    records
}
