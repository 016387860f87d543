//! Per-hotspot breakdowns.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use crash_map_analytics_models::{ClusterSummary, StreetCount};
use crash_map_crash_models::{
    CrashKind, CrashRecord, Severity, SpeedLimitBucket, strip_trailing_speed_limit,
};

use crate::percentage;

/// Streets listed per hotspot.
const TOP_STREETS: usize = 3;

/// Label used when no street in the hotspot is known.
pub const UNKNOWN_AREA: &str = "Unknown Area";

/// Most frequent known street names. Ties keep first-encountered order.
fn top_streets(points: &[&CrashRecord]) -> Vec<StreetCount> {
    let mut counts: Vec<StreetCount> = Vec::new();
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();

    for record in points.iter().filter(|r| r.has_known_street()) {
        if let Some(&i) = positions.get(record.street_name.as_str()) {
            counts[i].count += 1;
        } else {
            positions.insert(&record.street_name, counts.len());
            counts.push(StreetCount {
                name: record.street_name.clone(),
                count: 1,
            });
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_STREETS);
    counts
}

fn location_label(streets: &[StreetCount]) -> String {
    if streets.is_empty() {
        return UNKNOWN_AREA.to_string();
    }
    streets
        .iter()
        .map(|s| strip_trailing_speed_limit(&s.name))
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Crash ids ordered most recent first. Records whose date does not parse
/// go last, in their original order.
fn ids_most_recent_first(points: &[&CrashRecord]) -> Vec<String> {
    let mut dated: Vec<(Option<NaiveDate>, &str)> = points
        .iter()
        .map(|r| {
            (
                NaiveDate::parse_from_str(&r.date, "%Y-%m-%d").ok(),
                r.id.as_str(),
            )
        })
        .collect();
    dated.sort_by_key(|(date, _)| Reverse(*date));
    dated.into_iter().map(|(_, id)| id.to_string()).collect()
}

/// Summarizes the records of one hotspot.
#[must_use]
pub fn summarize_cluster(points: &[&CrashRecord]) -> ClusterSummary {
    let mut severity_counts: BTreeMap<Severity, usize> =
        Severity::coded().iter().map(|s| (*s, 0)).collect();
    let mut type_counts: BTreeMap<CrashKind, usize> =
        CrashKind::all().iter().map(|k| (*k, 0)).collect();
    let mut year_counts: BTreeMap<i32, usize> = BTreeMap::new();
    let mut speed_limit_counts: BTreeMap<SpeedLimitBucket, usize> =
        SpeedLimitBucket::all().iter().map(|b| (*b, 0)).collect();
    let mut fatal_by_bucket: BTreeMap<SpeedLimitBucket, usize> = BTreeMap::new();

    for record in points {
        if record.severity != Severity::Unknown {
            *severity_counts.entry(record.severity).or_default() += 1;
        }
        *type_counts.entry(record.kind).or_default() += 1;
        if let Some(year) = record.year {
            *year_counts.entry(year).or_default() += 1;
        }

        let bucket = record.speed_limit_bucket();
        *speed_limit_counts.entry(bucket).or_default() += 1;
        if record.is_fatal() {
            *fatal_by_bucket.entry(bucket).or_default() += 1;
        }
    }

    let fatality_rate_by_speed_limit = speed_limit_counts
        .iter()
        .filter(|(_, total)| **total > 0)
        .map(|(bucket, total)| {
            let fatal = fatal_by_bucket.get(bucket).copied().unwrap_or(0);
            (*bucket, percentage(fatal, *total))
        })
        .collect();

    let fatalities = severity_counts[&Severity::Fatal];
    let injuries = points.iter().filter(|r| r.severity.is_injury()).count();
    let top_streets = top_streets(points);

    ClusterSummary {
        total: points.len(),
        fatalities,
        injuries,
        severity_counts,
        type_counts,
        year_counts,
        location_label: location_label(&top_streets),
        top_streets,
        speed_limit_counts,
        fatality_rate_by_speed_limit,
        crash_ids: ids_most_recent_first(points),
    }
}
