//! Dataset-wide statistics.

use std::collections::{BTreeMap, BTreeSet};

use crash_map_analytics_models::StatsSummary;
use crash_map_crash_models::{CrashKind, CrashRecord, Severity, SpeedLimitBucket};

use crate::{percentage, round1};

/// Distinct years present in the records, ascending. Records without a
/// year are ignored.
#[must_use]
pub fn distinct_years<'a, I>(records: I) -> Vec<i32>
where
    I: IntoIterator<Item = &'a CrashRecord>,
{
    records
        .into_iter()
        .filter_map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn zero_filled<K: Ord + Copy>(keys: impl IntoIterator<Item = K>) -> BTreeMap<K, usize> {
    keys.into_iter().map(|k| (k, 0)).collect()
}

/// Aggregates the given records.
///
/// `dataset_years` are the years of the whole loaded dataset; each appears
/// in [`StatsSummary::count_by_year`] even when no given record falls in
/// it.
#[must_use]
pub fn statistics<'a, I>(records: I, dataset_years: &[i32]) -> StatsSummary
where
    I: IntoIterator<Item = &'a CrashRecord>,
{
    let mut total_count = 0;
    let mut count_by_severity = zero_filled(Severity::coded().iter().copied());
    let mut unknown_severity_count = 0;
    let mut count_by_type = zero_filled(CrashKind::all().iter().copied());
    let mut count_by_year = zero_filled(dataset_years.iter().copied());
    let mut count_by_month = zero_filled(1..=12_u32);
    let mut at_intersection_count = 0;
    let mut speed_limit_counts = zero_filled(SpeedLimitBucket::all().iter().copied());
    let mut fatalities_by_speed_limit = speed_limit_counts.clone();
    let mut speed_related_count = 0;
    let mut speed_related_fatalities = 0;

    for record in records {
        total_count += 1;

        if record.severity == Severity::Unknown {
            unknown_severity_count += 1;
        } else {
            *count_by_severity.entry(record.severity).or_default() += 1;
        }

        *count_by_type.entry(record.kind).or_default() += 1;

        if let Some(year) = record.year {
            *count_by_year.entry(year).or_default() += 1;
        }
        if let Some(month) = record.month
            && let Some(count) = count_by_month.get_mut(&month)
        {
            *count += 1;
        }

        if record.at_intersection {
            at_intersection_count += 1;
        }

        let bucket = record.speed_limit_bucket();
        *speed_limit_counts.entry(bucket).or_default() += 1;
        if record.is_fatal() {
            *fatalities_by_speed_limit.entry(bucket).or_default() += 1;
        }

        if record.is_speed_related() {
            speed_related_count += 1;
            if record.is_fatal() {
                speed_related_fatalities += 1;
            }
        }
    }

    log::debug!(
        "Statistics over {total_count} records ({unknown_severity_count} with unknown severity)"
    );

    StatsSummary {
        total_count,
        count_by_severity,
        unknown_severity_count,
        count_by_type,
        count_by_year,
        count_by_month,
        at_intersection_count,
        at_intersection_percentage: round1(percentage(at_intersection_count, total_count)),
        speed_limit_counts,
        fatalities_by_speed_limit,
        speed_related_count,
        speed_related_fatalities,
        speed_related_percentage: round1(percentage(speed_related_count, total_count)),
    }
}
