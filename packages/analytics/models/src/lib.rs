#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics view models.
//!
//! [`StatsSummary`] describes a filtered slice of the whole dataset;
//! [`ClusterSummary`] describes the records of a single hotspot.

use std::collections::BTreeMap;

use crash_map_crash_models::{CrashKind, Severity, SpeedLimitBucket};
use serde::{Deserialize, Serialize};

/// Aggregate statistics over a filtered set of crashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Number of crashes.
    pub total_count: usize,
    /// Crashes per coded severity (`K`, `A`, `B`, `C`; always all four).
    pub count_by_severity: BTreeMap<Severity, usize>,
    /// Crashes whose severity was not one of the four codes.
    pub unknown_severity_count: usize,
    /// Crashes per road user (always both).
    pub count_by_type: BTreeMap<CrashKind, usize>,
    /// Crashes per year, for every year in the loaded dataset.
    pub count_by_year: BTreeMap<i32, usize>,
    /// Crashes per month 1-12.
    pub count_by_month: BTreeMap<u32, usize>,
    /// Crashes flagged as at an intersection.
    pub at_intersection_count: usize,
    /// Share of crashes at an intersection, in percent, one decimal.
    pub at_intersection_percentage: f64,
    /// Crashes per posted speed-limit range (always all five).
    pub speed_limit_counts: BTreeMap<SpeedLimitBucket, usize>,
    /// Fatal crashes per posted speed-limit range (always all five).
    pub fatalities_by_speed_limit: BTreeMap<SpeedLimitBucket, usize>,
    /// Crashes whose contributing factors mention speed.
    pub speed_related_count: usize,
    /// Fatal crashes among the speed-related ones.
    pub speed_related_fatalities: usize,
    /// Share of crashes that are speed related, in percent, one decimal.
    pub speed_related_percentage: f64,
}

/// A street and how many hotspot crashes happened on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetCount {
    /// Street name as recorded.
    pub name: String,
    /// Number of crashes.
    pub count: usize,
}

/// Breakdown of the crashes inside one hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    /// Number of crashes.
    pub total: usize,
    /// Fatal crashes.
    pub fatalities: usize,
    /// Injury crashes (`A`, `B` or `C`).
    pub injuries: usize,
    /// Crashes per coded severity (`K`, `A`, `B`, `C`; always all four).
    pub severity_counts: BTreeMap<Severity, usize>,
    /// Crashes per road user (always both).
    pub type_counts: BTreeMap<CrashKind, usize>,
    /// Crashes per year, only for years that occur.
    pub year_counts: BTreeMap<i32, usize>,
    /// Up to three most frequent known streets.
    pub top_streets: Vec<StreetCount>,
    /// `" & "`-joined top street names without speed-limit tokens, or
    /// `"Unknown Area"`.
    pub location_label: String,
    /// Crashes per posted speed-limit range (always all five).
    pub speed_limit_counts: BTreeMap<SpeedLimitBucket, usize>,
    /// Percentage of fatal crashes per speed-limit range, only for ranges
    /// with at least one crash.
    pub fatality_rate_by_speed_limit: BTreeMap<SpeedLimitBucket, f64>,
    /// Crash ids, most recent first.
    pub crash_ids: Vec<String>,
}
