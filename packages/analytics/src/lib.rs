#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash statistics.
//!
//! [`statistics`] aggregates a filtered slice of the dataset;
//! [`summarize_cluster`] breaks down the records of one hotspot. Both are
//! pure functions of the records they are given.

pub mod cluster;
pub mod stats;

pub use cluster::summarize_cluster;
pub use crash_map_analytics_models::{ClusterSummary, StatsSummary, StreetCount};
pub use stats::{distinct_years, statistics};

/// `part / whole` as a percentage, or `0.0` when `whole` is zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Rounds to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
