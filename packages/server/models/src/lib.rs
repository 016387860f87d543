#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crash map server.
//!
//! Filter parameters arrive as `all`, a single value, or a comma-separated
//! list, and are turned into a [`CrashQuery`] here so the handlers never
//! see raw strings.

use std::str::FromStr;

use crash_map_analytics_models::ClusterSummary;
use crash_map_crash_models::{CrashQuery, Filter};
use crash_map_hotspot_models::Hotspot;
use crash_map_spatial::LonLat;
use serde::{Deserialize, Serialize};

/// Keyword accepted by every filter parameter to mean "no constraint".
pub const ALL: &str = "all";

/// A filter parameter that could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid {param} value: {value:?}")]
pub struct InvalidFilter {
    /// Query parameter name.
    pub param: &'static str,
    /// Offending value.
    pub value: String,
}

/// Parses one filter parameter.
///
/// Absent, empty or `all` means [`Filter::All`]; a single value means
/// [`Filter::One`]; a comma-separated list means [`Filter::Many`]. Blank
/// list entries are ignored, and a list with no entries left is
/// [`Filter::All`].
///
/// # Errors
///
/// * If any entry does not parse as `T`
pub fn parse_filter<T>(param: &'static str, raw: Option<&str>) -> Result<Filter<T>, InvalidFilter>
where
    T: FromStr + Ord,
{
    let Some(raw) = raw.map(str::trim) else {
        return Ok(Filter::All);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case(ALL) {
        return Ok(Filter::All);
    }

    let mut values = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>().map_err(|_| InvalidFilter {
                param,
                value: v.to_string(),
            })
        })
        .collect::<Result<Vec<T>, _>>()?;

    Ok(match values.len() {
        0 => Filter::All,
        1 if !raw.contains(',') => Filter::One(values.remove(0)),
        _ => values.into_iter().collect(),
    })
}

/// Filter parameters shared by every crash endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashQueryParams {
    /// `pedestrian`, `cyclist`, a list of both, or `all`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Severity codes (`K`, `A`, `B`, `C`, `U`).
    pub severity: Option<String>,
    /// Calendar years.
    pub year: Option<String>,
    /// Grid cell edge length for grid hotspots.
    pub cell_size_km: Option<f64>,
    /// Neighbor search radius for overview hotspots.
    pub radius_km: Option<f64>,
    /// Keep only crashes whose contributing factors mention speed.
    #[serde(default)]
    pub speed_related: bool,
}

impl CrashQueryParams {
    /// Converts the raw parameters into a [`CrashQuery`].
    ///
    /// # Errors
    ///
    /// * If any filter parameter holds an unknown value
    pub fn to_query(&self) -> Result<CrashQuery, InvalidFilter> {
        Ok(CrashQuery {
            kind: parse_filter("type", self.kind.as_deref())?,
            severity: parse_filter("severity", self.severity.as_deref())?,
            year: parse_filter("year", self.year.as_deref())?,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is up.
    pub healthy: bool,
    /// Whether the initial load has finished.
    pub ready: bool,
    /// Records currently held.
    pub records: usize,
    /// Service version.
    pub version: String,
}

/// Response from a successful reload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReload {
    /// Records now held.
    pub records: usize,
    /// Distinct years now available.
    pub years: Vec<i32>,
}

/// One hotspot together with its breakdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspot<'a, H> {
    /// Stable identifier of the hotspot.
    pub id: String,
    /// Number of member records.
    pub count: usize,
    /// Representative point.
    pub center: LonLat,
    /// Detector-specific fields (cell bounds and density, or radius).
    pub detail: &'a H,
    /// Breakdown of the member records.
    pub summary: ClusterSummary,
}

impl<'a, H: Hotspot> ApiHotspot<'a, H> {
    /// Wraps `hotspot` with its precomputed `summary`.
    #[must_use]
    pub fn new(hotspot: &'a H, summary: ClusterSummary) -> Self {
        Self {
            id: hotspot.id(),
            count: hotspot.count(),
            center: hotspot.center(),
            detail: hotspot,
            summary,
        }
    }
}
