#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical crash record schema and query filters.
//!
//! Both crash sources (pedestrian and cyclist) are normalized into
//! [`CrashRecord`] values. Everything downstream of the normalizer (the
//! store, the hotspot detectors, the statistics) speaks only this schema.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The road user involved in a crash.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CrashKind {
    /// Pedestrian-involved crash
    Pedestrian,
    /// Pedalcyclist-involved crash
    Cyclist,
}

impl CrashKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pedestrian, Self::Cyclist]
    }
}

/// KABCO injury severity code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Severity {
    /// K: fatal injury
    #[serde(rename = "K")]
    #[strum(serialize = "K")]
    Fatal,
    /// A: suspected serious injury
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    SuspectedSerious,
    /// B: suspected minor injury
    #[serde(rename = "B")]
    #[strum(serialize = "B")]
    SuspectedMinor,
    /// C: possible injury
    #[serde(rename = "C")]
    #[strum(serialize = "C")]
    PossibleInjury,
    /// Anything the source did not code as K, A, B or C
    #[serde(rename = "U")]
    #[strum(serialize = "U")]
    Unknown,
}

impl Severity {
    /// Maps an extracted severity code to a [`Severity`]. Codes other than
    /// `K`, `A`, `B` and `C` (case-insensitive) map to [`Severity::Unknown`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        code.trim().parse().unwrap_or(Self::Unknown)
    }

    /// The one-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Fatal => "K",
            Self::SuspectedSerious => "A",
            Self::SuspectedMinor => "B",
            Self::PossibleInjury => "C",
            Self::Unknown => "U",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fatal => "Fatal Injury",
            Self::SuspectedSerious => "Suspected Serious Injury",
            Self::SuspectedMinor => "Suspected Minor Injury",
            Self::PossibleInjury => "Possible Injury",
            Self::Unknown => "Unknown Severity",
        }
    }

    /// Whether this is a non-fatal injury (A, B or C).
    #[must_use]
    pub const fn is_injury(self) -> bool {
        matches!(
            self,
            Self::SuspectedSerious | Self::SuspectedMinor | Self::PossibleInjury
        )
    }

    /// The four KABC codes that statistics always report, zero-filled.
    #[must_use]
    pub const fn coded() -> &'static [Self] {
        &[
            Self::Fatal,
            Self::SuspectedSerious,
            Self::SuspectedMinor,
            Self::PossibleInjury,
        ]
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Fatal,
            Self::SuspectedSerious,
            Self::SuspectedMinor,
            Self::PossibleInjury,
            Self::Unknown,
        ]
    }
}

/// Whether the crash report places the crash at an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntersectionDetail {
    /// Reported at or related to an intersection.
    #[serde(rename = "At Intersection")]
    AtIntersection,
    /// Reported away from any intersection.
    #[serde(rename = "Not at Intersection")]
    NotAtIntersection,
    /// The source did not say.
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl IntersectionDetail {
    /// Display text (empty when unspecified).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AtIntersection => "At Intersection",
            Self::NotAtIntersection => "Not at Intersection",
            Self::Unspecified => "",
        }
    }
}

/// Posted speed-limit ranges used by the statistics views.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
)]
pub enum SpeedLimitBucket {
    /// 25 mph and below
    #[serde(rename = "0-25")]
    #[strum(serialize = "0-25")]
    UpTo25,
    /// 26 through 35 mph
    #[serde(rename = "30-35")]
    #[strum(serialize = "30-35")]
    From30To35,
    /// 36 through 45 mph
    #[serde(rename = "40-45")]
    #[strum(serialize = "40-45")]
    From40To45,
    /// Above 45 mph
    #[serde(rename = "50+")]
    #[strum(serialize = "50+")]
    Over50,
    /// No usable speed limit on the record
    #[serde(rename = "Unknown")]
    #[strum(serialize = "Unknown")]
    Unknown,
}

impl SpeedLimitBucket {
    /// Buckets a posted speed limit. A missing or zero limit is
    /// [`SpeedLimitBucket::Unknown`].
    #[must_use]
    pub const fn from_speed_limit(speed_limit: Option<u32>) -> Self {
        match speed_limit {
            None | Some(0) => Self::Unknown,
            Some(1..=25) => Self::UpTo25,
            Some(26..=35) => Self::From30To35,
            Some(36..=45) => Self::From40To45,
            Some(_) => Self::Over50,
        }
    }

    /// Returns all variants of this enum, in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::UpTo25,
            Self::From30To35,
            Self::From40To45,
            Self::Over50,
            Self::Unknown,
        ]
    }
}

/// Street name used when the source leaves the field blank.
pub const UNKNOWN_STREET: &str = "Unknown";

static TRAILING_SPEED_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+([0-9]+)$").unwrap_or_else(|_| unreachable!()));

/// Parses the posted speed limit some sources append to the street name
/// (e.g. `"MAIN ST 35"` -> `Some(35)`).
#[must_use]
pub fn parse_trailing_speed_limit(street_name: &str) -> Option<u32> {
    TRAILING_SPEED_LIMIT
        .captures(street_name.trim_end())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Removes a trailing speed-limit token from a street name.
#[must_use]
pub fn strip_trailing_speed_limit(street_name: &str) -> &str {
    let trimmed = street_name.trim_end();
    TRAILING_SPEED_LIMIT
        .find(trimmed)
        .map_or(trimmed, |m| &trimmed[..m.start()])
}

/// Phrases in the contributing-factors text that mark a crash as
/// speed-related.
pub const SPEED_KEYWORDS: &[&str] = &["speed", "speeding", "unsafe speed", "over the limit"];

/// A crash normalized to the canonical schema.
///
/// Records are immutable once they leave the normalizer; filtering and
/// clustering only ever borrow them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashRecord {
    /// Crash ID from the source file. Unique within one source only.
    pub id: String,
    /// Road user involved.
    #[serde(rename = "type")]
    pub kind: CrashKind,
    /// `[longitude, latitude]` in WGS84, GeoJSON order.
    pub coordinates: [f64; 2],
    /// KABCO severity.
    pub severity: Severity,
    /// Crash date, `YYYY-MM-DD` when the source used `MM/DD/YY`.
    pub date: String,
    /// Year from the dedicated source column.
    pub year: Option<i32>,
    /// Month (1-12) from the dedicated source column.
    pub month: Option<u32>,
    /// Raw crash time (`HHMM` or `HH:MM`).
    pub time: String,
    /// City name, `"Unknown"` if absent.
    pub location: String,
    /// Street name as given, `"Unknown"` if absent.
    pub street_name: String,
    /// Posted speed limit in mph, when the source provides one.
    pub speed_limit: Option<u32>,
    /// Title-cased contributing factors joined with `"; "`.
    pub factors: String,
    /// Weather label (e.g. `"Clear"`).
    pub weather: String,
    /// Light condition label (e.g. `"Dark, not lighted"`).
    pub light_condition: String,
    /// At-intersection flag.
    pub at_intersection: bool,
    /// Intersection relation detail.
    pub intersection_details: IntersectionDetail,
}

impl CrashRecord {
    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Street name without the trailing speed-limit token.
    #[must_use]
    pub fn street_label(&self) -> &str {
        strip_trailing_speed_limit(&self.street_name)
    }

    /// Whether the street name is the `"Unknown"` placeholder.
    #[must_use]
    pub fn has_known_street(&self) -> bool {
        !self.street_name.is_empty() && self.street_name != UNKNOWN_STREET
    }

    /// Speed-limit bucket for this crash.
    #[must_use]
    pub const fn speed_limit_bucket(&self) -> SpeedLimitBucket {
        SpeedLimitBucket::from_speed_limit(self.speed_limit)
    }

    /// Whether the contributing factors mention speed.
    #[must_use]
    pub fn is_speed_related(&self) -> bool {
        let factors = self.factors.to_lowercase();
        SPEED_KEYWORDS.iter().any(|k| factors.contains(k))
    }

    /// Whether the crash was fatal.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// A filter over one dimension of the crash data: everything, one value,
/// or any of a set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<T: Ord> {
    /// No constraint.
    All,
    /// Exactly this value.
    One(T),
    /// Any value in the set. An empty set matches nothing.
    Many(BTreeSet<T>),
}

impl<T: Ord> Filter<T> {
    /// Whether `value` satisfies this filter.
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::One(expected) => expected == value,
            Self::Many(set) => set.contains(value),
        }
    }

    /// Like [`Filter::matches`] for an optional value. A missing value
    /// only passes [`Filter::All`].
    #[must_use]
    pub fn matches_opt(&self, value: Option<&T>) -> bool {
        match value {
            Some(v) => self.matches(v),
            None => self.is_all(),
        }
    }

    /// Whether this filter imposes no constraint.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T: Ord> Default for Filter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Ord> From<T> for Filter<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T: Ord> FromIterator<T> for Filter<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::Many(iter.into_iter().collect())
    }
}

/// Conjunctive filter over crash kind, severity and year.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrashQuery {
    /// Crash kind constraint.
    pub kind: Filter<CrashKind>,
    /// Severity constraint.
    pub severity: Filter<Severity>,
    /// Year constraint.
    pub year: Filter<i32>,
}

impl CrashQuery {
    /// A query that matches every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Sets the crash kind constraint.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<Filter<CrashKind>>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Sets the severity constraint.
    #[must_use]
    pub fn with_severity(mut self, severity: impl Into<Filter<Severity>>) -> Self {
        self.severity = severity.into();
        self
    }

    /// Sets the year constraint.
    #[must_use]
    pub fn with_year(mut self, year: impl Into<Filter<i32>>) -> Self {
        self.year = year.into();
        self
    }

    /// Whether `record` satisfies all three constraints.
    #[must_use]
    pub fn matches(&self, record: &CrashRecord) -> bool {
        self.kind.matches(&record.kind)
            && self.severity.matches(&record.severity)
            && self.year.matches_opt(record.year.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: CrashKind, severity: Severity, year: Option<i32>) -> CrashRecord {
        CrashRecord {
            id: "1".to_string(),
            kind,
            coordinates: [-95.37, 29.76],
            severity,
            date: "2022-01-01".to_string(),
            year,
            month: Some(1),
            time: "1430".to_string(),
            location: "Houston".to_string(),
            street_name: "MAIN ST 45".to_string(),
            speed_limit: Some(45),
            factors: "Failed To Yield Right Of Way".to_string(),
            weather: "Clear".to_string(),
            light_condition: "Daylight".to_string(),
            at_intersection: true,
            intersection_details: IntersectionDetail::AtIntersection,
        }
    }

    #[test]
    fn severity_from_code() {
        assert_eq!(Severity::from_code("K"), Severity::Fatal);
        assert_eq!(Severity::from_code(" a "), Severity::SuspectedSerious);
        assert_eq!(Severity::from_code("B"), Severity::SuspectedMinor);
        assert_eq!(Severity::from_code("C"), Severity::PossibleInjury);
        assert_eq!(Severity::from_code("N"), Severity::Unknown);
        assert_eq!(Severity::from_code(""), Severity::Unknown);
    }

    #[test]
    fn severity_code_roundtrip() {
        for severity in Severity::all() {
            assert_eq!(Severity::from_code(severity.code()), *severity);
        }
    }

    #[test]
    fn severity_serializes_as_code() {
        let json = serde_json::to_string(&Severity::Fatal).unwrap();
        assert_eq!(json, "\"K\"");
    }

    #[test]
    fn crash_kind_parses_case_insensitively() {
        assert_eq!("Pedestrian".parse::<CrashKind>().unwrap(), CrashKind::Pedestrian);
        assert_eq!("cyclist".parse::<CrashKind>().unwrap(), CrashKind::Cyclist);
        assert!("driver".parse::<CrashKind>().is_err());
    }

    #[test]
    fn speed_limit_buckets() {
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(20)), SpeedLimitBucket::UpTo25);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(25)), SpeedLimitBucket::UpTo25);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(30)), SpeedLimitBucket::From30To35);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(35)), SpeedLimitBucket::From30To35);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(40)), SpeedLimitBucket::From40To45);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(45)), SpeedLimitBucket::From40To45);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(50)), SpeedLimitBucket::Over50);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(70)), SpeedLimitBucket::Over50);
        assert_eq!(SpeedLimitBucket::from_speed_limit(Some(0)), SpeedLimitBucket::Unknown);
        assert_eq!(SpeedLimitBucket::from_speed_limit(None), SpeedLimitBucket::Unknown);
    }

    #[test]
    fn street_ending_in_45_lands_only_in_40_45_bucket() {
        let limit = parse_trailing_speed_limit("WESTHEIMER RD 45");
        assert_eq!(limit, Some(45));
        let bucket = SpeedLimitBucket::from_speed_limit(limit);
        let hits: Vec<_> = SpeedLimitBucket::all()
            .iter()
            .filter(|b| **b == bucket)
            .collect();
        assert_eq!(hits, vec![&SpeedLimitBucket::From40To45]);
    }

    #[test]
    fn trailing_speed_limit_requires_separator() {
        assert_eq!(parse_trailing_speed_limit("MAIN ST 30"), Some(30));
        assert_eq!(parse_trailing_speed_limit("MAIN ST"), None);
        assert_eq!(parse_trailing_speed_limit("I45"), None);
        assert_eq!(parse_trailing_speed_limit("Unknown"), None);
    }

    #[test]
    fn strips_trailing_speed_limit() {
        assert_eq!(strip_trailing_speed_limit("MAIN ST 30"), "MAIN ST");
        assert_eq!(strip_trailing_speed_limit("MAIN ST"), "MAIN ST");
        assert_eq!(strip_trailing_speed_limit("HWY 6 55"), "HWY 6");
    }

    #[test]
    fn speed_related_factors() {
        let mut r = record(CrashKind::Pedestrian, Severity::Fatal, Some(2022));
        assert!(!r.is_speed_related());
        r.factors = "Unsafe Speed; Driver Inattention".to_string();
        assert!(r.is_speed_related());
        r.factors = "Driving Over The Limit".to_string();
        assert!(r.is_speed_related());
    }

    #[test]
    fn filter_variants() {
        assert!(Filter::<i32>::All.matches(&2020));
        assert!(Filter::One(2020).matches(&2020));
        assert!(!Filter::One(2020).matches(&2021));
        let many: Filter<i32> = [2020, 2022].into_iter().collect();
        assert!(many.matches(&2022));
        assert!(!many.matches(&2021));
        assert!(!Filter::Many(BTreeSet::<i32>::new()).matches(&2020));
    }

    #[test]
    fn missing_year_only_matches_all() {
        let r = record(CrashKind::Cyclist, Severity::Unknown, None);
        assert!(CrashQuery::all().matches(&r));
        assert!(!CrashQuery::all().with_year(2022).matches(&r));
    }

    #[test]
    fn query_is_conjunctive() {
        let r = record(CrashKind::Pedestrian, Severity::Fatal, Some(2022));
        let q = CrashQuery::all()
            .with_kind(CrashKind::Pedestrian)
            .with_severity(Severity::Fatal)
            .with_year(2022);
        assert!(q.matches(&r));
        assert!(!q.clone().with_kind(CrashKind::Cyclist).matches(&r));
        assert!(!q.clone().with_severity(Severity::PossibleInjury).matches(&r));
        assert!(!q.with_year(2021).matches(&r));
    }

    #[test]
    fn record_serializes_kind_as_type() {
        let r = record(CrashKind::Cyclist, Severity::SuspectedMinor, Some(2021));
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["type"], "cyclist");
        assert_eq!(value["severity"], "B");
        assert_eq!(value["coordinates"][0], -95.37);
        assert_eq!(value["intersectionDetails"], "At Intersection");
    }
}
