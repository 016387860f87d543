#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory crash store.
//!
//! Holds the normalized records of every source. The store is unready
//! until the first successful load; an unready store answers every query
//! with an empty result. Records are only ever replaced wholesale.

pub mod geojson_export;

use std::path::Path;

use crash_map_analytics::{distinct_years, statistics};
use crash_map_analytics_models::StatsSummary;
use crash_map_crash_models::{CrashQuery, CrashRecord};
use crash_map_source::{SourceDefinition, SourceError};

pub use geojson_export::{record_feature, records_to_geojson};

/// The loaded crash records and the years they span.
#[derive(Debug, Default)]
pub struct CrashStore {
    records: Vec<CrashRecord>,
    years: Vec<i32>,
    ready: bool,
}

impl CrashStore {
    /// An empty, unready store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A ready store holding `records`.
    #[must_use]
    pub fn from_records(records: Vec<CrashRecord>) -> Self {
        let mut store = Self::new();
        store.replace(records);
        store
    }

    /// Loads every source into a new store.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if any source fails to load.
    pub async fn load(defs: &[SourceDefinition], data_dir: &Path) -> Result<Self, SourceError> {
        let records = crash_map_source::load_all(defs, data_dir).await?;
        Ok(Self::from_records(records))
    }

    /// Replaces the contents with a fresh load of every source and returns
    /// the new record count. On failure the store is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if any source fails to load.
    pub async fn reload(
        &mut self,
        defs: &[SourceDefinition],
        data_dir: &Path,
    ) -> Result<usize, SourceError> {
        let records = crash_map_source::load_all(defs, data_dir).await?;
        self.replace(records);
        Ok(self.len())
    }

    /// Replaces every record and marks the store ready.
    pub fn replace(&mut self, records: Vec<CrashRecord>) {
        self.years = distinct_years(&records);
        self.records = records;
        self.ready = true;

        log::info!(
            "Crash store holds {} records; years: {}",
            self.records.len(),
            self.years
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    /// Whether a load has completed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, in load order.
    #[must_use]
    pub fn records(&self) -> &[CrashRecord] {
        &self.records
    }

    /// Distinct years in the dataset, ascending.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Records matching `query`, in load order.
    #[must_use]
    pub fn query(&self, query: &CrashQuery) -> Vec<&CrashRecord> {
        let matched: Vec<&CrashRecord> = self.records.iter().filter(|r| query.matches(r)).collect();
        log::debug!("Query {query:?} matched {} of {} records", matched.len(), self.len());
        matched
    }

    /// Matching records whose contributing factors mention speed.
    #[must_use]
    pub fn speed_related(&self, query: &CrashQuery) -> Vec<&CrashRecord> {
        self.records
            .iter()
            .filter(|r| query.matches(r) && r.is_speed_related())
            .collect()
    }

    /// Statistics over the records matching `query`.
    #[must_use]
    pub fn statistics(&self, query: &CrashQuery) -> StatsSummary {
        statistics(self.query(query), &self.years)
    }

    /// Matching records as a `GeoJSON` point feature collection.
    #[must_use]
    pub fn to_geojson(&self, query: &CrashQuery) -> geojson::FeatureCollection {
        records_to_geojson(self.query(query))
    }

    /// Speed-related matching records as a `GeoJSON` point feature
    /// collection.
    #[must_use]
    pub fn speed_related_geojson(&self, query: &CrashQuery) -> geojson::FeatureCollection {
        records_to_geojson(self.speed_related(query))
    }
}
