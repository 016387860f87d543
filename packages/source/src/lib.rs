#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash data sources and record normalization.
//!
//! Each source is described by a TOML [`SourceDefinition`]. Loading a
//! source reads its delimited text (from disk or over HTTP), parses it
//! into rows, and normalizes the rows into canonical [`CrashRecord`]s.

pub mod delimited;
pub mod normalize;
pub mod parsing;
pub mod registry;
pub mod retry;
pub mod source_def;

use std::path::Path;

use crash_map_crash_models::{CrashKind, CrashRecord};

pub use delimited::{RawRow, parse_rows};
pub use normalize::{normalize, normalize_with};
pub use source_def::{FieldMapping, SourceDefinition, SourceLocation};

/// Errors that can occur while loading a crash source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with an error status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Delimited-text parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// A source definition is malformed.
    #[error("Source config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// No source with the requested id is configured.
    #[error("Unknown source: {id}")]
    UnknownSource {
        /// The id that was requested.
        id: String,
    },
}

/// Reads the raw text of a source.
///
/// File locations are resolved against `data_dir` unless absolute.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or the HTTP request
/// fails.
pub async fn fetch_text(def: &SourceDefinition, data_dir: &Path) -> Result<String, SourceError> {
    match &def.location {
        SourceLocation::File { path } => {
            let path = data_dir.join(path);
            log::debug!("{}: reading {}", def.id(), path.display());
            Ok(tokio::fs::read_to_string(&path).await?)
        }
        SourceLocation::Url { url } => {
            log::debug!("{}: fetching {url}", def.id());
            let client = reqwest::Client::new();
            retry::send_text(|| client.get(url)).await
        }
    }
}

/// Loads and normalizes one source.
///
/// # Errors
///
/// Returns [`SourceError`] if the text cannot be fetched or its header row
/// cannot be read.
pub async fn load_source(
    def: &SourceDefinition,
    data_dir: &Path,
) -> Result<Vec<CrashRecord>, SourceError> {
    let text = fetch_text(def, data_dir).await?;
    let records = records_from_text(def, &text)?;

    log::info!(
        "{}: {} records from {}",
        def.name(),
        records.len(),
        def.describe_location(data_dir),
    );

    Ok(records)
}

/// Parses and normalizes already-fetched source text.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] if the header row cannot be read.
pub fn records_from_text(
    def: &SourceDefinition,
    text: &str,
) -> Result<Vec<CrashRecord>, SourceError> {
    let rows = parse_rows(text, def.delimiter_byte(), def.header_token.as_deref())?;
    let records = normalize_with(&rows, def.kind, &def.fields);
    log::debug!("{}: {} raw rows, {} records", def.id(), rows.len(), records.len());
    Ok(records)
}

/// Normalizes raw extracts keyed by crash kind, using the registered
/// source of each kind for header detection and field mapping.
///
/// Output follows the order of `texts`.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if no source is registered for a kind,
/// or [`SourceError::Csv`] if a header row cannot be read.
pub fn records_from_texts(texts: &[(CrashKind, &str)]) -> Result<Vec<CrashRecord>, SourceError> {
    let defs = registry::all_sources();
    let mut records = Vec::new();

    for (kind, text) in texts {
        let def = defs
            .iter()
            .find(|def| def.kind == *kind)
            .ok_or_else(|| SourceError::Config {
                message: format!("No source registered for {kind} crashes"),
            })?;
        records.extend(records_from_text(def, text)?);
    }

    Ok(records)
}

/// Loads every source concurrently and concatenates the results in
/// definition order.
///
/// Either every source loads or the whole load fails.
///
/// # Errors
///
/// Returns the first [`SourceError`] encountered.
pub async fn load_all(
    defs: &[SourceDefinition],
    data_dir: &Path,
) -> Result<Vec<CrashRecord>, SourceError> {
    let per_source =
        futures::future::try_join_all(defs.iter().map(|def| load_source(def, data_dir))).await?;

    let records: Vec<CrashRecord> = per_source.into_iter().flatten().collect();
    log::info!("Loaded {} crash records from {} sources", records.len(), defs.len());

    Ok(records)
}
