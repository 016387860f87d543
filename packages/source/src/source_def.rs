//! Config-driven crash source definition.
//!
//! [`SourceDefinition`] captures everything unique about one crash extract
//! in a serializable config struct: which road user it covers, where the
//! delimited text lives, whether a report preamble must be skipped, and
//! which columns hold each canonical field.

use std::path::{Path, PathBuf};

use crash_map_crash_models::CrashKind;
use serde::Deserialize;

use crate::SourceError;

/// A complete, config-driven crash source definition.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"harris_pedestrian"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Road user every record from this source is tagged with.
    pub kind: CrashKind,
    /// First-field value of the real header row. When set, every line
    /// before that row is skipped.
    #[serde(default)]
    pub header_token: Option<String>,
    /// Field delimiter (default: comma).
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Where the raw text lives.
    pub location: SourceLocation,
    /// Column name mappings for normalization.
    #[serde(default)]
    pub fields: FieldMapping,
}

impl SourceDefinition {
    /// Returns the source identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delimiter byte, falling back to `,` when unset or empty.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
            .unwrap_or(b',')
    }

    /// Human-readable description of the location, for log messages.
    #[must_use]
    pub fn describe_location(&self, data_dir: &Path) -> String {
        match &self.location {
            SourceLocation::File { path } => data_dir.join(path).display().to_string(),
            SourceLocation::Url { url } => url.clone(),
        }
    }
}

/// Where a source's raw text is read from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceLocation {
    /// A local file, relative to the data directory unless absolute.
    File {
        /// File path.
        path: PathBuf,
    },
    /// A remote file fetched over HTTP(S).
    Url {
        /// Download URL.
        url: String,
    },
}

/// Column names for each canonical field.
///
/// Defaults match the TxDOT CRIS export column names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Crash identifier column.
    pub id: String,
    /// Latitude column.
    pub latitude: String,
    /// Longitude column.
    pub longitude: String,
    /// Free-text severity column (e.g. `"K - FATAL INJURY"`).
    pub severity: String,
    /// Crash date column.
    pub date: String,
    /// Crash year column.
    pub year: String,
    /// Crash month column.
    pub month: String,
    /// Crash time column.
    pub time: String,
    /// City column.
    pub location: String,
    /// Semicolon-separated contributing factors column.
    pub factors: String,
    /// At-intersection flag column.
    pub at_intersection: String,
    /// Intersection relation column.
    pub intersection_related: String,
    /// Street name column.
    pub street_name: String,
    /// Coded weather column (e.g. `"1 - CLEAR"`).
    pub weather: String,
    /// Coded light condition column.
    pub light_condition: String,
    /// Dedicated speed-limit column. Unset for CRIS extracts, which only
    /// carry the limit as a trailing token of the street name.
    pub speed_limit: Option<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            id: "Crash ID".to_string(),
            latitude: "Latitude".to_string(),
            longitude: "Longitude".to_string(),
            severity: "Crash Severity".to_string(),
            date: "Crash Date".to_string(),
            year: "Crash Year".to_string(),
            month: "Crash Month".to_string(),
            time: "Crash Time".to_string(),
            location: "City".to_string(),
            factors: "Contributing Factors".to_string(),
            at_intersection: "At Intersection Flag".to_string(),
            intersection_related: "Intersection Related".to_string(),
            street_name: "Street Name".to_string(),
            weather: "Weather Condition".to_string(),
            light_condition: "Light Condition".to_string(),
            speed_limit: None,
        }
    }
}

/// Parses a [`SourceDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or missing
/// required fields.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, SourceError> {
    toml::de::from_str(toml_str).map_err(|e| SourceError::Config {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_definition_with_default_fields() {
        let def = parse_source_toml(
            r#"
            id = "test"
            name = "Test"
            kind = "cyclist"

            [location]
            type = "file"
            path = "cyclist.csv"
            "#,
        )
        .unwrap();

        assert_eq!(def.kind, CrashKind::Cyclist);
        assert_eq!(def.header_token, None);
        assert_eq!(def.delimiter_byte(), b',');
        assert_eq!(def.fields, FieldMapping::default());
        assert_eq!(
            def.location,
            SourceLocation::File {
                path: PathBuf::from("cyclist.csv")
            }
        );
    }

    #[test]
    fn parses_url_location_and_field_overrides() {
        let def = parse_source_toml(
            r#"
            id = "remote"
            name = "Remote"
            kind = "pedestrian"
            header_token = "Crash ID"
            delimiter = "|"

            [location]
            type = "url"
            url = "https://example.com/pedestrian.csv"

            [fields]
            street_name = "Street"
            speed_limit = "Speed Limit"
            "#,
        )
        .unwrap();

        assert_eq!(def.header_token.as_deref(), Some("Crash ID"));
        assert_eq!(def.delimiter_byte(), b'|');
        assert_eq!(def.fields.street_name, "Street");
        assert_eq!(def.fields.speed_limit.as_deref(), Some("Speed Limit"));
        assert_eq!(def.fields.id, "Crash ID");
        assert_eq!(
            def.describe_location(Path::new("data")),
            "https://example.com/pedestrian.csv"
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        let result = parse_source_toml(
            r#"
            id = "bad"
            name = "Bad"
            kind = "motorist"

            [location]
            type = "file"
            path = "x.csv"
            "#,
        );
        assert!(matches!(result, Err(SourceError::Config { .. })));
    }
}
