//! Field-level parsing helpers used by the normalizer.
//!
//! Every function here is total: malformed input yields `None` or a
//! pass-through value, never an error.

use crash_map_crash_models::IntersectionDetail;

/// Placeholder factor phrases that carry no information.
const PLACEHOLDER_FACTORS: &[&str] = &["none", "unknown", "no data"];

/// Parses a coordinate pair. Returns `(longitude, latitude)`, or `None` if
/// either value is non-numeric, non-finite, or exactly zero.
#[must_use]
pub fn parse_coordinates(latitude: &str, longitude: &str) -> Option<(f64, f64)> {
    let latitude = latitude.trim().parse::<f64>().ok()?;
    let longitude = longitude.trim().parse::<f64>().ok()?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }

    Some((longitude, latitude))
}

/// Extracts the severity code from text like `"K - FATAL INJURY"`.
///
/// Uses the part before the first `-` when there is one, otherwise the
/// first character. Empty input yields an empty code.
#[must_use]
pub fn extract_severity_code(text: &str) -> &str {
    let text = text.trim();
    if let Some((code, _)) = text.split_once('-') {
        return code.trim();
    }
    text.chars().next().map_or("", |c| &text[..c.len_utf8()])
}

/// Rewrites `MM/DD/YY` as `20YY-MM-DD`. Anything without exactly three
/// slash-separated parts is returned unchanged.
#[must_use]
pub fn reformat_date(date: &str) -> String {
    let date = date.trim();
    if !date.contains('/') {
        return date.to_string();
    }

    let parts: Vec<&str> = date.split('/').map(str::trim).collect();
    let [month, day, year] = parts.as_slice() else {
        return date.to_string();
    };

    format!("20{year}-{month:0>2}-{day:0>2}")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Cleans a semicolon-separated factor list: drops placeholder phrases and
/// title-cases each remaining phrase, joined with `"; "`.
#[must_use]
pub fn clean_factors(raw: &str) -> String {
    raw.to_lowercase()
        .split(';')
        .map(str::trim)
        .filter(|f| !f.is_empty() && !PLACEHOLDER_FACTORS.contains(f))
        .map(|f| {
            f.split(' ')
                .map(capitalize_first)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Extracts the label from a coded field like `"1 - CLEAR"`, returning it
/// lower-cased with the first letter capitalized (`"Clear"`). Values
/// without a `-` pass through unchanged.
#[must_use]
pub fn extract_coded_label(raw: &str) -> String {
    let mut segments = raw.split('-');
    match (segments.next(), segments.next()) {
        (Some(_), Some(label)) => capitalize_first(&label.trim().to_lowercase()),
        _ => raw.to_string(),
    }
}

/// Parses the leading run of ASCII digits (with an optional sign) as an
/// integer, ignoring whatever follows. `"2023 "`, `"07"` and `"12abc"` all
/// parse; `""` and `"abc"` do not.
#[must_use]
pub fn parse_leading_int<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    let sign_len = usize::from(raw.starts_with(['-', '+']));
    let digits_len = raw[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    raw[..sign_len + digits_len].parse().ok()
}

/// Parses a yes/no flag. Only `"true"` and `"yes"` (case-insensitive) are
/// true.
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes")
}

/// Maps the free-text intersection relation to an [`IntersectionDetail`].
///
/// Only values mentioning an intersection are classified. Among those,
/// negated phrases (`"Non Intersection"`, `"Not Intersection Related"`)
/// are not-at-intersection. `"Not Reported"` and the like stay unspecified.
#[must_use]
pub fn parse_intersection_detail(raw: &str) -> IntersectionDetail {
    let value = raw.trim().to_lowercase();
    if !value.contains("intersection") {
        return IntersectionDetail::Unspecified;
    }
    if value.contains("non") || value.contains("not ") {
        return IntersectionDetail::NotAtIntersection;
    }
    IntersectionDetail::AtIntersection
}
