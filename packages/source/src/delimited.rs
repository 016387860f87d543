//! Delimited-text reader.
//!
//! Parses a CSV extract into [`RawRow`]s keyed by the header row. Quoted
//! fields may embed the delimiter. Extracts that open with a report
//! preamble are handled by scanning for the header row first.

use std::collections::BTreeMap;

/// One data row keyed by trimmed column header.
pub type RawRow = BTreeMap<String, String>;

/// Finds the byte offset of the first line whose first field, after quote
/// removal, equals `token`.
fn find_header_offset(text: &str, token: &str, delimiter: u8) -> Option<usize> {
    let delimiter = char::from(delimiter);
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let first = line
            .trim()
            .split(delimiter)
            .next()
            .unwrap_or("")
            .trim()
            .trim_matches('"')
            .trim();
        if first == token {
            return Some(offset);
        }
        offset += line.len();
    }

    None
}

/// Parses delimited text into rows.
///
/// When `header_token` is set, leading lines are skipped until the header
/// row is found. A missing header row is not an error: it is logged and
/// yields no rows. Rows that fail to decode and rows with only empty fields
/// are dropped.
///
/// # Errors
///
/// Returns [`csv::Error`] if the header row itself cannot be read.
pub fn parse_rows(
    text: &str,
    delimiter: u8,
    header_token: Option<&str>,
) -> Result<Vec<RawRow>, csv::Error> {
    let text = text.trim_start_matches('\u{feff}');
    let body = match header_token {
        Some(token) => {
            let Some(offset) = find_header_offset(text, token, delimiter) else {
                log::warn!("Header row starting with \"{token}\" not found; treating source as empty");
                return Ok(Vec::new());
            };
            if offset > 0 {
                log::debug!("Skipped {offset} bytes of preamble before header row");
            }
            &text[offset..]
        }
        None => text,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_owned())
        .collect();

    let mut rows = Vec::new();
    let mut dropped = 0_usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Dropping undecodable row: {e}");
                dropped += 1;
                continue;
            }
        };

        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_owned()))
            .collect();
        rows.push(row);
    }

    if dropped > 0 {
        log::debug!("Dropped {dropped} undecodable rows");
    }

    Ok(rows)
}
