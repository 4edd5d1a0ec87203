#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Delimiter-sniffing reader for the heterogeneous yearly extracts.
//!
//! The yearly files disagree on delimiter (semicolon in most years, comma
//! in some re-exports) and occasionally carry encoding junk, so the reader
//! samples a fixed-size prefix, resolves the delimiter via [`sniff`], and
//! parses the whole file as raw strings. No numeric coercion happens here;
//! locale-formatted values are repaired downstream.

pub mod sniff;

use std::collections::BTreeMap;
use std::io::Read as _;
use std::path::Path;

use accident_map_models::RawTable;

use crate::sniff::{DelimiterResolution, SAMPLE_SIZE, resolve_delimiter};

/// Errors that can occur while reading a source file.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads one raw tabular file of unknown delimiter into a [`RawTable`].
///
/// The delimiter is resolved from a prefix sample. If the full read then
/// fails for any reason the file is re-read once with a hard-coded
/// semicolon delimiter as a last resort.
///
/// An empty file yields an empty table, not an error; a header-only file
/// yields zero data rows. Rows shorter than the header are padded with
/// empty fields, extra trailing fields are dropped.
///
/// # Errors
///
/// Returns [`ReaderError`] if both the resolved-delimiter read and the
/// semicolon retry fail.
pub fn read_table(path: &Path) -> Result<RawTable, ReaderError> {
    match read_with_sniffing(path) {
        Ok(table) => Ok(table),
        Err(e) => {
            log::warn!(
                "Reading {} failed ({e}), retrying with ';' delimiter",
                path.display()
            );
            parse_file(path, b';')
        }
    }
}

fn read_with_sniffing(path: &Path) -> Result<RawTable, ReaderError> {
    let sample = read_sample(path)?;
    let resolution = resolve_delimiter(&sample);

    match resolution {
        DelimiterResolution::Detected(d) => {
            log::debug!("{}: detected delimiter {:?}", path.display(), char::from(d));
        }
        DelimiterResolution::FallbackHeuristic(d) => {
            log::info!(
                "{}: delimiter detection ambiguous, frequency heuristic chose {:?}",
                path.display(),
                char::from(d)
            );
        }
        DelimiterResolution::Default(d) => {
            log::info!(
                "{}: delimiter detection failed, defaulting to {:?}",
                path.display(),
                char::from(d)
            );
        }
    }

    parse_file(path, resolution.delimiter())
}

/// Reads the first [`SAMPLE_SIZE`] bytes of the file, lossily decoded.
fn read_sample(path: &Path) -> Result<String, ReaderError> {
    let file = std::fs::File::open(path)?;
    let mut buf = Vec::with_capacity(SAMPLE_SIZE);
    file.take(SAMPLE_SIZE as u64).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parses the entire file with a fixed delimiter.
///
/// Fields are decoded lossily so stray non-UTF-8 bytes coerce to the
/// replacement character instead of failing the whole file.
fn parse_file(path: &Path, delimiter: u8) -> Result<RawTable, ReaderError> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Ok(RawTable::default());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_owned())
        .collect();

    let mut rows: Vec<BTreeMap<String, String>> = Vec::new();

    for result in reader.byte_records() {
        let record = result?;

        let mut row = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record
                .get(i)
                .map_or_else(String::new, |f| String::from_utf8_lossy(f).trim().to_owned());
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    log::debug!(
        "Parsed {} rows x {} columns from {}",
        rows.len(),
        headers.len(),
        path.display()
    );

    Ok(RawTable { headers, rows })
}
