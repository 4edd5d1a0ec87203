#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The accident ingestion pipeline: per-year read/normalize/filter plus
//! cross-year schema reconciliation.
//!
//! Years are processed independently against one immutable boundary set.
//! A missing year is a logged skip, a failed year stays isolated from the
//! rest of the run, and only a boundary-load failure aborts everything,
//! since without boundaries no year can be filtered.

pub mod normalize;
pub mod reconcile;
pub mod year;

use std::ops::RangeInclusive;
use std::path::PathBuf;

use accident_map_models::{CombinedDataset, FilteredYearResult, RunSummary, YearOutcome};
use accident_map_reader::ReaderError;
use accident_map_spatial::{DistrictBoundaries, SpatialError};
use thiserror::Error;

/// Errors that can occur during pipeline processing.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading a source file failed (after the delimiter retry).
    #[error("Read error: {0}")]
    Reader(#[from] ReaderError),

    /// Boundary loading or spatial filtering failed.
    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),

    /// A coordinate field was missing or non-numeric after normalization.
    #[error("Coordinate parse error in column {column}, row {row}: {value:?}")]
    CoordinateParse {
        /// The coordinate column.
        column: String,
        /// Zero-based data row index.
        row: usize,
        /// The raw offending value.
        value: String,
    },

    /// A year or month field was missing, non-numeric, or out of range.
    #[error("Date parse error in column {column}, row {row}: {value:?}")]
    DateParse {
        /// The date column.
        column: String,
        /// Zero-based data row index.
        row: usize,
        /// The raw offending value.
        value: String,
    },
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the yearly `Unfallorte{year}_LinRef.csv` files.
    pub data_dir: PathBuf,
    /// Path to the district boundary `GeoJSON` file.
    pub boundary_file: PathBuf,
    /// First year to process (inclusive).
    pub start_year: i32,
    /// Last year to process (inclusive).
    pub end_year: i32,
}

impl PipelineConfig {
    /// The configured year range.
    #[must_use]
    pub const fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }
}

/// Everything a completed run produces: the per-year results (export
/// consumers need them individually), the reconciled combined dataset,
/// and the per-year outcome summary.
#[derive(Debug)]
pub struct PipelineRun {
    /// Successfully processed years, year-ascending.
    pub results: Vec<FilteredYearResult>,
    /// The reconciled cross-year dataset.
    pub combined: CombinedDataset,
    /// Outcome per configured year.
    pub summary: RunSummary,
}

/// Runs the full pipeline: load boundaries once, process every configured
/// year in isolation, then reconcile into the combined dataset.
///
/// Per-year failures are recorded in the summary and do not abort the
/// remaining years.
///
/// # Errors
///
/// Returns [`PipelineError`] only if the boundary file cannot be loaded,
/// the one failure that makes every year unprocessable.
pub fn run(config: &PipelineConfig) -> Result<PipelineRun, PipelineError> {
    let boundaries = DistrictBoundaries::load(&config.boundary_file)?;

    let mut results: Vec<FilteredYearResult> = Vec::new();
    let mut summary = RunSummary::default();

    for year_number in config.years() {
        match year::process_year(year_number, &config.data_dir, &boundaries) {
            Ok(Some(result)) => {
                summary.outcomes.insert(
                    year_number,
                    YearOutcome::Processed {
                        count: result.count(),
                    },
                );
                results.push(result);
            }
            Ok(None) => {
                summary.outcomes.insert(year_number, YearOutcome::Missing);
            }
            Err(e) => {
                log::error!("Year {year_number} failed: {e}");
                summary.outcomes.insert(
                    year_number,
                    YearOutcome::Failed {
                        reason: e.to_string(),
                    },
                );
            }
        }
    }

    let combined = reconcile::reconcile(results.clone());

    log::info!(
        "Pipeline complete: {} years processed, {} skipped, {} failed, {} records combined",
        summary.processed(),
        summary.skipped(),
        summary.failed(),
        combined.len()
    );

    Ok(PipelineRun {
        results,
        combined,
        summary,
    })
}
