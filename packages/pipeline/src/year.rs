//! Per-year processing: read, normalize, and spatially filter one year's
//! source file.

use std::path::Path;

use accident_map_models::FilteredYearResult;
use accident_map_spatial::DistrictBoundaries;

use crate::PipelineError;
use crate::normalize::normalize_table;

/// File name of a year's source extract, per the dataset's naming
/// convention.
#[must_use]
pub fn source_file_name(year: i32) -> String {
    format!("Unfallorte{year}_LinRef.csv")
}

/// Processes a single year: sniff-read the CSV, normalize coordinates and
/// dates, and filter against the shared district boundaries.
///
/// Returns `Ok(None)` when the year's source file does not exist: some
/// years are simply absent from a dataset extract, so this is a logged
/// skip, not an error. Every other failure is fatal for this year only;
/// the caller isolates it from the remaining years.
///
/// # Errors
///
/// Returns [`PipelineError`] if reading, normalization, or filtering
/// fails.
pub fn process_year(
    year: i32,
    data_dir: &Path,
    boundaries: &DistrictBoundaries,
) -> Result<Option<FilteredYearResult>, PipelineError> {
    let path = data_dir.join(source_file_name(year));

    if !path.exists() {
        log::warn!("Year {year}: source file {} not found, skipping", path.display());
        return Ok(None);
    }

    let table = accident_map_reader::read_table(&path)?;
    let present_columns = table.present_columns();
    let total = table.len();

    let records = normalize_table(table)?;
    let tagged = boundaries.filter_records(records)?;

    log::info!(
        "Year {year}: {} of {total} accidents inside district boundaries",
        tagged.len()
    );

    Ok(Some(FilteredYearResult {
        year,
        records: tagged,
        present_columns,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_year_keyed_convention() {
        assert_eq!(source_file_name(2019), "Unfallorte2019_LinRef.csv");
    }
}
