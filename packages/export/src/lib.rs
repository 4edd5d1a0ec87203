#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Export consumers of the pipeline's in-memory results.
//!
//! Writes per-year filtered CSVs, per-year `GeoJSON` point collections,
//! and the combined cross-year CSV with sequential identifiers. The
//! pipeline core only exposes in-memory structures; everything
//! file-format-shaped lives here.

use std::path::{Path, PathBuf};

use accident_map_models::{
    COL_DISTRICT, COL_ID, COL_LATITUDE, COL_LONGITUDE, COL_MONTH, COL_SEASON, COL_YEAR,
    CombinedDataset, FilteredYearResult, TransportMode,
};
use geojson::{Feature, FeatureCollection, GeoJson};

/// City label baked into output file names, matching the dataset's
/// naming convention.
const CITY_LABEL: &str = "Leipzig";

/// Errors that can occur while writing export files.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Paths of everything a full export produced.
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    /// One filtered CSV per processed year.
    pub csv_files: Vec<PathBuf>,
    /// One `GeoJSON` point collection per processed year.
    pub geojson_files: Vec<PathBuf>,
    /// The combined cross-year CSV, absent when no records survived
    /// filtering.
    pub combined_csv: Option<PathBuf>,
}

/// Creates the output directory layout (`csv/` and `geojson/` below the
/// processed directory).
///
/// # Errors
///
/// Returns [`ExportError`] if a directory cannot be created.
pub fn setup_directories(processed_dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(processed_dir.join("csv"))?;
    std::fs::create_dir_all(processed_dir.join("geojson"))?;
    Ok(())
}

/// Exports every per-year result as CSV and `GeoJSON`, plus the combined
/// CSV.
///
/// # Errors
///
/// Returns [`ExportError`] if any file cannot be written.
pub fn export_all(
    results: &[FilteredYearResult],
    combined: &CombinedDataset,
    processed_dir: &Path,
) -> Result<ExportedFiles, ExportError> {
    setup_directories(processed_dir)?;

    let mut csv_files = Vec::with_capacity(results.len());
    let mut geojson_files = Vec::with_capacity(results.len());

    for result in results {
        csv_files.push(export_year_csv(result, processed_dir)?);
        geojson_files.push(export_year_geojson(result, processed_dir)?);
    }

    let combined_csv = export_combined_csv(combined, processed_dir)?;

    log::info!(
        "Exported {} yearly CSVs and {} GeoJSON files",
        csv_files.len(),
        geojson_files.len()
    );

    Ok(ExportedFiles {
        csv_files,
        geojson_files,
        combined_csv,
    })
}

/// Writes one year's filtered records as CSV.
///
/// Column layout: the normalized coordinate pair first, then the year's
/// source columns (sorted), then the derived district and season.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be written.
pub fn export_year_csv(
    result: &FilteredYearResult,
    processed_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = processed_dir
        .join("csv")
        .join(format!("Unfallorte{}_{CITY_LABEL}.csv", result.year));

    let source_columns = source_columns(result);

    let mut writer = csv::Writer::from_path(&path)?;

    let mut header: Vec<&str> = vec![COL_LONGITUDE, COL_LATITUDE];
    header.extend(source_columns.iter().map(String::as_str));
    header.push(COL_DISTRICT);
    header.push(COL_SEASON);
    writer.write_record(&header)?;

    for tagged in &result.records {
        let mut row: Vec<String> = vec![
            tagged.record.longitude.to_string(),
            tagged.record.latitude.to_string(),
        ];
        for column in &source_columns {
            row.push(tagged.record.fields.get(column).cloned().unwrap_or_default());
        }
        row.push(tagged.district.clone());
        row.push(tagged.season.to_string());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(path)
}

/// Writes one year's filtered records as a `GeoJSON` point collection
/// (WGS84), with the source fields plus district and season as feature
/// properties.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be written.
pub fn export_year_geojson(
    result: &FilteredYearResult,
    processed_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = processed_dir
        .join("geojson")
        .join(format!("Unfallorte{}_{CITY_LABEL}.geojson", result.year));

    let features: Vec<Feature> = result
        .records
        .iter()
        .map(|tagged| {
            let geometry = geojson::Geometry::new(geojson::Value::Point(vec![
                tagged.record.longitude,
                tagged.record.latitude,
            ]));

            let mut properties = geojson::JsonObject::new();
            for (key, value) in &tagged.record.fields {
                properties.insert(key.clone(), serde_json::Value::String(value.clone()));
            }
            properties.insert(
                COL_DISTRICT.to_owned(),
                serde_json::Value::String(tagged.district.clone()),
            );
            properties.insert(
                COL_SEASON.to_owned(),
                serde_json::Value::String(tagged.season.to_string()),
            );

            Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    std::fs::write(&path, GeoJson::FeatureCollection(collection).to_string())?;
    Ok(path)
}

/// Writes the combined dataset as one CSV with the sequential identifier
/// as the first column. The year range in the file name comes from the
/// first and last record, so an empty dataset writes no file and returns
/// `None`.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be written.
pub fn export_combined_csv(
    combined: &CombinedDataset,
    processed_dir: &Path,
) -> Result<Option<PathBuf>, ExportError> {
    let (Some(first), Some(last)) = (combined.records.first(), combined.records.last()) else {
        log::warn!("Combined dataset is empty, skipping the combined CSV");
        return Ok(None);
    };
    let path = processed_dir.join("csv").join(format!(
        "Unfallorte_{CITY_LABEL}_{}-{}_GESAMT.csv",
        first.year, last.year
    ));

    let mut writer = csv::Writer::from_path(&path)?;

    let mut header: Vec<&str> = vec![
        COL_ID,
        COL_YEAR,
        COL_MONTH,
        COL_LONGITUDE,
        COL_LATITUDE,
        COL_DISTRICT,
        COL_SEASON,
    ];
    header.extend(TransportMode::all().iter().map(|m| m.column()));
    header.extend(combined.extra_columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    for record in &combined.records {
        let mut row: Vec<String> = vec![
            record.id.to_string(),
            record.year.to_string(),
            record.month.to_string(),
            record.longitude.to_string(),
            record.latitude.to_string(),
            record.district.clone(),
            record.season.to_string(),
        ];
        for mode in TransportMode::all() {
            row.push(record.flags[mode.column()].to_string());
        }
        for column in &combined.extra_columns {
            row.push(record.extra.get(column).cloned().unwrap_or_default());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(Some(path))
}

/// The year's source columns in deterministic (sorted) order, coordinate
/// columns excluded since they lead the layout as normalized floats.
fn source_columns(result: &FilteredYearResult) -> Vec<String> {
    result
        .present_columns
        .iter()
        .filter(|c| c.as_str() != COL_LONGITUDE && c.as_str() != COL_LATITUDE)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use accident_map_models::{AccidentRecord, Season, TaggedRecord};

    fn sample_result() -> FilteredYearResult {
        let mut fields = BTreeMap::new();
        fields.insert("UJAHR".to_owned(), "2020".to_owned());
        fields.insert("UMONAT".to_owned(), "7".to_owned());
        fields.insert("IstPKW".to_owned(), "1".to_owned());

        FilteredYearResult {
            year: 2020,
            records: vec![TaggedRecord {
                record: AccidentRecord {
                    longitude: 12.37,
                    latitude: 51.34,
                    year: 2020,
                    month: 7,
                    fields,
                },
                district: "Mitte".to_owned(),
                season: Season::Summer,
            }],
            present_columns: ["XGCSWGS84", "YGCSWGS84", "UJAHR", "UMONAT", "IstPKW"]
                .iter()
                .map(|c| (*c).to_owned())
                .collect(),
        }
    }

    fn output_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("accident_map_export_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn year_csv_has_coordinates_district_and_season() {
        let dir = output_dir("year_csv");
        setup_directories(&dir).unwrap();

        let path = export_year_csv(&sample_result(), &dir).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("XGCSWGS84,YGCSWGS84"));
        assert!(header.ends_with("Name,Jahreszeit"));

        let row = lines.next().unwrap();
        assert!(row.contains("12.37"));
        assert!(row.contains("Mitte"));
        assert!(row.contains("Sommer"));
    }

    #[test]
    fn year_geojson_parses_back_with_tagged_properties() {
        let dir = output_dir("year_geojson");
        setup_directories(&dir).unwrap();

        let path = export_year_geojson(&sample_result(), &dir).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        let geojson: GeoJson = content.parse().unwrap();
        let GeoJson::FeatureCollection(collection) = geojson else {
            panic!("expected a FeatureCollection");
        };
        assert_eq!(collection.features.len(), 1);

        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["Name"], "Mitte");
        assert_eq!(properties["Jahreszeit"], "Sommer");
        assert_eq!(properties["IstPKW"], "1");
    }

    #[test]
    fn combined_csv_leads_with_sequential_id() {
        let dir = output_dir("combined_csv");
        setup_directories(&dir).unwrap();

        let mut flags: BTreeMap<&'static str, i64> = BTreeMap::new();
        for mode in TransportMode::all() {
            flags.insert(mode.column(), 0);
        }
        let combined = CombinedDataset {
            records: vec![accident_map_models::CombinedRecord {
                id: 1,
                year: 2020,
                month: 7,
                longitude: 12.37,
                latitude: 51.34,
                district: "Mitte".to_owned(),
                season: Season::Summer,
                flags,
                extra: BTreeMap::new(),
            }],
            extra_columns: Vec::new(),
        };

        let path = export_combined_csv(&combined, &dir).unwrap().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();

        assert!(lines.next().unwrap().starts_with("UNFALL_ID,UJAHR,UMONAT"));
        assert!(lines.next().unwrap().starts_with("1,2020,7"));
        assert!(path.to_string_lossy().ends_with("Unfallorte_Leipzig_2020-2020_GESAMT.csv"));
    }

    #[test]
    fn empty_combined_dataset_writes_no_file() {
        let dir = output_dir("combined_empty");
        setup_directories(&dir).unwrap();

        let result = export_combined_csv(&CombinedDataset::default(), &dir).unwrap();
        assert!(result.is_none());
        assert!(std::fs::read_dir(dir.join("csv")).unwrap().next().is_none());
    }
}
