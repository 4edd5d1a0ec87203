#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical accident record schema and shared pipeline types.
//!
//! This crate defines the column vocabulary of the Unfallatlas yearly
//! extracts, the normalized record types produced by the ingestion
//! pipeline, and the per-year / combined result containers every other
//! crate consumes. Column names are the dataset's own (German) names so
//! exports stay byte-compatible with the source schema.

use std::collections::{BTreeMap, BTreeSet};

use strum_macros::Display;

/// Longitude column (WGS84, comma decimal separator in source files).
pub const COL_LONGITUDE: &str = "XGCSWGS84";

/// Latitude column (WGS84, comma decimal separator in source files).
pub const COL_LATITUDE: &str = "YGCSWGS84";

/// Accident year column.
pub const COL_YEAR: &str = "UJAHR";

/// Accident month column (1-12).
pub const COL_MONTH: &str = "UMONAT";

/// District name property in the boundary file, carried into tagged rows.
pub const COL_DISTRICT: &str = "Name";

/// Derived season column added to exports.
pub const COL_SEASON: &str = "Jahreszeit";

/// Synthetic sequential identifier column of the combined dataset.
pub const COL_ID: &str = "UNFALL_ID";

/// Transport-involvement flag columns of the canonical schema.
///
/// Each is a 0/1 integer in the source data. Not every yearly extract
/// carries every column (`IstSonstig` appears only in later years), so
/// reconciliation injects a zero default per table where absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum TransportMode {
    /// Passenger car involvement (`IstPKW`).
    #[strum(serialize = "PKW")]
    Car,
    /// Bicycle involvement (`IstRad`).
    #[strum(serialize = "Rad")]
    Bicycle,
    /// Pedestrian involvement (`IstFuss`).
    #[strum(serialize = "Fußgänger")]
    Pedestrian,
    /// Motorcycle involvement (`IstKrad`).
    #[strum(serialize = "Kraftrad")]
    Motorcycle,
    /// Any other vehicle type (`IstSonstig`).
    #[strum(serialize = "Sonstige")]
    Other,
}

impl TransportMode {
    /// Returns the source column name for this flag.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Car => "IstPKW",
            Self::Bicycle => "IstRad",
            Self::Pedestrian => "IstFuss",
            Self::Motorcycle => "IstKrad",
            Self::Other => "IstSonstig",
        }
    }

    /// Returns all variants in canonical column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Car,
            Self::Bicycle,
            Self::Pedestrian,
            Self::Motorcycle,
            Self::Other,
        ]
    }
}

/// Meteorological season, derived from the accident month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Season {
    /// March through May.
    #[strum(serialize = "Frühling")]
    Spring,
    /// June through August.
    #[strum(serialize = "Sommer")]
    Summer,
    /// September through November.
    #[strum(serialize = "Herbst")]
    Autumn,
    /// December through February.
    #[strum(serialize = "Winter")]
    Winter,
}

impl Season {
    /// Maps a month (1-12) to its season. December, January, and February
    /// are winter.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Autumn,
            _ => Self::Winter,
        }
    }

    /// Returns all variants in calendar order, spring first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Spring, Self::Summer, Self::Autumn, Self::Winter]
    }
}

/// A raw tabular file as read from disk: string fields only, no type
/// coercion. Column presence is a property of the table (its header row),
/// not of individual rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names from the header row, in file order.
    pub headers: Vec<String>,
    /// One map per data row, keyed by column name. Rows shorter than the
    /// header are padded with empty strings by the reader.
    pub rows: Vec<BTreeMap<String, String>>,
}

impl RawTable {
    /// Number of data rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` if the table has no data rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The set of columns present in this table's source schema.
    #[must_use]
    pub fn present_columns(&self) -> BTreeSet<String> {
        self.headers.iter().cloned().collect()
    }
}

/// A normalized accident record: validated coordinates and date fields,
/// plus every other source field untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AccidentRecord {
    /// Longitude in WGS84 decimal degrees. Finite by construction.
    pub longitude: f64,
    /// Latitude in WGS84 decimal degrees. Finite by construction.
    pub latitude: f64,
    /// Accident year from `UJAHR`.
    pub year: i32,
    /// Accident month from `UMONAT`, validated to 1-12.
    pub month: u32,
    /// All remaining source fields as raw strings (transport flags
    /// included). The two coordinate columns are excluded since they were
    /// replaced by the typed values above.
    pub fields: BTreeMap<String, String>,
}

/// An accident record retained by the boundary filter, enriched with its
/// containing district and derived season.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    /// The normalized source record.
    pub record: AccidentRecord,
    /// Name of the district whose boundary strictly contains the point.
    pub district: String,
    /// Season derived from the accident month.
    pub season: Season,
}

/// The output of processing one year: retained records plus the source
/// table's column set, needed later for schema reconciliation. Immutable
/// once produced.
#[derive(Debug, Clone)]
pub struct FilteredYearResult {
    /// The source year.
    pub year: i32,
    /// Records inside city limits, in original file order.
    pub records: Vec<TaggedRecord>,
    /// Columns present in this year's source schema.
    pub present_columns: BTreeSet<String>,
}

impl FilteredYearResult {
    /// Number of retained records.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.records.len()
    }
}

/// One fully reconciled row of the combined dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    /// Sequential 1-based identifier, assigned in final row order.
    pub id: u64,
    /// Accident year.
    pub year: i32,
    /// Accident month (1-12).
    pub month: u32,
    /// Longitude in WGS84 decimal degrees.
    pub longitude: f64,
    /// Latitude in WGS84 decimal degrees.
    pub latitude: f64,
    /// Containing district name.
    pub district: String,
    /// Derived season.
    pub season: Season,
    /// Canonical transport flags, fully populated (zero where the source
    /// table lacked the column).
    pub flags: BTreeMap<&'static str, i64>,
    /// Remaining source fields over the cross-year column superset, with
    /// empty strings where a year's schema lacked a column.
    pub extra: BTreeMap<String, String>,
}

/// The cross-year concatenation with a uniform column set. Created once
/// after all years are processed; read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct CombinedDataset {
    /// Rows in year-ascending, within-year original order.
    pub records: Vec<CombinedRecord>,
    /// Superset of non-flag, non-derived source columns, sorted.
    pub extra_columns: Vec<String>,
}

impl CombinedDataset {
    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if no rows were retained across all years.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome of processing one year, reported in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearOutcome {
    /// The year's file was found and filtered successfully.
    Processed {
        /// Number of records retained inside city limits.
        count: usize,
    },
    /// The year's source file does not exist; the year was skipped.
    Missing,
    /// Reading, normalizing, or filtering the year failed.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Per-year outcomes for a whole pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Outcome per configured year, in year order.
    pub outcomes: BTreeMap<i32, YearOutcome>,
}

impl RunSummary {
    /// Number of successfully processed years.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, YearOutcome::Processed { .. }))
            .count()
    }

    /// Number of skipped years (missing source file).
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, YearOutcome::Missing))
            .count()
    }

    /// Number of failed years.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, YearOutcome::Failed { .. }))
            .count()
    }

    /// Total records retained across all processed years.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.outcomes
            .values()
            .map(|o| match o {
                YearOutcome::Processed { count } => *count,
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_mapping_matches_calendar() {
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Autumn);
        assert_eq!(Season::from_month(11), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
    }

    #[test]
    fn season_labels_are_german() {
        assert_eq!(Season::Spring.to_string(), "Frühling");
        assert_eq!(Season::Winter.to_string(), "Winter");
    }

    #[test]
    fn transport_mode_columns_are_canonical() {
        let columns: Vec<&str> = TransportMode::all()
            .iter()
            .map(|m| m.column())
            .collect();
        assert_eq!(
            columns,
            vec!["IstPKW", "IstRad", "IstFuss", "IstKrad", "IstSonstig"]
        );
    }

    #[test]
    fn present_columns_reflect_headers() {
        let table = RawTable {
            headers: vec!["UJAHR".to_owned(), "IstPKW".to_owned()],
            rows: Vec::new(),
        };
        let present = table.present_columns();
        assert!(present.contains("UJAHR"));
        assert!(present.contains("IstPKW"));
        assert!(!present.contains("IstSonstig"));
    }

    #[test]
    fn summary_counts_by_outcome() {
        let mut summary = RunSummary::default();
        summary
            .outcomes
            .insert(2016, YearOutcome::Processed { count: 10 });
        summary
            .outcomes
            .insert(2017, YearOutcome::Processed { count: 5 });
        summary.outcomes.insert(2018, YearOutcome::Missing);
        summary.outcomes.insert(
            2019,
            YearOutcome::Failed {
                reason: "bad coordinates".to_owned(),
            },
        );

        assert_eq!(summary.processed(), 2);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total_records(), 15);
    }
}
