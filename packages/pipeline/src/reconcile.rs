//! Schema reconciliation and cross-year concatenation.
//!
//! Yearly extracts disagree on their column sets: `IstSonstig` only
//! appears from 2017 on, and portals have renamed auxiliary columns
//! between exports. Reconciliation maps every per-year table onto the
//! canonical schema (transport flags fully populated with a zero default
//! where a table lacked the column, and an empty-string default over the
//! superset of the remaining columns) before concatenating in
//! year-ascending order and assigning sequential identifiers.

use std::collections::{BTreeMap, BTreeSet};

use accident_map_models::{
    COL_DISTRICT, COL_LATITUDE, COL_LONGITUDE, COL_MONTH, COL_SEASON, COL_YEAR, CombinedDataset,
    CombinedRecord, FilteredYearResult, TransportMode,
};

/// Columns that become typed or derived fields of [`CombinedRecord`]
/// rather than pass-through extras.
fn is_typed_column(column: &str) -> bool {
    column == COL_LONGITUDE
        || column == COL_LATITUDE
        || column == COL_YEAR
        || column == COL_MONTH
        || column == COL_DISTRICT
        || column == COL_SEASON
        || TransportMode::all().iter().any(|m| m.column() == column)
}

/// Reconciles per-year results into one uniform [`CombinedDataset`].
///
/// Column presence is decided per source table: a table lacking a flag
/// column gets the zero default on every one of its rows; tables that had
/// the column keep their values. Rows are concatenated year-ascending,
/// original order within each year, and the 1-based `UNFALL_ID` is
/// assigned in final row order.
#[must_use]
pub fn reconcile(mut results: Vec<FilteredYearResult>) -> CombinedDataset {
    results.sort_by_key(|result| result.year);

    let mut extra_columns: BTreeSet<String> = BTreeSet::new();
    for result in &results {
        for column in &result.present_columns {
            if !is_typed_column(column) {
                extra_columns.insert(column.clone());
            }
        }
    }

    let mut records: Vec<CombinedRecord> = Vec::new();
    let mut id: u64 = 0;

    for result in results {
        let present = &result.present_columns;

        for tagged in result.records {
            id += 1;

            let mut flags: BTreeMap<&'static str, i64> = BTreeMap::new();
            for mode in TransportMode::all() {
                let column = mode.column();
                let value = if present.contains(column) {
                    parse_flag(tagged.record.fields.get(column))
                } else {
                    0
                };
                flags.insert(column, value);
            }

            let extra: BTreeMap<String, String> = extra_columns
                .iter()
                .map(|column| {
                    let value = tagged.record.fields.get(column).cloned().unwrap_or_default();
                    (column.clone(), value)
                })
                .collect();

            records.push(CombinedRecord {
                id,
                year: tagged.record.year,
                month: tagged.record.month,
                longitude: tagged.record.longitude,
                latitude: tagged.record.latitude,
                district: tagged.district,
                season: tagged.season,
                flags,
                extra,
            });
        }
    }

    CombinedDataset {
        records,
        extra_columns: extra_columns.into_iter().collect(),
    }
}

/// Parses a 0/1 flag value. Empty and unparseable values coerce to 0, the
/// loader-side counterpart of the table-level default.
fn parse_flag(raw: Option<&String>) -> i64 {
    raw.map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accident_map_models::{AccidentRecord, Season, TaggedRecord};

    fn tagged(year: i32, month: u32, flags: &[(&str, &str)]) -> TaggedRecord {
        let fields: BTreeMap<String, String> = flags
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        TaggedRecord {
            record: AccidentRecord {
                longitude: 12.3,
                latitude: 51.3,
                year,
                month,
                fields,
            },
            district: "Mitte".to_owned(),
            season: Season::from_month(month),
        }
    }

    fn year_result(
        year: i32,
        columns: &[&str],
        records: Vec<TaggedRecord>,
    ) -> FilteredYearResult {
        FilteredYearResult {
            year,
            records,
            present_columns: columns.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    const FULL_COLUMNS: &[&str] = &[
        "XGCSWGS84", "YGCSWGS84", "UJAHR", "UMONAT", "IstPKW", "IstRad", "IstFuss", "IstKrad",
        "IstSonstig",
    ];
    const NO_SONSTIG: &[&str] = &[
        "XGCSWGS84", "YGCSWGS84", "UJAHR", "UMONAT", "IstPKW", "IstRad", "IstFuss", "IstKrad",
    ];

    #[test]
    fn injects_zero_for_missing_flag_column() {
        let results = vec![
            year_result(
                2016,
                NO_SONSTIG,
                vec![tagged(2016, 4, &[("IstPKW", "1"), ("IstRad", "0")])],
            ),
            year_result(
                2017,
                FULL_COLUMNS,
                vec![tagged(2017, 4, &[("IstPKW", "0"), ("IstSonstig", "1")])],
            ),
        ];
        let combined = reconcile(results);

        assert_eq!(combined.records[0].flags["IstSonstig"], 0);
        // Tables that had the column keep their values.
        assert_eq!(combined.records[1].flags["IstSonstig"], 1);
        assert_eq!(combined.records[0].flags["IstPKW"], 1);
    }

    #[test]
    fn ids_are_sequential_year_ascending() {
        // Deliberately out of order to verify the sort.
        let results = vec![
            year_result(
                2018,
                FULL_COLUMNS,
                vec![tagged(2018, 1, &[]), tagged(2018, 2, &[])],
            ),
            year_result(2016, FULL_COLUMNS, vec![tagged(2016, 1, &[])]),
            year_result(2017, FULL_COLUMNS, vec![tagged(2017, 1, &[])]),
        ];
        let combined = reconcile(results);

        let ids: Vec<u64> = combined.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let years: Vec<i32> = combined.records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2016, 2017, 2018, 2018]);
    }

    #[test]
    fn extra_columns_form_a_superset_with_empty_defaults() {
        let mut columns_a = NO_SONSTIG.to_vec();
        columns_a.push("ULICHTVERH");
        let results = vec![
            year_result(
                2016,
                &columns_a,
                vec![tagged(2016, 6, &[("ULICHTVERH", "2")])],
            ),
            year_result(2017, FULL_COLUMNS, vec![tagged(2017, 6, &[])]),
        ];
        let combined = reconcile(results);

        assert_eq!(combined.extra_columns, vec!["ULICHTVERH".to_owned()]);
        assert_eq!(combined.records[0].extra["ULICHTVERH"], "2");
        assert_eq!(combined.records[1].extra["ULICHTVERH"], "");
    }

    #[test]
    fn empty_or_garbage_flag_values_coerce_to_zero() {
        let results = vec![year_result(
            2020,
            FULL_COLUMNS,
            vec![tagged(2020, 3, &[("IstPKW", ""), ("IstRad", "x")])],
        )];
        let combined = reconcile(results);
        assert_eq!(combined.records[0].flags["IstPKW"], 0);
        assert_eq!(combined.records[0].flags["IstRad"], 0);
    }

    #[test]
    fn empty_input_yields_empty_dataset() {
        let combined = reconcile(Vec::new());
        assert!(combined.is_empty());
        assert!(combined.extra_columns.is_empty());
    }
}
