//! Coordinate and date normalization over raw string rows.
//!
//! Source files use a comma decimal separator for the WGS84 coordinate
//! columns. Normalization substitutes the comma with a period before
//! parsing, and types the year and month columns alongside. A missing or
//! unparseable value in any of these four columns is fatal for the year.

use std::collections::BTreeMap;

use accident_map_models::{
    AccidentRecord, COL_LATITUDE, COL_LONGITUDE, COL_MONTH, COL_YEAR, RawTable,
};

use crate::PipelineError;

/// Repairs one locale-formatted coordinate string into a finite float.
///
/// `"12,345"` parses to `12.345`; already period-formatted values pass
/// through. Returns `None` for non-numeric or non-finite results.
#[must_use]
pub fn normalize_coordinate(raw: &str) -> Option<f64> {
    let parsed = raw.trim().replace(',', ".").parse::<f64>().ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Converts a raw table into normalized [`AccidentRecord`]s.
///
/// The two coordinate columns are replaced by typed floats; `UJAHR` and
/// `UMONAT` are typed as integers with the month validated to 1-12. All
/// other fields are carried through untouched.
///
/// # Errors
///
/// Returns [`PipelineError::CoordinateParse`] or
/// [`PipelineError::DateParse`] naming the offending column, row, and
/// value.
pub fn normalize_table(table: RawTable) -> Result<Vec<AccidentRecord>, PipelineError> {
    let mut records = Vec::with_capacity(table.rows.len());

    for (idx, mut row) in table.rows.into_iter().enumerate() {
        let longitude = coordinate_field(&row, COL_LONGITUDE, idx)?;
        let latitude = coordinate_field(&row, COL_LATITUDE, idx)?;
        let year: i32 = date_field(&row, COL_YEAR, idx)?;
        let month: u32 = date_field(&row, COL_MONTH, idx)?;

        if !(1..=12).contains(&month) {
            return Err(PipelineError::DateParse {
                column: COL_MONTH.to_owned(),
                row: idx,
                value: month.to_string(),
            });
        }

        row.remove(COL_LONGITUDE);
        row.remove(COL_LATITUDE);

        records.push(AccidentRecord {
            longitude,
            latitude,
            year,
            month,
            fields: row,
        });
    }

    Ok(records)
}

fn coordinate_field(
    row: &BTreeMap<String, String>,
    column: &str,
    idx: usize,
) -> Result<f64, PipelineError> {
    let raw = row.get(column).map_or("", String::as_str);
    normalize_coordinate(raw).ok_or_else(|| PipelineError::CoordinateParse {
        column: column.to_owned(),
        row: idx,
        value: raw.to_owned(),
    })
}

fn date_field<T: std::str::FromStr>(
    row: &BTreeMap<String, String>,
    column: &str,
    idx: usize,
) -> Result<T, PipelineError> {
    let raw = row.get(column).map_or("", String::as_str);
    raw.trim().parse().map_err(|_| PipelineError::DateParse {
        column: column.to_owned(),
        row: idx,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_row(pairs: &[(&str, &str)]) -> RawTable {
        let headers: Vec<String> = pairs.iter().map(|(k, _)| (*k).to_owned()).collect();
        let row: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RawTable {
            headers,
            rows: vec![row],
        }
    }

    #[test]
    fn comma_decimal_equals_period_parse() {
        assert_eq!(normalize_coordinate("12,345"), Some(12.345));
        assert_eq!(normalize_coordinate("12.345"), Some(12.345));
        assert_eq!(normalize_coordinate("51,3396"), "51.3396".parse::<f64>().ok());
    }

    #[test]
    fn rejects_non_numeric_and_non_finite() {
        assert_eq!(normalize_coordinate("zwölf"), None);
        assert_eq!(normalize_coordinate(""), None);
        assert_eq!(normalize_coordinate("inf"), None);
        assert_eq!(normalize_coordinate("NaN"), None);
    }

    #[test]
    fn normalizes_a_full_row() {
        let table = table_with_row(&[
            ("XGCSWGS84", "12,37"),
            ("YGCSWGS84", "51,34"),
            ("UJAHR", "2020"),
            ("UMONAT", "7"),
            ("IstPKW", "1"),
        ]);
        let records = normalize_table(table).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!((record.longitude - 12.37).abs() < f64::EPSILON);
        assert!((record.latitude - 51.34).abs() < f64::EPSILON);
        assert_eq!(record.year, 2020);
        assert_eq!(record.month, 7);
        // Coordinate columns are replaced, everything else is untouched.
        assert!(!record.fields.contains_key("XGCSWGS84"));
        assert_eq!(record.fields["IstPKW"], "1");
        assert_eq!(record.fields["UJAHR"], "2020");
    }

    #[test]
    fn missing_coordinate_column_is_fatal() {
        let table = table_with_row(&[("YGCSWGS84", "51,34"), ("UJAHR", "2020"), ("UMONAT", "7")]);
        assert!(matches!(
            normalize_table(table),
            Err(PipelineError::CoordinateParse { column, row: 0, .. }) if column == "XGCSWGS84"
        ));
    }

    #[test]
    fn garbage_coordinate_is_fatal() {
        let table = table_with_row(&[
            ("XGCSWGS84", "abc"),
            ("YGCSWGS84", "51,34"),
            ("UJAHR", "2020"),
            ("UMONAT", "7"),
        ]);
        assert!(matches!(
            normalize_table(table),
            Err(PipelineError::CoordinateParse { .. })
        ));
    }

    #[test]
    fn out_of_range_month_is_fatal() {
        let table = table_with_row(&[
            ("XGCSWGS84", "12,37"),
            ("YGCSWGS84", "51,34"),
            ("UJAHR", "2020"),
            ("UMONAT", "13"),
        ]);
        assert!(matches!(
            normalize_table(table),
            Err(PipelineError::DateParse { column, .. }) if column == "UMONAT"
        ));
    }
}
