#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations over the combined accident dataset.
//!
//! Everything here operates on an in-memory [`CombinedDataset`]; nothing
//! touches the filesystem. Percentages are per district, so the four
//! season shares of one district sum to 100 (when it has any records).

use std::collections::BTreeMap;

use accident_map_models::{CombinedDataset, Season, TransportMode};

/// Accident counts per year, in ascending year order.
#[must_use]
pub fn accidents_per_year(dataset: &CombinedDataset) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for record in &dataset.records {
        *counts.entry(record.year).or_insert(0) += 1;
    }
    counts
}

/// Seasonal share of one district's accidents, in percent.
///
/// All four seasons are present in calendar order, zero-filled when the
/// district has no accidents in one of them. Returns `None` when the
/// district does not occur in the dataset at all.
#[must_use]
pub fn seasonal_distribution(
    dataset: &CombinedDataset,
    district: &str,
) -> Option<Vec<(Season, f64)>> {
    let mut counts: BTreeMap<Season, usize> = BTreeMap::new();
    let mut total = 0_usize;

    for record in &dataset.records {
        if record.district == district {
            *counts.entry(record.season).or_insert(0) += 1;
            total += 1;
        }
    }

    if total == 0 {
        log::warn!("no records for district {district:?}");
        return None;
    }

    Some(
        Season::all()
            .iter()
            .map(|season| {
                let count = counts.get(season).copied().unwrap_or(0);
                (*season, percentage(count, total))
            })
            .collect(),
    )
}

/// Transport-mode share of one district's accidents within each season,
/// in percent of that season's flag-count total.
///
/// Each emitted season carries every mode, zero-filled, and its shares
/// sum to 100. Seasons where the district has no flag counts at all are
/// omitted. Returns `None` when the district does not occur in the
/// dataset.
#[must_use]
pub fn seasonal_mode_distribution(
    dataset: &CombinedDataset,
    district: &str,
) -> Option<Vec<(Season, TransportMode, f64)>> {
    let mut counts: BTreeMap<(Season, TransportMode), usize> = BTreeMap::new();
    let mut total = 0_usize;

    for record in &dataset.records {
        if record.district != district {
            continue;
        }
        total += 1;
        for mode in TransportMode::all() {
            if record.flags.get(mode.column()).copied().unwrap_or(0) != 0 {
                *counts.entry((record.season, *mode)).or_insert(0) += 1;
            }
        }
    }

    if total == 0 {
        log::warn!("no records for district {district:?}");
        return None;
    }

    let mut rows = Vec::with_capacity(Season::all().len() * TransportMode::all().len());
    for season in Season::all() {
        let season_total: usize = TransportMode::all()
            .iter()
            .map(|mode| counts.get(&(*season, *mode)).copied().unwrap_or(0))
            .sum();
        if season_total == 0 {
            continue;
        }
        for mode in TransportMode::all() {
            let count = counts.get(&(*season, *mode)).copied().unwrap_or(0);
            rows.push((*season, *mode, percentage(count, season_total)));
        }
    }
    Some(rows)
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> f64 {
    count as f64 / total as f64 * 100.0
}
