#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index over the city's district boundaries.
//!
//! Loads named district polygons from a `GeoJSON` file once per pipeline
//! run, builds an R-tree index, and filters accident points by strict
//! interior containment. Points are reprojected into the boundary file's
//! CRS (read from its `crs` member) before the containment join.

pub mod reproject;

use std::path::Path;

use accident_map_models::{AccidentRecord, COL_DISTRICT, Season, TaggedRecord};
use geo::{Area, BooleanOps, BoundingRect, Contains, Intersects, MultiPolygon, Rect};
use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

use crate::reproject::{Reprojector, WGS84_EPSG};

/// Errors that can occur while loading boundaries or filtering points.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Reading the boundary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The boundary file is not parseable `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The boundary CRS has no known projection definition.
    #[error("Unsupported boundary CRS: EPSG:{0}")]
    UnsupportedCrs(u32),

    /// A coordinate transform failed.
    #[error("Projection error: {0}")]
    Projection(String),

    /// The boundary file parsed but its content is unusable.
    #[error("Invalid boundary data: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },

    /// Two district polygons overlap. Containment attribution would be
    /// ambiguous, so this is rejected at load time.
    #[error("Boundary polygons '{a}' and '{b}' overlap")]
    Overlapping {
        /// First overlapping district.
        a: String,
        /// Second overlapping district.
        b: String,
    },
}

/// A district polygon stored in the R-tree with its name.
struct BoundaryEntry {
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// The fixed set of district boundaries for a pipeline run.
///
/// Loaded once, never mutated; every per-year filter call borrows it.
pub struct DistrictBoundaries {
    index: RTree<BoundaryEntry>,
    epsg: u32,
}

impl DistrictBoundaries {
    /// Loads district polygons from a `GeoJSON` `FeatureCollection` and
    /// builds the R-tree index.
    ///
    /// The CRS is taken from the file's `crs` member (municipal portals
    /// still emit it); an absent member means WGS84, an unrecognized one
    /// fails the load rather than guessing a datum. District
    /// polygons are asserted pairwise non-overlapping so containment
    /// assigns each point to at most one district.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read or parsed, a
    /// feature lacks a usable geometry or `Name` property, the CRS is
    /// unsupported, or two polygons overlap.
    pub fn load(path: &Path) -> Result<Self, SpatialError> {
        let content = std::fs::read_to_string(path)?;
        let geojson: GeoJson = content.parse()?;

        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(SpatialError::Invalid {
                message: format!("{} is not a FeatureCollection", path.display()),
            });
        };

        let epsg = epsg_from_crs(collection.foreign_members.as_ref())?;

        let mut entries: Vec<(BoundaryEntry, Rect<f64>)> = Vec::new();

        for feature in collection.features {
            let name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(COL_DISTRICT))
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| SpatialError::Invalid {
                    message: format!("boundary feature without a '{COL_DISTRICT}' property"),
                })?
                .to_owned();

            let geometry = feature.geometry.ok_or_else(|| SpatialError::Invalid {
                message: format!("district '{name}' has no geometry"),
            })?;

            let geo_geometry = geo::Geometry::<f64>::try_from(geometry)?;
            let polygon = match geo_geometry {
                geo::Geometry::MultiPolygon(mp) => mp,
                geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
                other => {
                    return Err(SpatialError::Invalid {
                        message: format!(
                            "district '{name}' is not a polygon (got {other:?})"
                        ),
                    });
                }
            };

            let rect = polygon.bounding_rect().ok_or_else(|| SpatialError::Invalid {
                message: format!("district '{name}' has an empty geometry"),
            })?;

            entries.push((
                BoundaryEntry {
                    name,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    polygon,
                },
                rect,
            ));
        }

        assert_non_overlapping(&entries)?;

        log::info!(
            "Loaded {} district boundaries from {} (EPSG:{epsg})",
            entries.len(),
            path.display()
        );

        Ok(Self {
            index: RTree::bulk_load(entries.into_iter().map(|(entry, _)| entry).collect()),
            epsg,
        })
    }

    /// EPSG code of the CRS the boundary polygons are expressed in.
    #[must_use]
    pub const fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Number of districts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.size()
    }

    /// `true` if the boundary file contained no districts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.size() == 0
    }

    /// All district names, sorted.
    #[must_use]
    pub fn district_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Looks up the district strictly containing a point given in the
    /// boundary CRS.
    ///
    /// The predicate is strict interior containment: a point exactly on a
    /// district border is in no district. Non-overlapping polygons make
    /// the first match the only match.
    #[must_use]
    pub fn locate(&self, x: f64, y: f64) -> Option<&str> {
        let point = geo::Point::new(x, y);
        let query_env = AABB::from_point([x, y]);

        for entry in self.index.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.contains(&point) {
                return Some(&entry.name);
            }
        }
        None
    }

    /// Filters records to those strictly inside a district, tagging each
    /// retained record with its district name and derived season.
    ///
    /// The WGS84 -> boundary-CRS transform is constructed once for the
    /// whole collection. Points outside every district are silently
    /// dropped; they are accidents outside city limits, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the reprojection cannot be constructed
    /// or a coordinate transform fails.
    pub fn filter_records(
        &self,
        records: Vec<AccidentRecord>,
    ) -> Result<Vec<TaggedRecord>, SpatialError> {
        let reprojector = Reprojector::to_epsg(self.epsg)?;
        let total = records.len();

        let mut tagged: Vec<TaggedRecord> = Vec::new();

        for record in records {
            let (x, y) = reprojector.project(record.longitude, record.latitude)?;
            if let Some(district) = self.locate(x, y) {
                tagged.push(TaggedRecord {
                    district: district.to_owned(),
                    season: Season::from_month(record.month),
                    record,
                });
            }
        }

        log::debug!(
            "Boundary filter retained {}/{total} points",
            tagged.len()
        );

        Ok(tagged)
    }
}

/// Rejects boundary sets whose polygons overlap with positive interior
/// area. Shared edges between adjacent districts are fine (zero area).
fn assert_non_overlapping(entries: &[(BoundaryEntry, Rect<f64>)]) -> Result<(), SpatialError> {
    for (i, (a, rect_a)) in entries.iter().enumerate() {
        for (b, rect_b) in entries.iter().skip(i + 1) {
            if !rect_a.intersects(rect_b) {
                continue;
            }
            let intersection = a.polygon.intersection(&b.polygon);
            if intersection.unsigned_area() > 0.0 {
                return Err(SpatialError::Overlapping {
                    a: a.name.clone(),
                    b: b.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Extracts the EPSG code from a `GeoJSON` `crs` member
/// (`urn:ogc:def:crs:EPSG::25833` style). An absent member means WGS84,
/// which RFC 7946 mandates anyway. A present but unrecognized name is a
/// load error: guessing WGS84 for projected boundaries would make the
/// containment join silently drop every point.
fn epsg_from_crs(foreign_members: Option<&geojson::JsonObject>) -> Result<u32, SpatialError> {
    let Some(name) = foreign_members
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(serde_json::Value::as_str)
    else {
        return Ok(WGS84_EPSG);
    };

    if name.contains("CRS84") {
        return Ok(WGS84_EPSG);
    }

    name.rsplit(':')
        .next()
        .and_then(|code| code.parse::<u32>().ok())
        .ok_or_else(|| SpatialError::Invalid {
            message: format!("unrecognized boundary CRS '{name}'"),
        })
}
