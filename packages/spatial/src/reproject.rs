//! Coordinate reprojection from WGS84 into the boundary file's CRS.
//!
//! Built on `proj4rs` (a pure-Rust PROJ port). Record coordinates are
//! always WGS84 lon/lat; boundary files from municipal open-data portals
//! are usually projected (Leipzig ships its districts in ETRS89 / UTM33N,
//! EPSG:25833), so the filter transforms the point collection once into
//! the boundary CRS before containment testing.

use proj4rs::proj::Proj;

use crate::SpatialError;

/// EPSG code of the geographic CRS all record coordinates use.
pub const WGS84_EPSG: u32 = 4326;

const WGS84_PROJ_STRING: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Returns a proj-string definition for the EPSG codes boundary files are
/// expected to use: geographic WGS84, web mercator, and the ETRS89/WGS84
/// UTM zone ranges.
fn proj_string_for_epsg(epsg: u32) -> Option<String> {
    match epsg {
        WGS84_EPSG => Some(WGS84_PROJ_STRING.to_owned()),
        3857 => Some(
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
             +units=m +nadgrids=@null +no_defs"
                .to_owned(),
        ),
        // ETRS89 / UTM zones 28N-38N (Leipzig's districts use 25833)
        25828..=25838 => Some(format!(
            "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
            epsg - 25800
        )),
        // WGS84 / UTM north zones
        32601..=32660 => Some(format!(
            "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
            epsg - 32600
        )),
        // WGS84 / UTM south zones
        32701..=32760 => Some(format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            epsg - 32700
        )),
        _ => None,
    }
}

/// A one-time-constructed transform from WGS84 lon/lat into a target CRS.
///
/// `None` projection means the target is already WGS84 and coordinates
/// pass through unchanged.
pub struct Reprojector {
    projection: Option<(Proj, Proj)>,
}

impl Reprojector {
    /// Builds a reprojector targeting the given EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedCrs`] for EPSG codes without a
    /// known definition, or [`SpatialError::Projection`] if `proj4rs`
    /// rejects a definition.
    pub fn to_epsg(epsg: u32) -> Result<Self, SpatialError> {
        if epsg == WGS84_EPSG {
            return Ok(Self { projection: None });
        }

        let target = proj_string_for_epsg(epsg).ok_or(SpatialError::UnsupportedCrs(epsg))?;

        let from = Proj::from_proj_string(WGS84_PROJ_STRING)
            .map_err(|e| SpatialError::Projection(e.to_string()))?;
        let to = Proj::from_proj_string(&target)
            .map_err(|e| SpatialError::Projection(e.to_string()))?;

        Ok(Self {
            projection: Some((from, to)),
        })
    }

    /// Transforms one WGS84 lon/lat pair into the target CRS.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Projection`] if the transform fails (e.g.
    /// coordinates outside the projection's domain).
    pub fn project(&self, longitude: f64, latitude: f64) -> Result<(f64, f64), SpatialError> {
        let Some((from, to)) = &self.projection else {
            return Ok((longitude, latitude));
        };

        // proj4rs expects angular coordinates in radians.
        let mut point = (longitude.to_radians(), latitude.to_radians(), 0.0);
        proj4rs::transform::transform(from, to, &mut point)
            .map_err(|e| SpatialError::Projection(e.to_string()))?;

        Ok((point.0, point.1))
    }
}
