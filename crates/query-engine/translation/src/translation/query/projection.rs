//! Reproject geometries between geographic WGS 84 and spherical (web) mercator.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use query_engine_metadata::metadata::Wkid;

use super::geometry::{Geometry, Position};
use crate::translation::error::Error;

/// Semi-major axis of WGS 84, used as the sphere radius by web mercator.
const EARTH_RADIUS: f64 = 6_378_137.0;
/// Latitudes beyond this limit are projected onto the edge of the square map.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Reproject a geometry. Aliases of a spatial reference are treated as equal.
pub fn reproject(geometry: Geometry, from: Wkid, to: Wkid) -> Result<Geometry, Error> {
    let (from, to) = (from.canonical(), to.canonical());
    match (from, to) {
        _ if from == to => Ok(geometry),
        (Wkid::WGS84, Wkid::WEB_MERCATOR) => Ok(geometry.map_positions(&to_web_mercator)),
        (Wkid::WEB_MERCATOR, Wkid::WGS84) => Ok(geometry.map_positions(&to_wgs84)),
        _ => Err(Error::UnsupportedReprojection { from, to }),
    }
}

fn to_web_mercator([longitude, latitude]: Position) -> Position {
    let latitude = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    [
        EARTH_RADIUS * longitude.to_radians(),
        EARTH_RADIUS * (FRAC_PI_4 + latitude.to_radians() / 2.0).tan().ln(),
    ]
}

fn to_wgs84([x, y]: Position) -> Position {
    [
        (x / EARTH_RADIUS).to_degrees(),
        (2.0 * (y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
    ]
}
