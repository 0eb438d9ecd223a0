//! A small geometry model, and parsers for the encodings geoservice clients send.
//!
//! Accepted encodings:
//! - `x,y` and `xmin,ymin,xmax,ymax` shorthands,
//! - Esri JSON points, envelopes, multipoints, polylines and polygons,
//! - GeoJSON geometry objects.

use query_engine_metadata::metadata::{SpatialReference, Wkid};
use serde_json::{json, Map, Value};

use super::params::GeometryInput;
use crate::translation::error::Error;

/// An `[x, y]` coordinate pair. Any further ordinates are dropped.
pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    /// The first ring is the exterior, the rest are holes.
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// The closed, counter-clockwise rectangle spanning the given bounds.
    pub fn envelope_polygon(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            [xmin, ymin],
            [xmax, ymin],
            [xmax, ymax],
            [xmin, ymax],
            [xmin, ymin],
        ]])
    }

    /// `[xmin, ymin, xmax, ymax]`, or `None` for a geometry without positions.
    pub fn bounds(&self) -> Option<[f64; 4]> {
        let mut bounds: Option<[f64; 4]> = None;
        self.for_each_position(&mut |[x, y]| {
            bounds = Some(match bounds {
                None => [x, y, x, y],
                Some([xmin, ymin, xmax, ymax]) => [xmin.min(x), ymin.min(y), xmax.max(x), ymax.max(y)],
            });
        });
        bounds
    }

    /// The bounding rectangle of this geometry.
    pub fn envelope(&self) -> Result<Geometry, Error> {
        let [xmin, ymin, xmax, ymax] = self.bounds().ok_or_else(|| {
            Error::MalformedGeometry("an empty geometry has no envelope".to_string())
        })?;
        Ok(Geometry::envelope_polygon(xmin, ymin, xmax, ymax))
    }

    fn for_each_position(&self, f: &mut impl FnMut(Position)) {
        match self {
            Geometry::Point(position) => f(*position),
            Geometry::MultiPoint(positions) | Geometry::LineString(positions) => {
                positions.iter().copied().for_each(f);
            }
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().copied().for_each(f);
            }
            Geometry::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().copied().for_each(f);
            }
        }
    }

    /// Apply a coordinate transformation to every position.
    pub fn map_positions(self, f: &impl Fn(Position) -> Position) -> Geometry {
        let line = |positions: Vec<Position>| positions.into_iter().map(f).collect::<Vec<_>>();
        let lines = |lines: Vec<Vec<Position>>| lines.into_iter().map(line).collect::<Vec<_>>();
        match self {
            Geometry::Point(position) => Geometry::Point(f(position)),
            Geometry::MultiPoint(positions) => Geometry::MultiPoint(line(positions)),
            Geometry::LineString(positions) => Geometry::LineString(line(positions)),
            Geometry::MultiLineString(paths) => Geometry::MultiLineString(lines(paths)),
            Geometry::Polygon(rings) => Geometry::Polygon(lines(rings)),
            Geometry::MultiPolygon(polygons) => {
                Geometry::MultiPolygon(polygons.into_iter().map(lines).collect())
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// The GeoJSON representation of this geometry.
    pub fn to_geojson(&self) -> Value {
        let coordinates = match self {
            Geometry::Point(position) => json!(position),
            Geometry::MultiPoint(positions) | Geometry::LineString(positions) => json!(positions),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => json!(lines),
            Geometry::MultiPolygon(polygons) => json!(polygons),
        };
        json!({
            "type": self.type_name(),
            "coordinates": coordinates,
        })
    }
}

/// Parse a geometry parameter. Returns the geometry and the spatial
/// reference embedded in it, if any.
pub fn parse_geometry(input: &GeometryInput) -> Result<(Geometry, Option<Wkid>), Error> {
    let text = input.geometry.trim();
    if !text.starts_with('{') {
        let geometry = parse_shorthand(text, input.geometry_type.as_deref())?;
        return Ok((geometry, None));
    }

    let value: Value = serde_json::from_str(text).map_err(|err| malformed(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object"))?;

    let spatial_reference = match object.get("spatialReference") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let spatial_reference: SpatialReference = serde_json::from_value(value.clone())
                .map_err(|err| malformed(format!("invalid spatialReference: {err}")))?;
            Some(spatial_reference.effective())
        }
    };

    let geometry = match object.get("type").and_then(Value::as_str) {
        Some(kind) => parse_geojson(kind, object.get("coordinates"))?,
        None => parse_esri(object)?,
    };
    Ok((geometry, spatial_reference))
}

fn parse_shorthand(text: &str, geometry_type: Option<&str>) -> Result<Geometry, Error> {
    let numbers = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| malformed(format!("'{part}' is not a coordinate")))
        })
        .collect::<Result<Vec<f64>, Error>>()?;

    let geometry_type = geometry_type.map(|t| t.trim().to_ascii_lowercase());
    match (numbers.as_slice(), geometry_type.as_deref()) {
        ([x, y], None | Some("esrigeometrypoint")) => Ok(Geometry::Point([*x, *y])),
        ([xmin, ymin, xmax, ymax], None | Some("esrigeometryenvelope")) => {
            Ok(Geometry::envelope_polygon(*xmin, *ymin, *xmax, *ymax))
        }
        _ => Err(malformed(
            "expected 'x,y' for a point or 'xmin,ymin,xmax,ymax' for an envelope",
        )),
    }
}

fn parse_esri(object: &Map<String, Value>) -> Result<Geometry, Error> {
    let coordinate = |key: &str| {
        object
            .get(key)
            .ok_or_else(|| malformed(format!("missing '{key}'")))
            .and_then(number)
    };

    if ["xmin", "ymin", "xmax", "ymax"]
        .iter()
        .all(|key| object.contains_key(*key))
    {
        Ok(Geometry::envelope_polygon(
            coordinate("xmin")?,
            coordinate("ymin")?,
            coordinate("xmax")?,
            coordinate("ymax")?,
        ))
    } else if object.contains_key("x") && object.contains_key("y") {
        Ok(Geometry::Point([coordinate("x")?, coordinate("y")?]))
    } else if let Some(points) = object.get("points") {
        Ok(Geometry::MultiPoint(positions(points)?))
    } else if let Some(paths) = object.get("paths") {
        let mut paths = lines(paths)?;
        if paths.len() == 1 {
            Ok(Geometry::LineString(paths.remove(0)))
        } else {
            Ok(Geometry::MultiLineString(paths))
        }
    } else if let Some(rings) = object.get("rings") {
        Ok(polygon_from_rings(lines(rings)?))
    } else {
        Err(malformed("unrecognised geometry object"))
    }
}

/// Esri polygons are a flat list of rings: clockwise rings are exteriors,
/// counter-clockwise rings are holes of the exterior before them.
fn polygon_from_rings(rings: Vec<Vec<Position>>) -> Geometry {
    let mut polygons: Vec<Vec<Vec<Position>>> = vec![];
    for ring in rings {
        let is_hole = signed_area(&ring) > 0.0;
        match polygons.last_mut() {
            Some(polygon) if is_hole => polygon.push(ring),
            _ => polygons.push(vec![ring]),
        }
    }
    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(polygons)
    }
}

/// Positive for counter-clockwise rings.
fn signed_area(ring: &[Position]) -> f64 {
    ring.windows(2)
        .map(|pair| pair[0][0] * pair[1][1] - pair[1][0] * pair[0][1])
        .sum::<f64>()
        / 2.0
}

fn parse_geojson(kind: &str, coordinates: Option<&Value>) -> Result<Geometry, Error> {
    let coordinates =
        coordinates.ok_or_else(|| malformed(format!("{kind} without coordinates")))?;
    match kind {
        "Point" => Ok(Geometry::Point(position(coordinates)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(positions(coordinates)?)),
        "LineString" => Ok(Geometry::LineString(positions(coordinates)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(lines(coordinates)?)),
        "Polygon" => Ok(Geometry::Polygon(lines(coordinates)?)),
        "MultiPolygon" => Ok(Geometry::MultiPolygon(
            array(coordinates)?
                .iter()
                .map(lines)
                .collect::<Result<Vec<_>, Error>>()?,
        )),
        other => Err(malformed(format!("unsupported geometry type '{other}'"))),
    }
}

fn array(value: &Value) -> Result<&Vec<Value>, Error> {
    value
        .as_array()
        .ok_or_else(|| malformed(format!("expected an array, got {value}")))
}

fn number(value: &Value) -> Result<f64, Error> {
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| malformed(format!("expected a number, got {value}")))
}

fn position(value: &Value) -> Result<Position, Error> {
    match array(value)?.as_slice() {
        [x, y, ..] => Ok([number(x)?, number(y)?]),
        _ => Err(malformed("a position needs at least two coordinates")),
    }
}

fn positions(value: &Value) -> Result<Vec<Position>, Error> {
    array(value)?.iter().map(position).collect()
}

fn lines(value: &Value) -> Result<Vec<Vec<Position>>, Error> {
    array(value)?.iter().map(positions).collect()
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedGeometry(message.into())
}
