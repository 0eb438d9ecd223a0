//! Translate a geometry filter and spatial relation to a spatial predicate.

use std::str::FromStr;

use enum_iterator::Sequence;
use query_engine_metadata::metadata::Wkid;
use query_engine_sql::sql;

use super::geometry::{parse_geometry, Geometry};
use super::params::GeometryInput;
use super::projection;
use crate::translation::error::Error;

/// The topological test between a row's geometry and the filter geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Sequence)]
pub enum SpatialRelation {
    #[default]
    Intersects,
    EnvelopeIntersects,
    Within,
    Contains,
    Crosses,
    Overlaps,
    Touches,
}

const RELATION_PREFIX: &str = "esriSpatialRel";

impl SpatialRelation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Intersects => "esriSpatialRelIntersects",
            Self::EnvelopeIntersects => "esriSpatialRelEnvelopeIntersects",
            Self::Within => "esriSpatialRelWithin",
            Self::Contains => "esriSpatialRelContains",
            Self::Crosses => "esriSpatialRelCrosses",
            Self::Overlaps => "esriSpatialRelOverlaps",
            Self::Touches => "esriSpatialRelTouches",
        }
    }

    /// The DuckDB spatial function implementing this relation.
    pub fn predicate(&self) -> sql::ast::Function {
        match self {
            Self::Intersects | Self::EnvelopeIntersects => sql::ast::Function::StIntersects,
            Self::Within => sql::ast::Function::StWithin,
            Self::Contains => sql::ast::Function::StContains,
            Self::Crosses => sql::ast::Function::StCrosses,
            Self::Overlaps => sql::ast::Function::StOverlaps,
            Self::Touches => sql::ast::Function::StTouches,
        }
    }
}

impl FromStr for SpatialRelation {
    type Err = Error;

    /// Accepts the full name (`esriSpatialRelWithin`) or the short one (`within`), in any case.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        enum_iterator::all::<SpatialRelation>()
            .find(|relation| {
                let name = relation.name();
                name.eq_ignore_ascii_case(text)
                    || name[RELATION_PREFIX.len()..].eq_ignore_ascii_case(text)
            })
            .ok_or_else(|| Error::UnsupportedSpatialRelation(text.to_string()))
    }
}

/// A geometry filter, projected to the spatial reference of the layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryFilter {
    pub geometry: Geometry,
    pub relation: SpatialRelation,
}

impl GeometryFilter {
    /// The filter geometry as GeoJSON text.
    pub fn geojson(&self) -> String {
        self.geometry.to_geojson().to_string()
    }

    /// `<relation>("<geometry column>", ST_GeomFromGeoJSON(CAST($n AS VARCHAR)))`,
    /// with the filter geometry bound as a parameter.
    pub fn predicate(&self, geometry_column: &str) -> sql::ast::Expression {
        let literal = sql::ast::Expression::FunctionCall {
            function: sql::ast::Function::StGeomFromGeoJson,
            args: vec![sql::ast::Expression::Cast {
                expression: Box::new(sql::ast::Expression::Value(sql::ast::Value::String(
                    self.geojson(),
                ))),
                r#type: sql::ast::ScalarType::Varchar,
            }],
        };
        sql::ast::Expression::FunctionCall {
            function: self.relation.predicate(),
            args: vec![sql::helpers::make_column_reference(geometry_column), literal],
        }
    }
}

/// Parse and reproject the geometry filter of a request, if it has one.
///
/// The spatial reference embedded in the geometry wins over `in_sr`; with
/// neither, the geometry is taken to be WGS 84.
pub fn translate_geometry_filter(
    input: Option<&GeometryInput>,
    relation: SpatialRelation,
    in_sr: Option<Wkid>,
    target: Wkid,
) -> Result<Option<GeometryFilter>, Error> {
    let Some(input) = input else {
        return Ok(None);
    };
    let (geometry, embedded_sr) = parse_geometry(input)?;
    let source = embedded_sr.or(in_sr).unwrap_or(Wkid::WGS84);
    let target = target.canonical();

    let mut geometry = projection::reproject(geometry, source, target)?;
    if relation == SpatialRelation::EnvelopeIntersects {
        geometry = geometry.envelope()?;
    }

    Ok(Some(GeometryFilter { geometry, relation }))
}
