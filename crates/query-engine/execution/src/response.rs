//! Shape raw engine rows into geoservice responses.

use query_engine_metadata::metadata::{FieldInfo, LayerMetadata, SpatialReference};
use query_engine_sql::sql::execution_plan::QueryMode;
use serde::Serialize;

use crate::engine::Row;
use crate::error::Error;

/// The provider name reported in every feature collection.
pub const PROVIDER_NAME: &str = "duckdb";
pub const PROVIDER_DESCRIPTION: &str = "DuckDB Provider";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Count(CountResponse),
    Extent(ExtentResponse),
    Features(FeatureCollectionResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtentResponse {
    pub count: u64,
    pub extent: Extent,
}

/// A bounding box. The bounds are null when no row matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub xmin: Option<f64>,
    pub ymin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymax: Option<f64>,
    pub spatial_reference: SpatialReference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollectionResponse {
    pub r#type: String,
    pub features: Vec<serde_json::Value>,
    pub metadata: ResponseMetadata,
}

/// Describes the layer a feature collection came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub name: String,
    pub description: String,
    pub id_field: String,
    pub fields: Vec<FieldInfo>,
    pub max_record_count: u32,
    pub return_exceeded_limit_features: bool,
    pub supports_pagination: bool,
}

impl ResponseMetadata {
    pub fn for_layer(layer: &LayerMetadata) -> ResponseMetadata {
        ResponseMetadata {
            name: PROVIDER_NAME.to_string(),
            description: PROVIDER_DESCRIPTION.to_string(),
            id_field: layer.id_field.clone(),
            fields: layer.fields.clone(),
            max_record_count: layer.max_record_count,
            return_exceeded_limit_features: true,
            supports_pagination: true,
        }
    }
}

/// Turn the rows of the statement that answered `mode` into a response.
pub fn shape_response(
    mode: QueryMode,
    layer: &LayerMetadata,
    rows: Vec<Row>,
) -> Result<QueryResponse, Error> {
    match mode {
        QueryMode::Count => Ok(QueryResponse::Count(CountResponse {
            count: count(first_row(&rows)?)?,
        })),
        QueryMode::Extent => Ok(QueryResponse::Extent(shape_extent(layer, &rows)?)),
        QueryMode::Features => Ok(QueryResponse::Features(shape_features(layer, rows)?)),
    }
}

fn first_row(rows: &[Row]) -> Result<&Row, Error> {
    rows.first()
        .ok_or_else(|| Error::UnexpectedResult("the query returned no rows".to_string()))
}

fn count(row: &Row) -> Result<u64, Error> {
    let value = row.first().unwrap_or(&serde_json::Value::Null);
    match value {
        serde_json::Value::Number(number) => number.as_u64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::UnexpectedResult(format!("{value} is not a row count")))
}

fn bound(value: Option<&serde_json::Value>) -> Result<Option<f64>, Error> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(number)) => Ok(number.as_f64()),
        Some(serde_json::Value::String(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::UnexpectedResult(format!("'{text}' is not a coordinate"))),
        Some(other) => Err(Error::UnexpectedResult(format!(
            "{other} is not a coordinate"
        ))),
    }
}

/// Rows of the form `[count, xmin, ymin, xmax, ymax]`.
fn shape_extent(layer: &LayerMetadata, rows: &[Row]) -> Result<ExtentResponse, Error> {
    let row = first_row(rows)?;
    Ok(ExtentResponse {
        count: count(row)?,
        extent: Extent {
            xmin: bound(row.get(1))?,
            ymin: bound(row.get(2))?,
            xmax: bound(row.get(3))?,
            ymax: bound(row.get(4))?,
            spatial_reference: SpatialReference::from(layer.crs),
        },
    })
}

/// The feature collection arrives as the first column of the first row,
/// either as JSON text or already decoded.
fn shape_features(
    layer: &LayerMetadata,
    rows: Vec<Row>,
) -> Result<FeatureCollectionResponse, Error> {
    let value = rows
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().next())
        .unwrap_or(serde_json::Value::Null);

    let collection = match value {
        serde_json::Value::String(text) => serde_json::from_str(&text).map_err(|err| {
            Error::UnexpectedResult(format!("the feature collection is not valid JSON: {err}"))
        })?,
        other => other,
    };

    // a collection over no rows aggregates to null features
    let features = match collection.get("features") {
        Some(serde_json::Value::Array(features)) => features.clone(),
        _ => vec![],
    };

    Ok(FeatureCollectionResponse {
        r#type: "FeatureCollection".to_string(),
        features,
        metadata: ResponseMetadata::for_layer(layer),
    })
}
