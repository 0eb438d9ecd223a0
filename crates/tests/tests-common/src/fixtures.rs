//! Layers and rows shared by the test suites.

use query_engine_execution::engine::Row;
use query_engine_metadata::metadata::{
    DatasetLocator, FieldInfo, FieldType, LayerMetadata, Wkid, DEFAULT_GEOMETRY_FIELD,
};

/// A places layer stored in WGS 84.
pub fn places_layer() -> LayerMetadata {
    LayerMetadata {
        fields: vec![
            FieldInfo {
                name: "id".to_string(),
                r#type: FieldType::String,
                alias: None,
            },
            FieldInfo {
                name: "name".to_string(),
                r#type: FieldType::String,
                alias: Some("Name".to_string()),
            },
            FieldInfo {
                name: "confidence".to_string(),
                r#type: FieldType::Double,
                alias: None,
            },
        ],
        id_field: "id".to_string(),
        geometry_field: DEFAULT_GEOMETRY_FIELD.to_string(),
        dataset: DatasetLocator("s3://overture/places/*.parquet".to_string()),
        max_record_count: 2000,
        crs: Wkid::WGS84,
    }
}

/// The single row of a feature collection statement holding two places.
pub fn two_places() -> Vec<Row> {
    vec![vec![serde_json::Value::String(
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": 1,
                    "geometry": {"type": "Point", "coordinates": [-0.1276, 51.5072]},
                    "properties": {"name": "Covent Garden", "confidence": 0.9}
                },
                {
                    "type": "Feature",
                    "id": 2,
                    "geometry": {"type": "Point", "coordinates": [-0.1246, 51.5007]},
                    "properties": {"name": "Westminster", "confidence": 0.8}
                }
            ]
        })
        .to_string(),
    )]]
}

/// The single row of a count statement.
pub fn count_of(count: i64) -> Vec<Row> {
    vec![vec![serde_json::json!(count)]]
}
