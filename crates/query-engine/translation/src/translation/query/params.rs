//! Normalize raw geoservice parameters into a `QueryRequest`.

use query_engine_metadata::metadata::{DatasetLocator, LayerMetadata, SpatialReference, Wkid};
use query_engine_sql::sql::execution_plan::QueryMode;
use serde::Deserialize;

use super::spatial_filter::SpatialRelation;
use crate::translation::error::Error;

/// Geoservice query parameters exactly as they arrive in a query string or a form body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParams {
    #[serde(rename = "where")]
    pub where_: Option<String>,
    pub object_ids: Option<String>,
    pub geometry: Option<String>,
    pub geometry_type: Option<String>,
    pub spatial_rel: Option<String>,
    #[serde(rename = "inSR")]
    pub in_sr: Option<String>,
    pub out_fields: Option<String>,
    pub order_by_fields: Option<String>,
    pub result_record_count: Option<String>,
    pub result_offset: Option<String>,
    pub return_count_only: Option<String>,
    pub return_extent_only: Option<String>,
}

/// A geometry filter as the client sent it. It is only parsed once the
/// spatial references involved are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryInput {
    pub geometry: String,
    pub geometry_type: Option<String>,
}

/// A validated request, ready to be translated to SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub where_: Option<String>,
    pub object_ids: Vec<i64>,
    pub geometry: Option<GeometryInput>,
    pub spatial_relation: SpatialRelation,
    pub in_sr: Option<Wkid>,
    /// The spatial reference geometry filters are projected to before comparison.
    pub reprojection_sr: Wkid,
    /// Property fields to return, in metadata order.
    pub out_fields: Vec<String>,
    pub order_by_fields: Option<String>,
    pub result_record_count: u32,
    pub result_offset: Option<u32>,
    pub mode: QueryMode,
    pub id_field: String,
    pub geometry_field: String,
    pub dataset: DatasetLocator,
}

/// Validate the raw parameters of one request against the layer they target.
pub fn normalize(layer: &LayerMetadata, raw: &RawParams) -> Result<QueryRequest, Error> {
    let out_fields = resolve_out_fields(layer, raw.out_fields.as_deref())?;

    let object_ids = match non_empty(&raw.object_ids) {
        None => vec![],
        Some(text) => parse_object_ids(text)?,
    };

    let geometry = non_empty(&raw.geometry).map(|geometry| GeometryInput {
        geometry: geometry.to_string(),
        geometry_type: non_empty(&raw.geometry_type).map(str::to_string),
    });

    let spatial_relation = match non_empty(&raw.spatial_rel) {
        None => SpatialRelation::default(),
        Some(text) => text.parse()?,
    };

    let in_sr = non_empty(&raw.in_sr)
        .map(|text| parse_spatial_reference("inSR", text))
        .transpose()?;

    let result_record_count = match non_empty(&raw.result_record_count) {
        None => layer.max_record_count,
        Some(text) => {
            let requested = parse_number::<u32>("resultRecordCount", text)?;
            if requested == 0 {
                return Err(Error::invalid_parameter(
                    "resultRecordCount",
                    "must be a positive integer",
                ));
            }
            requested.min(layer.max_record_count)
        }
    };

    // An offset of zero skips nothing.
    let result_offset = non_empty(&raw.result_offset)
        .map(|text| parse_number::<u32>("resultOffset", text))
        .transpose()?
        .filter(|offset| *offset > 0);

    let count_only = parse_flag("returnCountOnly", raw.return_count_only.as_deref())?;
    let extent_only = parse_flag("returnExtentOnly", raw.return_extent_only.as_deref())?;
    let mode = if count_only {
        QueryMode::Count
    } else if extent_only {
        QueryMode::Extent
    } else {
        QueryMode::Features
    };

    Ok(QueryRequest {
        where_: non_empty(&raw.where_).map(str::to_string),
        object_ids,
        geometry,
        spatial_relation,
        in_sr,
        reprojection_sr: layer.crs.canonical(),
        out_fields,
        order_by_fields: non_empty(&raw.order_by_fields).map(str::to_string),
        result_record_count,
        result_offset,
        mode,
        id_field: layer.id_field.clone(),
        geometry_field: layer.geometry_field.clone(),
        dataset: layer.dataset.clone(),
    })
}

/// Resolve the requested output fields against the layer's fields.
///
/// `*`, an empty value or no value at all select every field. An explicit list
/// selects the fields it names that the layer knows about, in metadata order.
/// The geometry field is never returned as a property.
pub fn resolve_out_fields(
    layer: &LayerMetadata,
    requested: Option<&str>,
) -> Result<Vec<String>, Error> {
    if layer.fields.is_empty() {
        return Err(Error::InvalidFieldList(
            "the layer does not declare any fields".to_string(),
        ));
    }
    if layer.fields.iter().any(|field| field.name.trim().is_empty()) {
        return Err(Error::InvalidFieldList(
            "a field has an empty name".to_string(),
        ));
    }

    let requested: Vec<&str> = requested
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let wildcard = requested.is_empty() || requested.contains(&"*");

    for name in &requested {
        if *name != "*" && layer.lookup_field(name).is_none() {
            tracing::debug!(field = %name, "Dropping unknown output field");
        }
    }

    Ok(layer
        .field_names()
        .filter(|name| *name != layer.geometry_field)
        .filter(|name| wildcard || requested.contains(name))
        .map(str::to_string)
        .collect())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn parse_number<T: std::str::FromStr>(parameter: &'static str, text: &str) -> Result<T, Error> {
    text.trim()
        .parse()
        .map_err(|_| Error::invalid_parameter(parameter, format!("'{text}' is not a valid number")))
}

fn parse_flag(parameter: &'static str, value: Option<&str>) -> Result<bool, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        Some(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        Some(text) => Err(Error::invalid_parameter(
            parameter,
            format!("expected true or false, got '{text}'"),
        )),
    }
}

/// Object ids as `1,2,3` or as a JSON array `[1,2,3]`.
fn parse_object_ids(text: &str) -> Result<Vec<i64>, Error> {
    if text.starts_with('[') {
        serde_json::from_str(text)
            .map_err(|err| Error::invalid_parameter("objectIds", err.to_string()))
    } else {
        text.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| parse_number("objectIds", id))
            .collect()
    }
}

/// A spatial reference as `4326` or as `{"wkid": 4326}`.
pub(crate) fn parse_spatial_reference(
    parameter: &'static str,
    text: &str,
) -> Result<Wkid, Error> {
    let text = text.trim();
    if text.starts_with('{') {
        let spatial_reference: SpatialReference = serde_json::from_str(text)
            .map_err(|err| Error::invalid_parameter(parameter, err.to_string()))?;
        Ok(spatial_reference.effective())
    } else {
        Ok(Wkid(parse_number(parameter, text)?).canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::{FieldInfo, FieldType};

    fn layer() -> LayerMetadata {
        let field = |name: &str, r#type| FieldInfo {
            name: name.to_string(),
            r#type,
            alias: None,
        };
        LayerMetadata {
            fields: vec![
                field("id", FieldType::String),
                field("name", FieldType::String),
                field("confidence", FieldType::Double),
                field("geometry", FieldType::String),
            ],
            id_field: "id".to_string(),
            geometry_field: "geometry".to_string(),
            dataset: DatasetLocator("places/*.parquet".to_string()),
            max_record_count: 100,
            crs: Wkid::WGS84,
        }
    }

    #[test]
    fn wildcard_selects_every_field_except_the_geometry() {
        let expected = vec!["id", "name", "confidence"];
        assert_eq!(resolve_out_fields(&layer(), Some("*")).unwrap(), expected);
        assert_eq!(resolve_out_fields(&layer(), None).unwrap(), expected);
    }

    #[test]
    fn explicit_fields_keep_metadata_order_and_drop_unknown_names() {
        assert_eq!(
            resolve_out_fields(&layer(), Some(" confidence, bogus ,id")).unwrap(),
            vec!["id", "confidence"]
        );
    }

    #[test]
    fn a_layer_without_fields_cannot_be_queried() {
        let mut layer = layer();
        layer.fields.clear();
        assert!(matches!(
            resolve_out_fields(&layer, Some("*")),
            Err(Error::InvalidFieldList(_))
        ));
    }

    #[test]
    fn defaults() {
        let request = normalize(&layer(), &RawParams::default()).unwrap();
        assert_eq!(request.mode, QueryMode::Features);
        assert_eq!(request.result_record_count, 100);
        assert_eq!(request.result_offset, None);
        assert_eq!(request.spatial_relation, SpatialRelation::Intersects);
        assert!(request.object_ids.is_empty());
        assert_eq!(request.geometry, None);
        assert_eq!(request.where_, None);
    }

    #[test]
    fn object_ids_accept_lists_and_arrays() {
        for text in ["1, 2,3", "[1,2,3]"] {
            let raw = RawParams {
                object_ids: Some(text.to_string()),
                ..RawParams::default()
            };
            assert_eq!(normalize(&layer(), &raw).unwrap().object_ids, vec![1, 2, 3]);
        }
    }

    #[test]
    fn malformed_object_ids_name_the_parameter() {
        let raw = RawParams {
            object_ids: Some("1,two".to_string()),
            ..RawParams::default()
        };
        assert!(matches!(
            normalize(&layer(), &raw),
            Err(Error::InvalidParameter {
                parameter: "objectIds",
                ..
            })
        ));
    }

    #[test]
    fn record_count_is_capped_by_the_layer() {
        let raw = RawParams {
            result_record_count: Some("5000".to_string()),
            ..RawParams::default()
        };
        assert_eq!(normalize(&layer(), &raw).unwrap().result_record_count, 100);

        let raw = RawParams {
            result_record_count: Some("10".to_string()),
            ..RawParams::default()
        };
        assert_eq!(normalize(&layer(), &raw).unwrap().result_record_count, 10);
    }

    #[test]
    fn count_only_takes_precedence_over_extent_only() {
        let raw = RawParams {
            return_count_only: Some("TRUE".to_string()),
            return_extent_only: Some("true".to_string()),
            ..RawParams::default()
        };
        assert_eq!(normalize(&layer(), &raw).unwrap().mode, QueryMode::Count);

        let raw = RawParams {
            return_count_only: Some("false".to_string()),
            return_extent_only: Some("True".to_string()),
            ..RawParams::default()
        };
        assert_eq!(normalize(&layer(), &raw).unwrap().mode, QueryMode::Extent);
    }

    #[test]
    fn flags_must_be_booleans() {
        let raw = RawParams {
            return_count_only: Some("yes".to_string()),
            ..RawParams::default()
        };
        assert!(matches!(
            normalize(&layer(), &raw),
            Err(Error::InvalidParameter {
                parameter: "returnCountOnly",
                ..
            })
        ));
    }

    #[test]
    fn in_sr_accepts_codes_and_objects() {
        for text in ["102100", r#"{"wkid": 102100, "latestWkid": 3857}"#] {
            let raw = RawParams {
                in_sr: Some(text.to_string()),
                ..RawParams::default()
            };
            assert_eq!(
                normalize(&layer(), &raw).unwrap().in_sr,
                Some(Wkid::WEB_MERCATOR)
            );
        }
    }

    #[test]
    fn a_zero_offset_is_no_offset() {
        let raw = RawParams {
            result_offset: Some("0".to_string()),
            ..RawParams::default()
        };
        assert_eq!(normalize(&layer(), &raw).unwrap().result_offset, None);
    }

    #[test]
    fn raw_params_deserialize_from_geoservice_names() {
        let raw: RawParams = serde_json::from_value(serde_json::json!({
            "where": "name = 'x'",
            "inSR": "4326",
            "outFields": "*",
            "resultOffset": "10",
            "f": "json"
        }))
        .unwrap();
        assert_eq!(raw.where_.as_deref(), Some("name = 'x'"));
        assert_eq!(raw.in_sr.as_deref(), Some("4326"));
        assert_eq!(raw.out_fields.as_deref(), Some("*"));
        assert_eq!(raw.result_offset.as_deref(), Some("10"));
    }
}
