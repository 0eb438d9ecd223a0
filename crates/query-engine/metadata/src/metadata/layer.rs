//! Metadata information regarding the layer: its fields and where its data lives.

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::spatial_reference::Wkid;

/// The geometry column name used when none is configured.
pub const DEFAULT_GEOMETRY_FIELD: &str = "geometry";
/// The record ceiling used when none is configured.
pub const DEFAULT_MAX_RECORD_COUNT: u32 = 2000;

/// The field types understood by geoservice clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Sequence, Serialize, Deserialize, JsonSchema,
)]
pub enum FieldType {
    #[serde(rename = "esriFieldTypeOID", alias = "OID")]
    ObjectId,
    #[serde(rename = "esriFieldTypeSmallInteger", alias = "SmallInteger")]
    SmallInteger,
    #[serde(rename = "esriFieldTypeInteger", alias = "Integer")]
    Integer,
    #[serde(rename = "esriFieldTypeBigInteger", alias = "BigInteger")]
    BigInteger,
    #[serde(rename = "esriFieldTypeSingle", alias = "Single")]
    Single,
    #[serde(rename = "esriFieldTypeDouble", alias = "Double")]
    Double,
    #[serde(rename = "esriFieldTypeString", alias = "String")]
    String,
    #[serde(rename = "esriFieldTypeDate", alias = "Date")]
    Date,
    #[serde(rename = "esriFieldTypeGUID", alias = "GUID")]
    Guid,
    #[serde(rename = "esriFieldTypeGlobalID", alias = "GlobalID")]
    GlobalId,
}

impl FieldType {
    /// The name of the type on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ObjectId => "esriFieldTypeOID",
            Self::SmallInteger => "esriFieldTypeSmallInteger",
            Self::Integer => "esriFieldTypeInteger",
            Self::BigInteger => "esriFieldTypeBigInteger",
            Self::Single => "esriFieldTypeSingle",
            Self::Double => "esriFieldTypeDouble",
            Self::String => "esriFieldTypeString",
            Self::Date => "esriFieldTypeDate",
            Self::Guid => "esriFieldTypeGUID",
            Self::GlobalId => "esriFieldTypeGlobalID",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Information about a single attribute field of the layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldInfo {
    pub name: String,
    pub r#type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Opaque reference to the parquet file(s) backing a layer: a path, a glob or a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DatasetLocator(pub String);

impl std::fmt::Display for DatasetLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let DatasetLocator(locator) = self;
        write!(f, "{locator}")
    }
}

/// Everything the query engine needs to know about the layer it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetadata {
    /// Attribute fields, in the order they are presented to clients.
    pub fields: Vec<FieldInfo>,
    pub id_field: String,
    pub geometry_field: String,
    pub dataset: DatasetLocator,
    pub max_record_count: u32,
    /// The spatial reference the geometries are stored in.
    pub crs: Wkid,
}

impl LayerMetadata {
    /// Field names, in metadata order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn lookup_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }
}
