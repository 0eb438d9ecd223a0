//! The first version of the configuration format.

use std::path::Path;

use schemars::{gen::SchemaSettings, schema::RootSchema, JsonSchema};
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata::{self, FieldInfo, Wkid};

use crate::environment::Variable;
use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::Secret;

pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";
pub const DEFAULT_DATASET_VARIABLE: &str = "GEOSERVICE_DATASET";

const DEFAULT_QUERY_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_EXTENSIONS: [&str; 2] = ["spatial", "httpfs"];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, JsonSchema)]
pub enum Version {
    #[serde(rename = "1")]
    This,
}

/// The configuration as it is written on disk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ParsedConfiguration {
    pub version: Version,
    pub layer: LayerConfiguration,
    #[serde(default, skip_serializing_if = "EngineSettings::is_default")]
    pub engine: EngineSettings,
}

/// The layer served by the connector.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfiguration {
    /// Attribute fields, in the order they are presented to clients.
    pub fields: Vec<FieldInfo>,
    pub id_field: String,
    #[serde(default = "default_geometry_field")]
    pub geometry_field: String,
    /// Path, glob or URL of the parquet file(s).
    pub dataset: Secret,
    #[serde(default = "default_max_record_count")]
    pub max_record_count: u32,
    #[serde(default)]
    pub crs: Wkid,
}

/// Settings for the embedded engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// DuckDB extensions installed and loaded when the engine starts.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Upper bound on the duration of a single statement.
    #[serde(default = "default_query_timeout_seconds")]
    pub query_timeout_seconds: u64,
}

impl Default for EngineSettings {
    fn default() -> EngineSettings {
        EngineSettings {
            extensions: default_extensions(),
            query_timeout_seconds: DEFAULT_QUERY_TIMEOUT_SECONDS,
        }
    }
}

impl EngineSettings {
    fn is_default(&self) -> bool {
        *self == EngineSettings::default()
    }
}

// for serde default //
fn default_geometry_field() -> String {
    metadata::DEFAULT_GEOMETRY_FIELD.to_string()
}
fn default_max_record_count() -> u32 {
    metadata::DEFAULT_MAX_RECORD_COUNT
}
fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
}
fn default_query_timeout_seconds() -> u64 {
    DEFAULT_QUERY_TIMEOUT_SECONDS
}

impl ParsedConfiguration {
    /// A configuration with no fields yet, reading its dataset from the environment.
    pub fn initial() -> Self {
        ParsedConfiguration {
            version: Version::This,
            layer: LayerConfiguration {
                fields: vec![],
                id_field: "id".to_string(),
                geometry_field: default_geometry_field(),
                dataset: Secret::FromEnvironment {
                    variable: Variable::new(DEFAULT_DATASET_VARIABLE),
                },
                max_record_count: default_max_record_count(),
                crs: Wkid::default(),
            },
            engine: EngineSettings::default(),
        }
    }

    /// The JSON schema of the configuration file.
    pub fn json_schema() -> RootSchema {
        SchemaSettings::draft07()
            .into_generator()
            .into_root_schema_for::<ParsedConfiguration>()
    }
}

/// Parse the configuration file found in `configuration_dir`.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    serde_json::from_str(&configuration_file_contents).map_err(|error| {
        ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        }
    })
}

/// Write the parsed configuration, and its JSON schema, into a directory on disk.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    let schema_file = out_dir.as_ref().join(CONFIGURATION_JSONSCHEMA_FILENAME);
    fs::write(
        schema_file,
        serde_json::to_string_pretty(&ParsedConfiguration::json_schema())
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}
