//! Convert a parsed configuration into the runtime configuration.

use query_engine_metadata::metadata::{DatasetLocator, LayerMetadata};

use crate::configuration::Configuration;
use crate::environment::{self, Environment};
use crate::error::MakeRuntimeConfigurationError;
use crate::version1::{LayerConfiguration, ParsedConfiguration};
use crate::values::Secret;

/// Resolve every secret and check the configuration can serve queries.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let layer = convert_layer(parsed_config.layer, &environment)?;

    if parsed_config.engine.query_timeout_seconds == 0 {
        return Err(MakeRuntimeConfigurationError::InvalidConfiguration(
            "queryTimeoutSeconds must be greater than zero".to_string(),
        ));
    }
    if let Some(extension) = parsed_config
        .engine
        .extensions
        .iter()
        .find(|name| !is_valid_extension_name(name))
    {
        return Err(MakeRuntimeConfigurationError::InvalidConfiguration(
            format!("invalid extension name: {extension:?}"),
        ));
    }

    Ok(Configuration {
        layer,
        engine: parsed_config.engine,
    })
}

fn convert_layer(
    layer: LayerConfiguration,
    environment: &impl Environment,
) -> Result<LayerMetadata, MakeRuntimeConfigurationError> {
    if layer.fields.is_empty() {
        return Err(MakeRuntimeConfigurationError::InvalidConfiguration(
            "the layer must declare at least one field".to_string(),
        ));
    }
    if layer.fields.iter().any(|field| field.name.trim().is_empty()) {
        return Err(MakeRuntimeConfigurationError::InvalidConfiguration(
            "field names must not be empty".to_string(),
        ));
    }
    if layer.id_field.trim().is_empty() {
        return Err(MakeRuntimeConfigurationError::InvalidConfiguration(
            "idField must not be empty".to_string(),
        ));
    }
    if layer.max_record_count == 0 {
        return Err(MakeRuntimeConfigurationError::InvalidConfiguration(
            "maxRecordCount must be greater than zero".to_string(),
        ));
    }

    let dataset = resolve(&layer.dataset, environment)?;
    if dataset.trim().is_empty() {
        return Err(MakeRuntimeConfigurationError::InvalidConfiguration(
            "dataset must not be empty".to_string(),
        ));
    }

    Ok(LayerMetadata {
        fields: layer.fields,
        id_field: layer.id_field,
        geometry_field: layer.geometry_field,
        dataset: DatasetLocator(dataset),
        max_record_count: layer.max_record_count,
        crs: layer.crs,
    })
}

fn resolve(
    secret: &Secret,
    environment: &impl Environment,
) -> Result<String, MakeRuntimeConfigurationError> {
    secret.resolve(environment).map_err(|error| match error {
        environment::Error::VariableNotPresent(variable) => {
            MakeRuntimeConfigurationError::MissingEnvironmentVariable {
                message: format!("the variable {variable} is not set"),
                variable,
            }
        }
        environment::Error::NonUnicodeValue { variable, value } => {
            MakeRuntimeConfigurationError::MissingEnvironmentVariable {
                message: format!("the value {value:?} is not valid unicode"),
                variable,
            }
        }
    })
}

fn is_valid_extension_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
