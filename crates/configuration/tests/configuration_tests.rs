use similar_asserts::assert_eq;

use geoservice_duckdb_configuration::environment::FixedEnvironment;
use geoservice_duckdb_configuration::error::ParseConfigurationError;
use geoservice_duckdb_configuration::values::Secret;
use geoservice_duckdb_configuration::{
    make_runtime_configuration, parse_configuration, write_parsed_configuration,
    ParsedConfiguration,
};
use query_engine_metadata::metadata::{FieldInfo, FieldType, Wkid};

#[tokio::test]
async fn written_configuration_is_read_back() {
    let dir = tempfile::tempdir().unwrap();

    let mut parsed = ParsedConfiguration::initial();
    parsed.layer.fields = vec![
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
    ];
    parsed.layer.dataset = Secret::from("places/*.parquet");
    parsed.layer.crs = Wkid::WEB_MERCATOR;

    write_parsed_configuration(parsed.clone(), dir.path())
        .await
        .unwrap();

    assert!(dir.path().join("schema.json").exists());
    let read_back = parse_configuration(dir.path()).await.unwrap();
    assert_eq!(read_back, parsed);

    let configuration = make_runtime_configuration(read_back, FixedEnvironment::default()).unwrap();
    assert_eq!(
        configuration.layer.field_names().collect::<Vec<_>>(),
        vec!["name", "confidence"]
    );
    assert_eq!(configuration.layer.crs, Wkid::WEB_MERCATOR);
}

#[tokio::test]
async fn parse_errors_carry_their_location() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(
        dir.path().join("configuration.json"),
        "{\n  \"version\": \"1\",\n  \"layer\": oops\n}\n",
    )
    .await
    .unwrap();

    match parse_configuration(dir.path()).await {
        Err(ParseConfigurationError::ParseError { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn a_missing_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = parse_configuration(dir.path().join("nowhere")).await;
    assert!(matches!(
        result,
        Err(ParseConfigurationError::IoErrorButStringified(_))
    ));
}
