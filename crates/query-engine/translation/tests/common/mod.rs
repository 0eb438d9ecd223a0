use std::fs;
use std::path::PathBuf;

use query_engine_metadata::metadata::LayerMetadata;
use query_engine_sql::sql;
use query_engine_translation::translation;

const GOLDENFILES: &str = "tests/goldenfiles";

pub fn layer() -> LayerMetadata {
    let text = fs::read_to_string(PathBuf::from(GOLDENFILES).join("layer.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// Translate the request of a goldenfile directory.
pub fn translate(testname: &str) -> anyhow::Result<sql::execution_plan::ExecutionPlan> {
    let directory = PathBuf::from(GOLDENFILES).join(testname);
    let raw: translation::query::RawParams =
        serde_json::from_str(&fs::read_to_string(directory.join("request.json"))?)?;
    translate_params(&raw)
}

pub fn translate_params(
    raw: &translation::query::RawParams,
) -> anyhow::Result<sql::execution_plan::ExecutionPlan> {
    let layer = layer();
    let request = translation::query::normalize(&layer, raw)?;
    Ok(translation::query::translate(&layer, &request)?)
}

/// Translate the request of a goldenfile directory and render the statement it
/// would run together with its numbered parameters, for comparison against the snapshot.
pub fn test_translation(testname: &str) -> anyhow::Result<String> {
    let plan = translate(testname)?;
    let query = plan.query_sql();
    let params: Vec<(usize, &sql::string::Param)> = query
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, p))
        .collect();

    Ok(format!("{}\n\n{:?}", query.sql, params))
}

/// The GeoJSON text bound to the only parameter of a statement.
pub fn geometry_param(query: &sql::string::SQL) -> serde_json::Value {
    match query.params.as_slice() {
        [sql::string::Param::String(text)] => serde_json::from_str(text).unwrap(),
        params => panic!("expected a single geometry parameter, got {params:?}"),
    }
}
