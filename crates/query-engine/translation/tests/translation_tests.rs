mod common;

use query_engine_sql::sql;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::query::RawParams;
use serde_json::json;

fn raw(value: serde_json::Value) -> RawParams {
    serde_json::from_value(value).unwrap()
}

fn render_where(where_: &sql::ast::Where) -> String {
    let mut sql = sql::string::SQL::new();
    where_.to_sql(&mut sql);
    sql.sql
}

mod goldenfiles {
    use super::*;

    #[test]
    fn features_with_filters() {
        let result = common::test_translation("features_with_filters").unwrap();
        insta::assert_snapshot!(result);
    }

    #[test]
    fn first_page() {
        let result = common::test_translation("first_page").unwrap();
        insta::assert_snapshot!(result);
    }

    #[test]
    fn count_only() {
        let result = common::test_translation("count_only").unwrap();
        insta::assert_snapshot!(result);
    }

    #[test]
    fn extent_only() {
        let result = common::test_translation("extent_only").unwrap();
        insta::assert_snapshot!(result);
    }

    #[test]
    fn unknown_out_fields() {
        let result = common::test_translation("unknown_out_fields").unwrap();
        insta::assert_snapshot!(result);
    }
}

#[test]
fn statements_share_one_where_clause() {
    for testname in [
        "features_with_filters",
        "count_only",
        "extent_only",
        "first_page",
        "unknown_out_fields",
    ] {
        let plan = common::translate(testname).unwrap();
        let statements = &plan.statements;
        let filter = render_where(&statements.filter);

        let features = sql::convert::select_to_sql(&statements.features).sql;
        let count = sql::convert::select_to_sql(&statements.count).sql;
        let extent = sql::convert::select_to_sql(&statements.extent).sql;

        assert_eq!(statements.count.where_, statements.filter, "{testname}");
        assert_eq!(statements.extent.where_, statements.filter, "{testname}");
        for statement in [&features, &count, &extent] {
            assert!(
                statement.contains(&filter),
                "{testname}: {statement} does not contain {filter}"
            );
        }
    }
}

#[test]
fn without_offset_the_object_id_is_a_bare_row_number() {
    let plan = common::translate_params(&raw(json!({"resultRecordCount": "25"}))).unwrap();
    let sql = plan.query_sql().sql;
    assert!(sql.contains(r#"ROW_NUMBER() OVER () AS "OBJECTID""#), "{sql}");
    assert!(!sql.contains("OFFSET"), "{sql}");
    assert_eq!(sql.matches(" LIMIT ").count(), 1, "{sql}");
    assert!(sql.contains(" LIMIT 25)"), "{sql}");
}

#[test]
fn with_offset_the_object_id_continues_from_the_offset() {
    for offset in [1, 20, 4000] {
        let plan = common::translate_params(&raw(json!({
            "resultOffset": offset.to_string(),
            "resultRecordCount": "10"
        })))
        .unwrap();
        let sql = plan.query_sql().sql;
        assert!(
            sql.contains(&format!(r#"(ROW_NUMBER() OVER () + {offset}) AS "OBJECTID""#)),
            "{sql}"
        );
        assert!(sql.contains(&format!(" LIMIT 10 OFFSET {offset})")), "{sql}");
        assert_eq!(sql.matches(" LIMIT ").count(), 1, "{sql}");
    }
}

#[test]
fn features_are_aggregated_in_the_requested_order() {
    let plan = common::translate_params(&raw(json!({
        "outFields": "name",
        "orderByFields": "confidence DESC, OBJECTID"
    })))
    .unwrap();
    let sql = plan.query_sql().sql;
    assert!(
        sql.contains(r#"SELECT "name" AS "name", "geometry" AS "geometry", "confidence" AS "confidence", ROW_NUMBER() OVER () AS "OBJECTID" FROM "#),
        "{sql}"
    );
    assert!(
        sql.contains(r#"ORDER BY "confidence" DESC, "OBJECTID" ASC LIMIT 2000)"#),
        "{sql}"
    );
    assert!(
        sql.contains(r#"'properties', json_object('name', "name")) ORDER BY "confidence" DESC, "OBJECTID" ASC))"#),
        "{sql}"
    );
}

#[test]
fn count_only_ignores_pagination() {
    let plan = common::translate_params(&raw(json!({
        "returnCountOnly": "true",
        "resultOffset": "10",
        "orderByFields": "name"
    })))
    .unwrap();
    let sql = plan.query_sql().sql;
    assert!(sql.starts_with(r#"SELECT COUNT(*) AS "count" FROM "#), "{sql}");
    assert!(!sql.contains("LIMIT") && !sql.contains("ORDER BY"), "{sql}");
}

#[test]
fn geometry_text_is_never_inlined() {
    let plan = common::translate_params(&raw(json!({
        "geometry": r#"{"x": 1, "y": 2, "spatialReference": {"wkid": 4326}, "note": "x'); DROP TABLE t; --"}"#
    })))
    .unwrap();
    let query = plan.query_sql();
    assert!(!query.sql.contains("DROP"), "{}", query.sql);
    assert!(!query.sql.contains("Point"), "{}", query.sql);
    assert_eq!(query.params.len(), 1);
}

#[test]
fn geometry_filters_are_projected_to_the_layer() {
    let plan = common::translate_params(&raw(json!({
        "geometry": r#"{"x": 20037508.342789244, "y": 0, "spatialReference": {"wkid": 102100}}"#,
        "returnCountOnly": "true"
    })))
    .unwrap();
    let query = plan.query_sql();
    let param = common::geometry_param(&query);
    let x = param["coordinates"][0].as_f64().unwrap();
    assert!((x - 180.0).abs() < 1e-9, "{param}");
}

#[test]
fn rejected_requests() {
    let cases = [
        json!({"where": "1=1; DELETE FROM t"}),
        json!({"where": "id IN (SELECT id FROM secrets)"}),
        json!({"where": "name = $1", "geometry": "0,0"}),
        json!({"orderByFields": "population"}),
        json!({"spatialRel": "esriSpatialRelNearby", "geometry": "0,0"}),
        json!({"geometry": "0,0", "inSR": "2154"}),
        json!({"geometry": "not,a,geometry"}),
        json!({"resultRecordCount": "-1"}),
    ];
    for case in cases {
        let error = common::translate_params(&raw(case.clone())).unwrap_err();
        let error = error
            .downcast_ref::<Error>()
            .unwrap_or_else(|| panic!("{case}: unexpected error {error}"));
        assert_eq!(
            error.kind(),
            query_engine_translation::translation::error::ErrorKind::Translation,
            "{case}"
        );
    }
}
