//! Common functions used across test cases.

use std::sync::Arc;

use axum_test_helper::TestClient;

use geoservice_duckdb::{routes, state};
use geoservice_duckdb_configuration::environment::EmptyEnvironment;
use geoservice_duckdb_configuration::{make_runtime_configuration, parse_configuration};
use query_engine_execution::engine::{Engine, EngineHandle};
use tests_common::deployment::{get_path_from_project_root, STATIC_CONFIGURATION_PATH};
use tests_common::engine::ScriptedEngine;

/// Load the static test configuration.
pub async fn configuration() -> geoservice_duckdb_configuration::Configuration {
    let parsed = parse_configuration(get_path_from_project_root(STATIC_CONFIGURATION_PATH))
        .await
        .unwrap();
    make_runtime_configuration(parsed, EmptyEnvironment).unwrap()
}

/// Creates a client for a router backed by the given engine.
pub async fn create_client(engine: EngineHandle) -> TestClient {
    let state = state::create_state(configuration().await, engine)
        .await
        .unwrap();
    TestClient::new(routes::create_router(state))
}

/// Creates a client for a router whose engine answers from `engine`'s script.
pub async fn create_scripted_client(engine: Arc<ScriptedEngine>) -> TestClient {
    create_client(EngineHandle::ready(engine as Arc<dyn Engine>)).await
}
