//! The HTTP surface of the connector.

use axum::extract::{Form, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use query_engine_execution::engine::Readiness;
use query_engine_execution::metrics;
use query_engine_execution::response::QueryResponse;
use query_engine_translation::translation::query::RawParams;

use crate::error::Error;
use crate::state::State;

pub fn create_router(state: State) -> Router {
    Router::new()
        .route("/query", get(get_query).post(post_query))
        .route(
            "/rest/services/:service/FeatureServer/:layer/query",
            get(get_query).post(post_query),
        )
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

async fn get_query(
    axum::extract::State(state): axum::extract::State<State>,
    Query(params): Query<RawParams>,
) -> Result<Json<QueryResponse>, Error> {
    run_query(&state, params).await
}

async fn post_query(
    axum::extract::State(state): axum::extract::State<State>,
    Form(params): Form<RawParams>,
) -> Result<Json<QueryResponse>, Error> {
    run_query(&state, params).await
}

async fn run_query(state: &State, params: RawParams) -> Result<Json<QueryResponse>, Error> {
    crate::query::query(state, params)
        .await
        .map(Json)
        .map_err(|err| {
            tracing::error!(
                meta.signal_type = "log",
                event.domain = "geoservice",
                event.name = "Query error",
                name = "Query error",
                body = %err,
                error = true,
            );
            err
        })
}

async fn get_health(axum::extract::State(state): axum::extract::State<State>) -> StatusCode {
    match state.engine.readiness().await {
        Readiness::Ready => StatusCode::NO_CONTENT,
        Readiness::Uninitialized | Readiness::Failed(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn get_metrics(
    axum::extract::State(state): axum::extract::State<State>,
) -> impl IntoResponse {
    metrics::update_engine_metrics(&state.engine.readiness().await, &state.metrics);

    let encoder = prometheus::TextEncoder::new();
    match encoder.encode_to_string(&state.metrics_registry.gather()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        ),
        Err(err) => {
            tracing::error!(
                meta.signal_type = "log",
                event.domain = "geoservice",
                event.name = "Metrics error",
                name = "Metrics error",
                body = %err,
                error = true,
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                err.to_string(),
            )
        }
    }
}
