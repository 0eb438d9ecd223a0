use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use geoservice_duckdb::{routes, state};
use geoservice_duckdb_configuration::environment::ProcessEnvironment;
use geoservice_duckdb_configuration::{make_runtime_configuration, parse_configuration};
use query_engine_execution::duckdb::DuckDbEngine;
use query_engine_execution::engine::{Engine, EngineError, EngineHandle};

#[derive(Parser)]
#[command(about = "Serve geoservice queries over parquet files with DuckDB")]
struct ServerOptions {
    /// Directory holding configuration.json.
    #[arg(long, env = "GEOSERVICE_CONFIGURATION", default_value = ".")]
    configuration: PathBuf,
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    /// Used when RUST_LOG is not set.
    #[arg(long, env = "GEOSERVICE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = ServerOptions::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let parsed = parse_configuration(&options.configuration).await?;
    let configuration = make_runtime_configuration(parsed, ProcessEnvironment)?;
    let extensions = configuration.engine.extensions.clone();

    let state = state::create_state(configuration, EngineHandle::uninitialized()).await?;
    state.engine.initialize(async move {
        let engine = DuckDbEngine::initialize(extensions).await?;
        Ok::<_, EngineError>(Arc::new(engine) as Arc<dyn Engine>)
    });

    let router = routes::create_router(state);
    let address = SocketAddr::from(([0, 0, 0, 0], options.port));
    tracing::info!(%address, "Starting server");

    axum::Server::bind(&address)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}
