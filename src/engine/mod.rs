pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod judge;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod pool;
pub mod problems;
pub mod profiles;
pub mod sandbox;
pub mod sanitize;
pub mod service;
pub mod verdict;

#[cfg(test)]
pub(crate) mod testing;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;

use crate::engine::{
    api::routes, config::EngineConfig, executor::Executor, metrics::MetricsRegistry,
    pool::WorkerPool, problems::ProblemCatalog, profiles::ProfileTable, sandbox::SandboxFactory,
    service::CompilerService,
};

pub async fn run() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();
    init_tracing(&config);

    let profiles = Arc::new(ProfileTable::from_config(&config));
    let sandbox = SandboxFactory::from_config(&config).context("sandbox backend init failed")?;
    tracing::info!(
        backend = sandbox.name(),
        languages = ?profiles.ids(),
        "sandbox backend ready"
    );
    let executor = Arc::new(Executor::new(
        profiles,
        sandbox,
        config.workspace_root.clone(),
        config.max_output_bytes,
    ));

    let metrics = Arc::new(MetricsRegistry::new());
    let pool = WorkerPool::start(
        config.worker_count,
        config.queue_capacity,
        executor,
        metrics.clone(),
    );
    let service = CompilerService::new(
        pool.clone(),
        Arc::new(ProblemCatalog::builtin()),
        config.run_max_code_bytes,
        config.problem_max_code_bytes,
    );

    let app: Router = routes(service, metrics);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    let local = listener
        .local_addr()
        .unwrap_or(SocketAddr::from(([0, 0, 0, 0], 0)));
    tracing::info!(bind = %local, workers = pool.workers(), "judge engine ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    pool.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

fn init_tracing(config: &EngineConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .init();
}
