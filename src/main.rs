mod api;
mod config;
mod error;
mod evaluation;
mod harness;
mod judge;
mod language;
mod metrics;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::{
    api::AppState,
    config::{LogConfig, LogFormat, ServiceConfig},
    judge::{
        http::HttpJudgeClient,
        orchestrator::{Orchestrator, TokioSleeper},
    },
    metrics::MetricsRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ServiceConfig::from_env().context("failed to build service config")?;
    init_tracing(&cfg.log);

    let metrics = Arc::new(MetricsRegistry::new());
    let client = HttpJudgeClient::new(&cfg.judge).context("failed to build judge client")?;
    let orchestrator = Orchestrator::new(Arc::new(client), Arc::new(TokioSleeper), metrics.clone())
        .with_limits(cfg.judge.limits)
        .with_policies(cfg.polling.single, cfg.polling.batch);

    let app = api::routes(AppState::new(
        orchestrator,
        metrics,
        cfg.max_test_cases,
        cfg.max_source_bytes,
    ));

    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .context("failed to bind listener")?;

    tracing::info!(
        addr = %cfg.bind_addr,
        judge = %cfg.judge.base_url,
        "submission runner listening"
    );

    axum::serve(listener, app)
        .await
        .context("submission runner server error")?;

    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn", log.level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .init(),
    }
}
