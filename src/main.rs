use std::sync::Arc;

use anyhow::Context;

use pingbox::config::app_config::load_config;
use pingbox::icmp_probe::prelude::*;
use pingbox::scheduler::{Recorder, Scheduler};
use pingbox::store::ResultStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app_config = load_config().context("Failed to load configuration")?;
    let config = &app_config.config;

    // Fail early on an unusable store; afterwards every unit opens its own connection.
    ResultStore::open(&config.database)
        .and_then(ResultStore::close)
        .with_context(|| format!("Cannot use store at {}", config.database.display()))?;

    let prober = PingCommand::new(app_config.probe_deadline())
        .with_program(&config.probe.program)
        .with_latency_markers(config.classifier.latency_markers.clone());
    let recorder = Recorder::new(
        config.database.clone(),
        Arc::new(prober),
        Arc::new(config.classifier.clone()),
    )
    .with_target_width(app_config.max_target_width);

    let scheduler = Scheduler::new(
        config.targets.clone(),
        app_config.pacing_interval(),
        recorder,
    );

    log::info!(
        "Dispatching a probe every {:?}",
        app_config.pacing_interval()
    );

    let dispatched = scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            log::info!("Shutting down");
        })
        .await;

    log::info!("Stopped after {dispatched} probes");
    Ok(())
}
