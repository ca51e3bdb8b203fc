use std::error::Error;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use subs::adapters::{LoggingPublisher, OutboxWorker, PostgresSubscriptionRepository, TracingObserver};
use subs::config::{AppConfig, TelemetryConfig};
use subs::ports::PersistenceObserver;

fn init_tracing(telemetry: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if telemetry.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.telemetry);

    let pool = config.database.connect().await?;
    let observer: Arc<dyn PersistenceObserver> = Arc::new(TracingObserver::new());
    let repository = Arc::new(
        PostgresSubscriptionRepository::new(pool)
            .with_retry_policy(config.retry.policy())
            .with_observer(observer.clone()),
    );

    if config.database.run_migrations {
        repository.migrate().await?;
    }

    let cancel = CancellationToken::new();
    let worker = if config.outbox.enabled {
        let worker = OutboxWorker::with_config(
            repository.clone(),
            Arc::new(LoggingPublisher::new()),
            config.outbox.worker_config(),
        )
        .with_observer(observer);
        let token = cancel.clone();
        Some(tokio::spawn(async move { worker.run(token).await }))
    } else {
        None
    };

    tracing::info!(outbox = config.outbox.enabled, "subs started");

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "unable to listen for shutdown signal"),
    }
    cancel.cancel();

    if let Some(handle) = worker {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "outbox worker terminated abnormally");
        }
    }

    tracing::info!("subs stopped");
    Ok(())
}
