use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_core::mail::MailComposer;
use weather_core::mailer::Mailer;
use weather_core::store::WeatherStore;
use weather_db::PgWeatherStore;
use weather_events::{AppendLog, DryRunMailer, EmailConfig, SmtpMailer};
use weather_onionoo::cache::InMemoryDocumentCache;
use weather_onionoo::{OnionooClient, OnionooSource};
use weather_worker::{scheduler, Outbox, RunCoordinator, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_worker=debug,weather_onionoo=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env()?;
    tracing::info!(
        onionoo_url = %config.onionoo_url,
        pass_interval_secs = config.pass_interval.as_secs(),
        "Loaded worker configuration",
    );

    // --- Database ---
    let pool = weather_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    weather_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    weather_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    let store = Arc::new(PgWeatherStore::new(pool));
    let deployment_time = store
        .deployment_time(Utc::now())
        .await
        .context("Failed to load deployment time")?;
    tracing::info!(%deployment_time, "Deployment time loaded");

    // --- Relay source ---
    let cache = Arc::new(InMemoryDocumentCache::new(config.cache_ttl));
    let client = OnionooClient::new(&config.onionoo_url, config.source_timeout, cache);
    let source = Arc::new(OnionooSource::new(client));

    // --- Mail ---
    let mailer: Arc<dyn Mailer> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(host = %email_config.smtp_host, "SMTP delivery enabled");
            Arc::new(SmtpMailer::new(&email_config).context("Invalid SMTP configuration")?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, notification emails will only be logged");
            Arc::new(DryRunMailer)
        }
    };
    let outbox = Outbox::new(
        mailer,
        MailComposer::new(&config.base_url, &config.sender),
        AppendLog::new(&config.failed_email_log),
    );

    let coordinator = Arc::new(
        RunCoordinator::new(
            store,
            source,
            outbox,
            AppendLog::new(&config.unparsable_contact_log),
            deployment_time,
        )
        .with_source_timeout(config.source_timeout),
    );

    // --- Scheduler ---
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(scheduler::run(
        coordinator,
        config.pass_interval,
        cancel.clone(),
    ));

    shutdown_signal().await;
    cancel.cancel();
    handle.await.context("Scheduler task panicked")?;

    tracing::info!("Worker stopped");
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
