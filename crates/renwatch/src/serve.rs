// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `renwatch serve` command implementation.
//!
//! Opens the repository, builds the Riot, translation and Discord adapters,
//! then runs the delivery workers, the producer and the retention sweeper
//! until a shutdown signal arrives.
//!
//! The binary has no chat command intake: it never builds a `CommandService`
//! or a `SlidingWindowLimiter`, so subscriptions must be written to the
//! repository from outside this process.

use std::sync::Arc;

use renwatch_agent::{Deliverer, InFlight, Lifecycle, Producer, install_signal_handler, queue};
use renwatch_anthropic::AnthropicTranslator;
use renwatch_cache::{GameStateCache, TranslationCache};
use renwatch_config::model::{
    RenwatchConfig, StorageBackend, StorageConfig, TranslationProvider,
};
use renwatch_core::{
    Clock, GameStateProvider, HealthStatus, MessageServer, PluginAdapter, RenwatchError,
    Repository, SystemClock, Translator,
};
use renwatch_cron::RetentionSweeper;
use renwatch_discord::DiscordMessageServer;
use renwatch_gemini::GeminiTranslator;
use renwatch_postgres::PostgresRepository;
use renwatch_riot::RiotProvider;
use renwatch_storage::SqliteRepository;
use tracing::{info, warn};

/// Run the service until SIGINT/SIGTERM, then drain and close.
pub async fn run_serve(config: RenwatchConfig) -> Result<(), RenwatchError> {
    init_tracing(&config.bot.log_level);
    info!("starting renwatch serve");

    let repo = open_repository(&config.storage).await?;

    let game_state: Arc<dyn GameStateProvider> = Arc::new(RiotProvider::new(&config.riot)?);
    let discord = Arc::new(DiscordMessageServer::new(&config.discord)?);
    match discord.health_check().await {
        Ok(HealthStatus::Healthy) => info!("discord credentials verified"),
        Ok(status) => warn!(?status, "discord health check did not pass"),
        Err(e) => warn!(error = %e, "discord health check failed; continuing"),
    }
    let messages: Arc<dyn MessageServer> = discord;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let translator: Arc<dyn Translator> = Arc::new(TranslationCache::new(
        repo.clone(),
        open_translator(&config)?,
        clock.clone(),
    ));
    let cache = Arc::new(GameStateCache::new(
        repo.clone(),
        game_state.clone(),
        clock.clone(),
        &config.cache,
    ));
    let in_flight = Arc::new(InFlight::new());
    let (tx, rx) = queue(config.delivery.queue_capacity);

    let cancel = install_signal_handler();
    let mut lifecycle = Lifecycle::new();

    let deliverer = Deliverer::new(
        repo.clone(),
        messages.clone(),
        clock.clone(),
        in_flight.clone(),
        config.delivery.send_timeout(),
    );
    for worker_id in 0..config.delivery.workers {
        lifecycle.spawn(
            format!("delivery-worker-{worker_id}"),
            deliverer.clone().run_worker(worker_id, rx.clone()),
        );
    }
    drop(rx);

    let producer = Arc::new(Producer::new(
        repo.clone(),
        cache,
        translator.clone(),
        in_flight,
        config.poller.clone(),
        config.delivery.offer_timeout(),
    ));
    lifecycle.spawn("producer", producer.run(tx, cancel.clone()));

    let sweeper = Arc::new(RetentionSweeper::new(
        repo.clone(),
        clock,
        config.retention.clone(),
    ));
    lifecycle.spawn("retention-sweeper", sweeper.run(cancel.clone()));

    info!(
        workers = config.delivery.workers,
        queue_capacity = config.delivery.queue_capacity,
        interval_secs = config.poller.interval_secs,
        "renwatch running"
    );

    cancel.cancelled().await;
    info!("shutdown requested; draining background tasks");

    let report = lifecycle.shutdown(config.delivery.shutdown_grace()).await;
    if report.is_clean() {
        info!(completed = report.completed.len(), "background tasks stopped");
    } else {
        warn!(
            completed = report.completed.len(),
            aborted = ?report.aborted,
            panicked = ?report.panicked,
            "background tasks did not all stop cleanly"
        );
    }

    close_adapters(&messages, &translator, &game_state).await;
    repo.shutdown().await?;

    info!("renwatch serve shutdown complete");
    Ok(())
}

/// Shut down every collaborator adapter. Failures are logged, not returned.
async fn close_adapters(
    messages: &Arc<dyn MessageServer>,
    translator: &Arc<dyn Translator>,
    game_state: &Arc<dyn GameStateProvider>,
) {
    if let Err(e) = messages.shutdown().await {
        warn!(adapter = messages.name(), error = %e, "adapter shutdown failed");
    }
    if let Err(e) = translator.shutdown().await {
        warn!(adapter = translator.name(), error = %e, "adapter shutdown failed");
    }
    if let Err(e) = game_state.shutdown().await {
        warn!(adapter = game_state.name(), error = %e, "adapter shutdown failed");
    }
}

/// Build the LLM backend named by `translation.provider`.
fn open_translator(config: &RenwatchConfig) -> Result<Arc<dyn Translator>, RenwatchError> {
    let translator: Arc<dyn Translator> = match config.translation.provider {
        TranslationProvider::Anthropic => Arc::new(AnthropicTranslator::new(&config.anthropic)?),
        TranslationProvider::Gemini => Arc::new(GeminiTranslator::new(&config.gemini)?),
    };
    info!(
        provider = translator.name(),
        model = translator.model(),
        "translator ready"
    );
    Ok(translator)
}

/// Open the configured backend and confirm it answers.
async fn open_repository(config: &StorageConfig) -> Result<Arc<dyn Repository>, RenwatchError> {
    let repo: Arc<dyn Repository> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteRepository::open(config).await?),
        StorageBackend::Postgres => Arc::new(PostgresRepository::connect(config).await?),
    };

    match repo.health_check().await? {
        HealthStatus::Healthy => {
            info!(backend = repo.name(), "repository ready");
            Ok(repo)
        }
        HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
            Err(RenwatchError::Storage {
                source: reason.into(),
            })
        }
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("renwatch={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
