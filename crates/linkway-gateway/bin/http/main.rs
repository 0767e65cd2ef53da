mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use linkway_core::{Repository, ShortCode, Shortener};
use linkway_gateway::{App, AppState};
use linkway_generator::{RandomGenerator, SeqGenerator};
use linkway_redirector::RedirectorService;
use linkway_shortener::{ShortenerService, ShortenerSettings};
use linkway_storage::{InMemoryRepository, PostgresRepository};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::{Cli, GeneratorArg, StorageBackendArg};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();

    let _telemetry =
        linkway_telemetry::init(config.telemetry_config()).context("failed to set up tracing")?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        generator = %config.generator,
        "starting linkway"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run_server(&config, Arc::new(InMemoryRepository::new()), None).await
        }
        StorageBackendArg::Postgres => {
            let dsn = config
                .postgres_dsn
                .as_deref()
                .context("postgres dsn is required when storage backend is postgres")?;
            let repository = PostgresRepository::connect(dsn)
                .await
                .context("failed to open postgres link store")?;

            // The sequential counter is not persisted; continue after the
            // highest code a previous run stored.
            let last_issued = match config.generator {
                GeneratorArg::Sequential => repository
                    .last_in_sequence(&config.generator_prefix)
                    .await
                    .context("failed to find the last sequential code")?,
                GeneratorArg::Random => None,
            };
            run_server(&config, Arc::new(repository), last_issued).await
        }
    }
}

async fn run_server<R: Repository>(
    config: &Cli,
    repository: Arc<R>,
    last_issued: Option<ShortCode>,
) -> anyhow::Result<()> {
    let settings = ShortenerSettings::builder()
        .base_url(config.base_url.clone())
        .max_attempts(config.max_attempts)
        .build();

    let redirector = RedirectorService::new(Arc::clone(&repository));
    let shortener: Arc<dyn Shortener> = match config.generator {
        GeneratorArg::Random => Arc::new(ShortenerService::new(
            repository,
            RandomGenerator::new(config.code_length)?,
            settings,
        )),
        GeneratorArg::Sequential => {
            let prefix = config.generator_prefix.clone();
            let generator = match &last_issued {
                Some(last) => {
                    info!(last = %last, "resuming code sequence");
                    SeqGenerator::resume_after(prefix, last)?
                }
                None => SeqGenerator::with_prefix(prefix)?,
            };
            Arc::new(ShortenerService::new(repository, generator, settings))
        }
    };

    let state = AppState::new(shortener, Arc::new(redirector), config.base_url.clone());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
