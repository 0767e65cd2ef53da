use crate::{Result, TestInfraError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use typed_builder::TypedBuilder;

const PORT: u16 = 5432;
const READY_LINE: &str = "database system is ready to accept connections";

/// Settings for a throwaway Postgres instance.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresConfig {
    #[builder(default = "16-alpine".to_string(), setter(into))]
    tag: String,
    #[builder(default = "linkway".to_string(), setter(into))]
    database: String,
    #[builder(default = "linkway".to_string(), setter(into))]
    user: String,
    #[builder(default = "linkway".to_string(), setter(into))]
    password: String,
    /// Connection attempts made by [`PostgresServer::pool`].
    #[builder(default = 20)]
    connect_attempts: u32,
    #[builder(default = Duration::from_millis(250))]
    connect_backoff: Duration,
}

/// A Postgres container that lives as long as this value.
pub struct PostgresServer {
    _container: ContainerAsync<GenericImage>,
    url: String,
    config: PostgresConfig,
}

impl PostgresServer {
    pub async fn start(config: PostgresConfig) -> Result<Self> {
        let container = GenericImage::new("postgres", config.tag.as_str())
            .with_exposed_port(PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_LINE))
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_env_var("POSTGRES_USER", config.user.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .start()
            .await?;

        let host = match container.get_host().await?.to_string().as_str() {
            "localhost" => "127.0.0.1".to_string(),
            other => other.to_string(),
        };
        let port = container.get_host_port_ipv4(PORT).await?;
        let url = format!(
            "postgres://{}:{}@{host}:{port}/{}",
            config.user, config.password, config.database
        );

        Ok(Self {
            _container: container,
            url,
            config,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens a pool, retrying while the server finishes starting up.
    ///
    /// The image's init script runs a temporary server that prints the ready
    /// line before the real one is up, so the first attempts can be refused.
    pub async fn pool(&self) -> Result<PgPool> {
        let mut attempt = 1;
        loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .connect(&self.url)
                .await
            {
                Ok(pool) => return Ok(pool),
                Err(source) if attempt >= self.config.connect_attempts => {
                    return Err(TestInfraError::Connect {
                        attempts: attempt,
                        source,
                    })
                }
                Err(_) => {
                    attempt += 1;
                    tokio::time::sleep(self.config.connect_backoff).await;
                }
            }
        }
    }
}
