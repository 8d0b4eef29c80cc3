//! Configuration management for the engine
//!
//! Handles loading, validation, and defaults for all engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

use crate::carriers::{
    CarrierRegistry, JasperClient, JasperConfig, TelegenceClient, TelegenceConfig,
    ThingSpaceClient, ThingSpaceConfig,
};
use crate::core::errors::{EngineError, Result};
use crate::core::retry::RetryConfig;
use std::sync::Arc;

fn default_page_size() -> u64 {
    200
}

fn default_time_budget_ms() -> u64 {
    840_000
}

fn default_cutoff_ms() -> u64 {
    45_000
}

fn default_max_retry_count() -> u32 {
    5
}

fn default_processed_by() -> String {
    "bulkchange-engine".to_string()
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30
}

/// Per-invocation worker tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Bounded page of unprocessed records loaded per invocation
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Total wall-clock budget granted to one invocation (milliseconds)
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,
    /// Reserve below which no new record is started (milliseconds)
    #[serde(default = "default_cutoff_ms")]
    pub cutoff_ms: u64,
    /// Continuations stop being emitted past this retry count
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
    /// Actor name stamped on processed records and jobs
    #[serde(default = "default_processed_by")]
    pub processed_by: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            time_budget_ms: default_time_budget_ms(),
            cutoff_ms: default_cutoff_ms(),
            max_retry_count: default_max_retry_count(),
            processed_by: default_processed_by(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

/// Per-integration carrier settings; absent integrations are unroutable and
/// fail closed at the router.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarriersConfig {
    #[serde(default)]
    pub jasper: Option<JasperConfig>,
    #[serde(default)]
    pub thingspace: Option<ThingSpaceConfig>,
    #[serde(default)]
    pub telegence: Option<TelegenceConfig>,
}

impl CarriersConfig {
    /// Build the carrier registry from the configured integrations.
    pub fn build_registry(&self) -> Result<CarrierRegistry> {
        let mut registry = CarrierRegistry::new();
        if let Some(jasper) = &self.jasper {
            registry.register(Arc::new(JasperClient::new(jasper.clone())?));
        }
        if let Some(thingspace) = &self.thingspace {
            registry.register(Arc::new(ThingSpaceClient::new(thingspace.clone())?));
        }
        if let Some(telegence) = &self.telegence {
            registry.register(Arc::new(TelegenceClient::new(telegence.clone())?));
        }
        Ok(registry)
    }
}

/// The two retry profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default)]
    pub network: RetryConfig,
    #[serde(default = "RetryConfig::store_default")]
    pub store: RetryConfig,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            network: RetryConfig::default(),
            store: RetryConfig::store_default(),
        }
    }
}

/// Engine configuration tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub carriers: CarriersConfig,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Main configuration struct for the engine.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {e}")))?;

        let engine: EngineConfig = serde_yaml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {e}")))?;

        let config = Self { engine };
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Build configuration from environment variables and defaults.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut engine = EngineConfig::default();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            engine.database.url = url;
        }

        let config = Self { engine };
        config.validate()?;
        Ok(config)
    }

    pub fn worker(&self) -> &WorkerConfig {
        &self.engine.worker
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.engine.database
    }

    pub fn carriers(&self) -> &CarriersConfig {
        &self.engine.carriers
    }

    pub fn retry(&self) -> &RetrySettings {
        &self.engine.retry
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        let worker = &self.engine.worker;
        if worker.page_size == 0 {
            return Err(EngineError::Config(
                "worker.page_size must be greater than zero".to_string(),
            ));
        }
        if worker.cutoff_ms >= worker.time_budget_ms {
            return Err(EngineError::Config(
                "worker.cutoff_ms must be below worker.time_budget_ms".to_string(),
            ));
        }
        if worker.processed_by.trim().is_empty() {
            return Err(EngineError::Config(
                "worker.processed_by must not be empty".to_string(),
            ));
        }

        if self.engine.database.url.trim().is_empty() {
            return Err(EngineError::Config(
                "database.url must not be empty".to_string(),
            ));
        }

        let carriers = &self.engine.carriers;
        for (name, base_url) in [
            ("jasper", carriers.jasper.as_ref().map(|c| &c.base_url)),
            (
                "thingspace",
                carriers.thingspace.as_ref().map(|c| &c.base_url),
            ),
            ("telegence", carriers.telegence.as_ref().map(|c| &c.base_url)),
        ] {
            if let Some(base_url) = base_url {
                Url::parse(base_url).map_err(|e| {
                    EngineError::Config(format!("carriers.{name}.base_url is invalid: {e}"))
                })?;
            }
        }

        debug!("Configuration validation completed");
        Ok(())
    }
}
