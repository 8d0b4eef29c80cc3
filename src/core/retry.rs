//! Bounded retry policies for transient failures
//!
//! Two profiles exist: one for carrier calls (timeouts, 5xx) and one for
//! store calls (connection loss, deadlock). A policy wraps exactly the single
//! call it guards, never the whole per-record pipeline, and only errors the
//! classifier deems transient consume attempts; terminal errors short-circuit
//! on the first attempt.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::core::errors::{EngineError, Result};

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_store_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

/// Configuration for one retry profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial delay (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Add random jitter
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default profile for transient store failures.
    pub fn store_default() -> Self {
        Self {
            base_delay_ms: default_store_base_delay_ms(),
            ..Self::default()
        }
    }
}

/// Retry mechanism with exponential backoff around a single guarded call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Execute `f`, re-attempting only while `is_transient` classifies the
    /// error as retryable and the attempt cap is not reached.
    pub async fn run<F, Fut, T, P>(&self, is_transient: P, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
        P: Fn(&EngineError) -> bool,
    {
        let mut attempt = 0;
        let mut delay = Duration::from_millis(self.config.base_delay_ms);

        loop {
            attempt += 1;

            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("retry succeeded on attempt {}", attempt);
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !is_transient(&err) {
                        return Err(err);
                    }
                    if attempt >= self.config.max_attempts {
                        error!("retry exhausted after {} attempts: {}", attempt, err);
                        return Err(err);
                    }

                    debug!(
                        "attempt {} failed: {}, retrying in {:?}",
                        attempt, err, delay
                    );

                    let actual_delay = if self.config.jitter {
                        let jitter_factor = 0.1;
                        let jitter = delay.as_millis() as f64
                            * jitter_factor
                            * (rand::random::<f64>() - 0.5);
                        Duration::from_millis((delay.as_millis() as f64 + jitter) as u64)
                    } else {
                        delay
                    };

                    tokio::time::sleep(actual_delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
                        ),
                        Duration::from_millis(self.config.max_delay_ms),
                    );
                }
            }
        }
    }
}

/// The two retry profiles the engine applies.
#[derive(Debug, Clone)]
pub struct RetryPolicies {
    network: RetryPolicy,
    store: RetryPolicy,
}

impl RetryPolicies {
    pub fn new(network: RetryConfig, store: RetryConfig) -> Self {
        Self {
            network: RetryPolicy::new(network),
            store: RetryPolicy::new(store),
        }
    }

    /// Guard a single carrier call.
    pub async fn network_call<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        self.network.run(EngineError::is_transient_network, f).await
    }

    /// Guard a single store call.
    pub async fn store_call<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        self.store.run(EngineError::is_transient_store, f).await
    }
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self::new(RetryConfig::default(), RetryConfig::store_default())
    }
}
