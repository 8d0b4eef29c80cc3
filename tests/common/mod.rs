//! Common test utilities for bulkchange-rs
//!
//! Shared infrastructure for the integration tests: an in-memory store, a
//! scriptable carrier, data factories and collecting queue sinks.

pub mod fixtures;
pub mod memory_store;

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use bulkchange_rs::carriers::CarrierRegistry;
use bulkchange_rs::config::WorkerConfig;
use bulkchange_rs::core::retry::RetryConfig;
use bulkchange_rs::queue::{ContinuationMessage, ContinuationSink, JobSummaryEvent, SummarySink};
use bulkchange_rs::{Engine, RetryPolicies};

pub use carriers::ScriptedCarrier;
pub use memory_store::InMemoryStore;

/// Queue sink that collects outbound payloads for assertions.
#[derive(Default)]
pub struct CollectingSink {
    pub continuations: Mutex<Vec<ContinuationMessage>>,
    pub summaries: Mutex<Vec<JobSummaryEvent>>,
}

#[async_trait]
impl ContinuationSink for CollectingSink {
    async fn enqueue(&self, message: &ContinuationMessage) -> bulkchange_rs::Result<()> {
        self.continuations.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[async_trait]
impl SummarySink for CollectingSink {
    async fn publish(&self, event: &JobSummaryEvent) -> bulkchange_rs::Result<()> {
        self.summaries.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Everything an integration test needs to drive the engine.
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub carrier: Arc<ScriptedCarrier>,
    pub sink: Arc<CollectingSink>,
    pub engine: Engine,
}

/// Worker config tuned for tests: small pages, generous budget, no waiting.
pub fn fast_worker() -> WorkerConfig {
    WorkerConfig {
        page_size: 10,
        time_budget_ms: 60_000,
        cutoff_ms: 10,
        max_retry_count: 5,
        processed_by: "engine-test".to_string(),
    }
}

fn fast_retries() -> RetryPolicies {
    let profile = RetryConfig {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 2,
        backoff_multiplier: 2.0,
        jitter: false,
    };
    RetryPolicies::new(profile.clone(), profile)
}

/// Build an engine over a fresh in-memory store and the given carrier.
pub fn harness(carrier: ScriptedCarrier, worker: WorkerConfig) -> TestHarness {
    let store = Arc::new(InMemoryStore::new());
    let carrier = Arc::new(carrier);
    let sink = Arc::new(CollectingSink::default());

    let mut registry = CarrierRegistry::new();
    registry.register(carrier.clone());

    let engine = Engine::new(
        store.clone(),
        registry,
        sink.clone(),
        sink.clone(),
        worker,
        fast_retries(),
    );

    TestHarness {
        store,
        carrier,
        sink,
        engine,
    }
}

/// Build an engine with no carrier registered at all.
pub fn harness_without_carrier(worker: WorkerConfig) -> (Arc<InMemoryStore>, Arc<CollectingSink>, Engine) {
    let store = Arc::new(InMemoryStore::new());
    let sink = Arc::new(CollectingSink::default());
    let engine = Engine::new(
        store.clone(),
        CarrierRegistry::new(),
        sink.clone(),
        sink.clone(),
        worker,
        fast_retries(),
    );
    (store, sink, engine)
}
