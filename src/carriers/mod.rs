//! Carrier API clients
//!
//! One client per external carrier system, all behind the same operation
//! contract so change handlers stay carrier-agnostic. Responses are
//! classified here: 2xx succeeds, 408/429/5xx is transient, anything else is
//! a terminal business rejection.

pub mod jasper;
pub mod telegence;
pub mod thingspace;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::{EngineError, Result};
use crate::core::types::{
    CarrierRatePlanChange, ChangeType, CustomerAssociationChange, Device, IdentifierSwapChange,
    Integration, StatusUpdateChange, UsernameUpdateChange,
};

pub use jasper::{JasperClient, JasperConfig};
pub use telegence::{TelegenceClient, TelegenceConfig};
pub use thingspace::{ThingSpaceClient, ThingSpaceConfig};

/// Session credentials resolved once per job invocation and passed down to
/// every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarrierSession {
    pub access_token: Option<String>,
    pub session_token: Option<String>,
}

impl CarrierSession {
    /// Session placeholder used when no carrier client is configured; any
    /// routed record will fail closed before the session is consulted.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Request/response capture of one successful carrier operation, recorded
/// verbatim in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierCall {
    pub action: String,
    pub request_text: String,
    pub response_text: String,
    pub status: String,
}

/// Uniform operation contract implemented by every carrier client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CarrierClient: Send + Sync {
    fn integration(&self) -> Integration;

    /// Change kinds this carrier can execute; handlers are registered only
    /// for these, so anything else fails closed at the router.
    fn supported_changes(&self) -> &'static [ChangeType];

    /// Whether carrier-side writes are enabled for this service provider.
    fn write_enabled(&self) -> bool;

    /// Acquire session credentials. Failures here are job-level: the batch
    /// aborts without touching any record.
    async fn authenticate(&self) -> Result<CarrierSession>;

    async fn update_status(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &StatusUpdateChange,
    ) -> Result<CarrierCall>;

    async fn swap_identifier(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &IdentifierSwapChange,
    ) -> Result<CarrierCall>;

    async fn update_rate_plan(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &CarrierRatePlanChange,
    ) -> Result<CarrierCall>;

    async fn update_username(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &UsernameUpdateChange,
    ) -> Result<CarrierCall>;

    async fn associate_customer(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &CustomerAssociationChange,
    ) -> Result<CarrierCall>;
}

/// Lookup from integration to its configured client.
#[derive(Clone, Default)]
pub struct CarrierRegistry {
    clients: HashMap<Integration, Arc<dyn CarrierClient>>,
}

impl CarrierRegistry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    pub fn register(&mut self, client: Arc<dyn CarrierClient>) {
        self.clients.insert(client.integration(), client);
    }

    pub fn get(&self, integration: Integration) -> Option<Arc<dyn CarrierClient>> {
        self.clients.get(&integration).cloned()
    }

    pub fn clients(&self) -> impl Iterator<Item = &Arc<dyn CarrierClient>> {
        self.clients.values()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for CarrierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierRegistry")
            .field("integrations", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Read a carrier response and classify it into success, transient failure,
/// or terminal rejection.
pub(crate) async fn classify_response(
    action: &str,
    request_text: String,
    response: reqwest::Response,
) -> Result<CarrierCall> {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read response body".to_string());

    if status.is_success() {
        return Ok(CarrierCall {
            action: action.to_string(),
            request_text,
            response_text: body,
            status: status.to_string(),
        });
    }

    if status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error() {
        return Err(EngineError::TransientNetwork(format!(
            "{action} failed with {status}: {body}"
        )));
    }

    Err(EngineError::CarrierRejected(format!(
        "{action} rejected with {status}: {body}"
    )))
}

/// Map a reqwest send error onto the engine taxonomy.
pub(crate) fn send_error(action: &str, err: reqwest::Error) -> EngineError {
    if err.is_timeout() || err.is_connect() {
        EngineError::TransientNetwork(format!("{action} failed: {err}"))
    } else {
        EngineError::HttpClient(err)
    }
}
