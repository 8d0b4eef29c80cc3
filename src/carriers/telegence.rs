//! AT&T Telegence client
//!
//! Telegence uses a bearer token from a client-credentials grant and PATCH
//! semantics on service endpoints keyed by subscriber number.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::debug;

use crate::carriers::{CarrierCall, CarrierClient, CarrierSession, classify_response, send_error};
use crate::core::errors::{EngineError, Result};
use crate::core::types::{
    CarrierRatePlanChange, ChangeType, CustomerAssociationChange, Device, IdentifierSwapChange,
    Integration, StatusUpdateChange, UsernameUpdateChange,
};

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

/// Telegence connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegenceConfig {
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
    #[serde(default = "default_true")]
    pub write_enabled: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for TelegenceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            app_id: String::new(),
            app_secret: String::new(),
            write_enabled: true,
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Telegence REST API client.
#[derive(Debug, Clone)]
pub struct TelegenceClient {
    config: TelegenceConfig,
    http_client: Client,
}

impl TelegenceClient {
    pub fn new(config: TelegenceConfig) -> Result<Self> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| EngineError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Changes Telegence can execute. Carrier rate plans move through its
    /// offer management flow, which this engine does not drive.
    pub const SUPPORTED_CHANGES: &'static [ChangeType] = &[
        ChangeType::StatusUpdate,
        ChangeType::IdentifierSwap,
        ChangeType::CustomerRatePlan,
        ChangeType::UsernameUpdate,
        ChangeType::CustomerAssociation,
    ];

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn subscriber<'a>(&self, device: &'a Device) -> &'a str {
        device
            .msisdn
            .as_deref()
            .or(device.iccid.as_deref())
            .unwrap_or_default()
    }

    async fn send_patch(
        &self,
        session: &CarrierSession,
        action: &str,
        path: &str,
        body: Value,
    ) -> Result<CarrierCall> {
        let url = self.url(path);
        let request_text = body.to_string();
        debug!(action, %url, "sending telegence request");

        let token = session.access_token.as_deref().unwrap_or_default();
        let response = timeout(
            Duration::from_secs(self.config.request_timeout),
            self.http_client
                .patch(&url)
                .header("Authorization", format!("Bearer {token}"))
                .header("app-id", &self.config.app_id)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| EngineError::TransientNetwork(format!("{action} timed out")))?
        .map_err(|e| send_error(action, e))?;

        classify_response(action, request_text, response).await
    }
}

#[async_trait]
impl CarrierClient for TelegenceClient {
    fn integration(&self) -> Integration {
        Integration::Telegence
    }

    fn supported_changes(&self) -> &'static [ChangeType] {
        Self::SUPPORTED_CHANGES
    }

    fn write_enabled(&self) -> bool {
        self.config.write_enabled
    }

    async fn authenticate(&self) -> Result<CarrierSession> {
        if self.config.app_id.is_empty() || self.config.app_secret.is_empty() {
            return Err(EngineError::Authentication(
                "telegence credentials are not configured".to_string(),
            ));
        }

        let response = self
            .http_client
            .post(self.url("/oauth/v4/token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.app_id.as_str()),
                ("client_secret", self.config.app_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| EngineError::Authentication(format!("unable to get access token: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::Authentication(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EngineError::Authentication(format!("malformed token response: {e}")))?;
        let token = body["access_token"].as_str().ok_or_else(|| {
            EngineError::Authentication("token response missing access_token".to_string())
        })?;

        Ok(CarrierSession {
            access_token: Some(token.to_string()),
            session_token: None,
        })
    }

    async fn update_status(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &StatusUpdateChange,
    ) -> Result<CarrierCall> {
        let subscriber = self.subscriber(device);
        let body = json!({
            "serviceStatus": change.target_status,
            "servicePlan": change.rate_plan_code,
        });
        self.send_patch(
            session,
            "telegence status update",
            &format!("/sp/service/v1/subscribers/{subscriber}"),
            body,
        )
        .await
    }

    async fn swap_identifier(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &IdentifierSwapChange,
    ) -> Result<CarrierCall> {
        let subscriber = self.subscriber(device);
        let body = json!({
            "equipment": {
                "identifierType": change.identifier_type.as_str(),
                "oldValue": change.old_value(),
                "newValue": change.new_value(),
            },
        });
        self.send_patch(
            session,
            "telegence equipment change",
            &format!("/sp/service/v1/subscribers/{subscriber}/equipment"),
            body,
        )
        .await
    }

    async fn update_rate_plan(
        &self,
        _session: &CarrierSession,
        _device: &Device,
        _change: &CarrierRatePlanChange,
    ) -> Result<CarrierCall> {
        Err(EngineError::UnsupportedOperation {
            change_type: ChangeType::CarrierRatePlan,
            integration: Integration::Telegence,
        })
    }

    async fn update_username(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &UsernameUpdateChange,
    ) -> Result<CarrierCall> {
        let subscriber = self.subscriber(device);
        let body = json!({
            "subscriberName": change.contact_name,
            "costCenters": [
                change.cost_center_1,
                change.cost_center_2,
                change.cost_center_3,
            ],
        });
        self.send_patch(
            session,
            "telegence username update",
            &format!("/sp/service/v1/subscribers/{subscriber}/profile"),
            body,
        )
        .await
    }

    async fn associate_customer(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &CustomerAssociationChange,
    ) -> Result<CarrierCall> {
        let subscriber = self.subscriber(device);
        let body = json!({
            "billingAccount": change.customer_ref,
            "siteId": change.site_id,
        });
        self.send_patch(
            session,
            "telegence customer association",
            &format!("/sp/service/v1/subscribers/{subscriber}/account"),
            body,
        )
        .await
    }
}
