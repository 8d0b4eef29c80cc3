//! Verizon ThingSpace client
//!
//! ThingSpace authenticates in two steps: an OAuth access token from the
//! token endpoint, then an M2M session token from the session login
//! endpoint. Both are carried on every subsequent call.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::debug;

use crate::carriers::{CarrierCall, CarrierClient, CarrierSession, classify_response, send_error};
use crate::core::errors::{EngineError, Result};
use crate::core::types::{
    CarrierRatePlanChange, ChangeType, CustomerAssociationChange, Device, IdentifierKind,
    IdentifierSwapChange, Integration, StatusUpdateChange, UsernameUpdateChange,
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

/// ThingSpace connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThingSpaceConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default = "default_true")]
    pub write_enabled: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for ThingSpaceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            account_name: None,
            write_enabled: true,
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// ThingSpace REST API client.
#[derive(Debug, Clone)]
pub struct ThingSpaceClient {
    config: ThingSpaceConfig,
    http_client: Client,
}

impl ThingSpaceClient {
    pub fn new(config: ThingSpaceConfig) -> Result<Self> {
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

    /// Changes ThingSpace can execute. Username pushes have no API surface.
    pub const SUPPORTED_CHANGES: &'static [ChangeType] = &[
        ChangeType::StatusUpdate,
        ChangeType::IdentifierSwap,
        ChangeType::CarrierRatePlan,
        ChangeType::CustomerRatePlan,
    ];

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn fetch_access_token(&self) -> Result<String> {
        let credential = BASE64.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        let response = self
            .http_client
            .post(self.url("/api/ts/v1/tokens"))
            .header("Authorization", format!("Basic {credential}"))
            .form(&[("grant_type", "client_credentials")])
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
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::Authentication("token response missing access_token".to_string())
            })
    }

    async fn fetch_session_token(&self, access_token: &str) -> Result<String> {
        let response = self
            .http_client
            .post(self.url("/api/m2m/v1/session/login"))
            .header("Authorization", format!("Bearer {access_token}"))
            .json(&json!({
                "username": self.config.username,
                "password": self.config.password,
            }))
            .send()
            .await
            .map_err(|e| {
                EngineError::Authentication(format!("unable to get session token: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(EngineError::Authentication(format!(
                "session login returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            EngineError::Authentication(format!("malformed session response: {e}"))
        })?;
        body["sessionToken"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::Authentication("session response missing sessionToken".to_string())
            })
    }

    async fn send(
        &self,
        session: &CarrierSession,
        action: &str,
        method: reqwest::Method,
        path: &str,
        body: Value,
    ) -> Result<CarrierCall> {
        let url = self.url(path);
        let request_text = body.to_string();
        debug!(action, %url, "sending thingspace request");

        let access_token = session.access_token.as_deref().unwrap_or_default();
        let session_token = session.session_token.as_deref().unwrap_or_default();

        let response = timeout(
            Duration::from_secs(self.config.request_timeout),
            self.http_client
                .request(method, &url)
                .header("Authorization", format!("Bearer {access_token}"))
                .header("VZ-M2M-Token", session_token)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| EngineError::TransientNetwork(format!("{action} timed out")))?
        .map_err(|e| send_error(action, e))?;

        classify_response(action, request_text, response).await
    }

    fn device_id_body(device: &Device) -> Value {
        json!({
            "deviceIds": [{
                "id": device.iccid,
                "kind": "iccid",
            }],
        })
    }
}

#[async_trait]
impl CarrierClient for ThingSpaceClient {
    fn integration(&self) -> Integration {
        Integration::ThingSpace
    }

    fn supported_changes(&self) -> &'static [ChangeType] {
        Self::SUPPORTED_CHANGES
    }

    fn write_enabled(&self) -> bool {
        self.config.write_enabled
    }

    async fn authenticate(&self) -> Result<CarrierSession> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(EngineError::Authentication(
                "thingspace credentials are not configured".to_string(),
            ));
        }

        let access_token = self.fetch_access_token().await?;
        let session_token = self.fetch_session_token(&access_token).await?;
        Ok(CarrierSession {
            access_token: Some(access_token),
            session_token: Some(session_token),
        })
    }

    async fn update_status(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &StatusUpdateChange,
    ) -> Result<CarrierCall> {
        let mut body = Self::device_id_body(device);
        if let Some(account) = &self.config.account_name {
            body["accountName"] = json!(account);
        }
        if change.is_activation() {
            body["servicePlan"] = json!(change.rate_plan_code);
        }

        let path = match change.target_status.to_ascii_lowercase().as_str() {
            "active" | "activate" => "/api/m2m/v1/devices/actions/activate",
            "suspend" | "suspended" => "/api/m2m/v1/devices/actions/suspend",
            "restore" | "restored" => "/api/m2m/v1/devices/actions/restore",
            _ => "/api/m2m/v1/devices/actions/deactivate",
        };

        self.send(
            session,
            "thingspace status update",
            reqwest::Method::POST,
            path,
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
        let mut body = Self::device_id_body(device);
        let kind = match change.identifier_type {
            IdentifierKind::Iccid => "iccid",
            IdentifierKind::Imei => "imei",
            other => {
                return Err(EngineError::Validation(format!(
                    "thingspace cannot swap {other} identifiers"
                )));
            }
        };
        body["deviceIdsTo"] = json!([{
            "id": change.new_value(),
            "kind": kind,
        }]);

        self.send(
            session,
            "thingspace identifier update",
            reqwest::Method::PUT,
            "/api/m2m/v1/devices/actions/update/deviceid",
            body,
        )
        .await
    }

    async fn update_rate_plan(
        &self,
        session: &CarrierSession,
        device: &Device,
        change: &CarrierRatePlanChange,
    ) -> Result<CarrierCall> {
        let mut body = Self::device_id_body(device);
        body["servicePlan"] = json!(change.carrier_rate_plan);

        self.send(
            session,
            "thingspace rate plan update",
            reqwest::Method::PUT,
            "/api/m2m/v1/devices/actions/update/serviceplan",
            body,
        )
        .await
    }

    async fn update_username(
        &self,
        _session: &CarrierSession,
        _device: &Device,
        _change: &UsernameUpdateChange,
    ) -> Result<CarrierCall> {
        Err(EngineError::UnsupportedOperation {
            change_type: ChangeType::UsernameUpdate,
            integration: Integration::ThingSpace,
        })
    }

    async fn associate_customer(
        &self,
        _session: &CarrierSession,
        _device: &Device,
        _change: &CustomerAssociationChange,
    ) -> Result<CarrierCall> {
        Err(EngineError::UnsupportedOperation {
            change_type: ChangeType::CustomerAssociation,
            integration: Integration::ThingSpace,
        })
    }
}
