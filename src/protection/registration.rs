//! One-shot wallet registration with the protection service.

use std::time::Duration;

use alloy::primitives::Address;
use serde_json::json;

use crate::events::{EventKind, EventLog};
use crate::protection::types::{ProtectionError, RegisterRequest, RegisterResponse};

pub struct RegistrationClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistrationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProtectionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProtectionError::Registration(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send the registration request.
    pub async fn register(&self, address: Address) -> Result<RegisterResponse, ProtectionError> {
        let resp = self
            .http
            .post(format!("{}/register-wallet", self.base_url))
            .json(&RegisterRequest { address })
            .send()
            .await
            .map_err(|e| ProtectionError::Registration(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProtectionError::Registration(e.to_string()))?;

        if !status.is_success() {
            return Err(ProtectionError::Registration(format!(
                "service returned status {}: {}",
                status, text
            )));
        }

        let body: RegisterResponse = serde_json::from_str(&text)
            .map_err(|e| ProtectionError::Registration(format!("unexpected body: {}", e)))?;

        if !body.success {
            return Err(ProtectionError::Registration("service reported failure".to_string()));
        }

        Ok(body)
    }

    /// Register once and record the result. Failures are logged, not retried.
    pub async fn register_session(&self, address: Address, events: &EventLog) -> bool {
        match self.register(address).await {
            Ok(body) => {
                tracing::info!(address = %address, "Wallet registered for protection");
                events.append(
                    EventKind::WalletRegistered,
                    "Wallet registered for protection",
                    Some(json!({ "address": body.address.unwrap_or_else(|| address.to_string()) })),
                );
                true
            }
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Error registering wallet");
                false
            }
        }
    }
}

impl std::fmt::Debug for RegistrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
