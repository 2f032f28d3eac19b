/// Entitlement backend client
///
/// Supplies raw entitlement facts for status derivation and accepts
/// best-effort usage mirrors for cross-device continuity. Mirror failures are
/// logged by the caller and never block the local gating decision.
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::{
    entitlement::quota::UsageCounter,
    error::{AppError, AppResult},
};

/// Raw entitlement facts for one user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementSnapshot {
    /// Identifiers of entitlements that are active right now
    #[serde(default)]
    pub active_entitlements: Vec<String>,
    /// Every entitlement ever attached to the user
    #[serde(default)]
    pub all_entitlements: Vec<EntitlementRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementRecord {
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_purchase_date: Option<DateTime<Utc>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EntitlementBackend: Send + Sync {
    async fn fetch_entitlements(&self, user_id: &str) -> AppResult<EntitlementSnapshot>;

    /// Mirrors the local counter; callers treat failures as non-fatal
    async fn mirror_usage(&self, user_id: &str, counter: &UsageCounter) -> AppResult<()>;
}

#[derive(Clone)]
pub struct HttpEntitlementBackend {
    http_client: HttpClient,
    api_url: String,
}

impl HttpEntitlementBackend {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl EntitlementBackend for HttpEntitlementBackend {
    async fn fetch_entitlements(&self, user_id: &str) -> AppResult<EntitlementSnapshot> {
        let url = format!("{}/users/{}/entitlements", self.api_url, user_id);
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Entitlement backend returned status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn mirror_usage(&self, user_id: &str, counter: &UsageCounter) -> AppResult<()> {
        let url = format!("{}/users/{}/usage", self.api_url, user_id);
        let response = self
            .http_client
            .post(&url)
            .json(&json!({
                "period_key": counter.period_key,
                "count": counter.count,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Usage mirror returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
