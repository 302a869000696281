//! HTTP client for the platform's vehicle-profile lookup service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use vehiclehub_core::config::lookup::LookupConfig;
use vehiclehub_core::error::AppError;
use vehiclehub_core::result::AppResult;
use vehiclehub_core::traits::ProfileSource;
use vehiclehub_core::types::VehicleProfile;

/// Response envelope of `GET {url}?{device_id_param}={client_id}`.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[allow(dead_code)]
    message: Option<String>,
    data: Option<VehicleProfile>,
}

/// Production [`ProfileSource`] backed by the platform's HTTP lookup.
#[derive(Debug, Clone)]
pub struct HttpProfileSource {
    client: reqwest::Client,
    url: String,
    device_id_param: String,
}

impl HttpProfileSource {
    /// Creates the client. An unconfigured URL is fatal here, not at the
    /// first connect.
    pub fn new(config: &LookupConfig) -> AppResult<Self> {
        if config.url.is_empty() {
            return Err(AppError::configuration(
                "Vehicle profile lookup URL is not configured",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    vehiclehub_core::error::ErrorKind::Configuration,
                    format!("Failed to build lookup HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            device_id_param: config.device_id_param.clone(),
        })
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn lookup(&self, client_id: &str) -> AppResult<Option<VehicleProfile>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[(self.device_id_param.as_str(), client_id)])
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    vehiclehub_core::error::ErrorKind::ExternalService,
                    format!("Profile lookup request failed: {e}"),
                    e,
                )
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(client_id, "Profile lookup: device unknown");
            return Ok(None);
        }

        let response = response.error_for_status().map_err(|e| {
            AppError::with_source(
                vehiclehub_core::error::ErrorKind::ExternalService,
                format!("Profile lookup returned an error status: {e}"),
                e,
            )
        })?;

        let body: LookupResponse = response.json().await.map_err(|e| {
            AppError::with_source(
                vehiclehub_core::error::ErrorKind::ExternalService,
                format!("Profile lookup returned an unreadable body: {e}"),
                e,
            )
        })?;

        debug!(
            client_id,
            vehicle = ?body.data.as_ref().and_then(|d| d.vehicle_id.as_deref()),
            "Profile lookup completed"
        );
        Ok(body.data)
    }
}
