//! Read-only catalog of services addressable through device topics.

use std::collections::HashMap;

use vehiclehub_core::config::topics::ServiceMappingConfig;
use vehiclehub_core::error::AppError;
use vehiclehub_core::result::AppResult;

/// One resolved service mapping. Loaded once, read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMapping {
    /// The service identifier embedded in topics.
    pub service_id: String,
    /// Human-readable service name.
    pub service_name: String,
    /// The backend stream the service's traffic is forwarded to.
    pub stream_topic: String,
    /// Whether messages for this service require a live device status.
    pub device_status_required: bool,
}

/// Catalog mapping service ids to their [`ServiceMapping`].
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: HashMap<String, ServiceMapping>,
}

impl ServiceCatalog {
    /// Builds the catalog from configuration.
    pub fn new(configs: &[ServiceMappingConfig]) -> Self {
        let services = configs
            .iter()
            .map(|c| {
                (
                    c.service_id.clone(),
                    ServiceMapping {
                        service_id: c.service_id.clone(),
                        service_name: c.service_name.clone(),
                        stream_topic: c.stream_topic.clone(),
                        device_status_required: c.device_status_required,
                    },
                )
            })
            .collect();
        Self { services }
    }

    /// Resolves a service id.
    ///
    /// An unmapped id is a per-message "illegal topic" error, not a
    /// connection-level failure.
    pub fn resolve(&self, service_id: &str) -> AppResult<&ServiceMapping> {
        self.services.get(service_id).ok_or_else(|| {
            AppError::validation(format!("Illegal topic: unmapped service id '{service_id}'"))
        })
    }

    /// Whether the catalog knows the service id.
    pub fn contains(&self, service_id: &str) -> bool {
        self.services.contains_key(service_id)
    }
}
