//! Reverse parsing of incoming topics.

use std::sync::Arc;

use vehiclehub_core::config::topics::TopicConfig;
use vehiclehub_core::error::AppError;
use vehiclehub_core::result::AppResult;

use crate::catalog::{ServiceCatalog, ServiceMapping};

/// Topic direction marker: device-to-cloud or cloud-to-device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Device-to-cloud traffic (the default when no marker is present).
    ToCloud,
    /// Cloud-to-device traffic.
    ToDevice,
}

/// Result of reverse-parsing one incoming topic.
#[derive(Debug, Clone)]
pub struct ParsedTopic {
    /// The device whose topic space the message travels in.
    pub device_id: String,
    /// The resolved service mapping.
    pub service: ServiceMapping,
    /// The detected route.
    pub route: Route,
}

/// Parses incoming topics back into `{device_id, service, route}`.
///
/// Splitting happens on `/` segment boundaries, so device ids containing
/// the literal substrings "2c"/"2d" never confuse route detection.
#[derive(Debug, Clone)]
pub struct TopicParser {
    topic_prefix: String,
    to_cloud_marker: String,
    to_device_marker: String,
    catalog: Arc<ServiceCatalog>,
}

impl TopicParser {
    /// Creates a parser over the topic configuration and service catalog.
    pub fn new(config: &TopicConfig, catalog: Arc<ServiceCatalog>) -> Self {
        Self {
            topic_prefix: config.topic_prefix.clone(),
            to_cloud_marker: config.to_cloud_infix.trim_matches('/').to_string(),
            to_device_marker: config.to_device_infix.trim_matches('/').to_string(),
            catalog,
        }
    }

    /// Parses a topic.
    ///
    /// Errors are per-message (`Validation`): topics outside the managed
    /// prefix, missing segments, or an unmapped service id.
    pub fn parse(&self, topic: &str) -> AppResult<ParsedTopic> {
        let rest = topic.strip_prefix(&self.topic_prefix).ok_or_else(|| {
            AppError::validation(format!(
                "Illegal topic '{topic}': outside prefix '{}'",
                self.topic_prefix
            ))
        })?;

        let mut segments = rest.split('/');

        let device_id = match segments.next() {
            Some(seg) if !seg.is_empty() => seg.to_string(),
            _ => {
                return Err(AppError::validation(format!(
                    "Illegal topic '{topic}': missing device id"
                )));
            }
        };

        let after_device = segments.next().ok_or_else(|| {
            AppError::validation(format!("Illegal topic '{topic}': missing service id"))
        })?;

        // Route marker is optional; absent means to-cloud.
        let (route, service_segment) = if after_device == self.to_device_marker {
            (Route::ToDevice, segments.next())
        } else if after_device == self.to_cloud_marker {
            (Route::ToCloud, segments.next())
        } else {
            (Route::ToCloud, Some(after_device))
        };

        let service_id = match service_segment {
            Some(seg) if !seg.is_empty() => seg,
            _ => {
                return Err(AppError::validation(format!(
                    "Illegal topic '{topic}': missing service id"
                )));
            }
        };

        let service = self.catalog.resolve(service_id)?.clone();

        Ok(ParsedTopic {
            device_id,
            service,
            route,
        })
    }
}
