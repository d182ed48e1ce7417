//! Locating media servers and renderers on the local network.

use std::collections::HashSet;
use std::time::Duration;

use pmoupnp::ssdp::SsdpClient;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::DEFAULT_HTTP_TIMEOUT;
use crate::errors::ControlPointError;
use crate::glob::GlobPattern;
use crate::model::Device;
use crate::provider::HttpXmlDescriptionProvider;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No device named '{pattern}' with service {service_type} answered within {waited:?}")]
    NoMatchingDevice {
        pattern: String,
        service_type: String,
        waited: Duration,
    },

    #[error("Device at {location} does not expose service {service_type}")]
    MissingService {
        location: String,
        service_type: String,
    },

    #[error("Invalid device name pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    #[error(transparent)]
    ControlPoint(#[from] ControlPointError),
}

/// Device lookup collaborator.
pub trait DeviceLocator {
    /// Devices answering a search for `service_type` within `wait`.
    fn search(
        &self,
        service_type: &str,
        wait: Duration,
    ) -> Result<Vec<Device>, ControlPointError>;

    /// Reads a device straight from its description URL, without broadcast.
    fn fetch_description(&self, location: &str) -> Result<Device, ControlPointError>;
}

/// SSDP M-SEARCH followed by a description fetch per answering location.
#[derive(Debug, Clone)]
pub struct UpnpDeviceLocator {
    provider: HttpXmlDescriptionProvider,
}

impl Default for UpnpDeviceLocator {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl UpnpDeviceLocator {
    pub fn new(http_timeout: Duration) -> Self {
        Self {
            provider: HttpXmlDescriptionProvider::new(http_timeout),
        }
    }
}

impl DeviceLocator for UpnpDeviceLocator {
    fn search(
        &self,
        service_type: &str,
        wait: Duration,
    ) -> Result<Vec<Device>, ControlPointError> {
        let client = SsdpClient::new().map_err(|err| {
            ControlPointError::DiscoveryError(format!("cannot open SSDP socket: {}", err))
        })?;
        let events = client
            .search(service_type, wait)
            .map_err(|err| ControlPointError::DiscoveryError(format!("M-SEARCH failed: {}", err)))?;

        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        for location in events.iter().filter_map(|e| e.location()) {
            if !seen.insert(location.to_string()) {
                continue;
            }
            match self.provider.fetch(location) {
                Ok(device) => {
                    debug!(
                        friendly_name = device.friendly_name.as_str(),
                        location, "Device answered search"
                    );
                    devices.push(device);
                }
                Err(err) => {
                    warn!(location, error = %err, "Failed to fetch/parse device description");
                }
            }
        }

        info!(service_type, count = devices.len(), "Search complete");
        Ok(devices)
    }

    fn fetch_description(&self, location: &str) -> Result<Device, ControlPointError> {
        Ok(self.provider.fetch(location)?)
    }
}

/// How to find the device to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceQuery {
    /// Search the network and keep the first device whose friendly name
    /// matches the glob.
    Name(String),
    /// Description URL given directly.
    Location(String),
}

/// Picks a device exposing `service_type`.
///
/// With [`DeviceQuery::Name`] the first device, in answer order, whose
/// friendly name matches is returned.
pub fn select_device(
    locator: &dyn DeviceLocator,
    query: &DeviceQuery,
    service_type: &str,
    wait: Duration,
) -> Result<Device, DiscoveryError> {
    match query {
        DeviceQuery::Location(location) => {
            let device = locator.fetch_description(location)?;
            if !device.has_service(service_type) {
                return Err(DiscoveryError::MissingService {
                    location: location.clone(),
                    service_type: service_type.to_string(),
                });
            }
            Ok(device)
        }
        DeviceQuery::Name(pattern) => {
            let glob = GlobPattern::new(pattern)?;
            let devices = locator.search(service_type, wait)?;
            devices
                .into_iter()
                .find(|d| d.has_service(service_type) && glob.is_match(&d.friendly_name))
                .inspect(|d| {
                    info!(
                        friendly_name = d.friendly_name.as_str(),
                        location = d.location.as_str(),
                        "Selected device"
                    )
                })
                .ok_or_else(|| DiscoveryError::NoMatchingDevice {
                    pattern: pattern.clone(),
                    service_type: service_type.to_string(),
                    waited: wait,
                })
        }
    }
}
