use std::time::Duration;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::{Error as XmlError, Reader, events::Event};
use thiserror::Error;
use tracing::debug;
use ureq::Agent;

use crate::errors::ControlPointError;
use crate::model::{Device, ServiceEndpoint};

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("HTTP status {0} for {1}")]
    Status(u16, String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Missing required device element: {0}")]
    MissingField(&'static str),
}

impl From<DescriptionError> for ControlPointError {
    fn from(err: DescriptionError) -> Self {
        ControlPointError::DescriptionError(err.to_string())
    }
}

/// Parsed root device description plus every service of the device tree.
#[derive(Debug, Default)]
struct ParsedDeviceDescription {
    udn: Option<String>,
    device_type: Option<String>,
    friendly_name: Option<String>,
    url_base: Option<String>,
    services: Vec<(String, String)>,
}

impl ParsedDeviceDescription {
    fn into_device(self, location: &str) -> Result<Device, DescriptionError> {
        let device_type = self
            .device_type
            .ok_or(DescriptionError::MissingField("deviceType"))?;
        let friendly_name = self
            .friendly_name
            .ok_or(DescriptionError::MissingField("friendlyName"))?;
        let base = self.url_base.as_deref().unwrap_or(location);

        let services = self
            .services
            .into_iter()
            .map(|(service_type, control)| ServiceEndpoint {
                service_type,
                control_url: resolve_control_url(base, &control),
            })
            .collect();

        Ok(Device {
            friendly_name,
            device_type,
            location: location.to_string(),
            udn: self.udn.unwrap_or_default(),
            services,
        })
    }
}

/// HTTP-based XML description provider (UPnP device description.xml)
#[derive(Debug, Clone)]
pub struct HttpXmlDescriptionProvider {
    timeout: Duration,
}

impl HttpXmlDescriptionProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fetch and parse the device description.xml at `location`.
    pub fn fetch(&self, location: &str) -> Result<Device, DescriptionError> {
        debug!(location, "Fetching device description");

        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(self.timeout))
            .build();

        let agent: Agent = config.into();

        let mut response = agent.get(location).call()?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(DescriptionError::Status(status, location.to_string()));
        }

        let body = response.body_mut().read_to_string()?;
        parse_description(location, &body)
    }
}

/// Parses a device description document.
///
/// Identity fields come from the root `<device>`; services of embedded
/// devices are collected too, in document order.
pub fn parse_description(location: &str, xml: &str) -> Result<Device, DescriptionError> {
    let mut reader = Reader::from_str(xml);
    // Entity references arrive as separate events: text is accumulated
    // and trimmed when the element closes.
    reader.config_mut().trim_text(false);

    let mut parsed = ParsedDeviceDescription::default();

    let mut device_depth = 0usize;
    let mut in_service = false;
    let mut current_tag: Option<String> = None;
    let mut text = String::new();

    let mut current_service_type: Option<String> = None;
    let mut current_control_url: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                text.clear();
                match name.as_str() {
                    "device" => {
                        device_depth += 1;
                        current_tag = None;
                    }
                    "service" => {
                        if device_depth > 0 {
                            in_service = true;
                            current_tag = None;
                            current_service_type = None;
                            current_control_url = None;
                        }
                    }
                    _ => current_tag = Some(name),
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "device" => device_depth = device_depth.saturating_sub(1),
                    "service" => {
                        if in_service {
                            if let (Some(st), Some(ctrl)) =
                                (current_service_type.take(), current_control_url.take())
                            {
                                parsed.services.push((st, ctrl));
                            }
                            in_service = false;
                        }
                    }
                    _ => {
                        if current_tag.as_deref() == Some(name.as_str()) {
                            let value = text.trim().to_string();
                            let root_device = device_depth == 1;
                            match name.as_str() {
                                "URLBase" if device_depth == 0 => parsed.url_base = Some(value),
                                "UDN" if root_device && !in_service => {
                                    parsed.udn.get_or_insert(value);
                                }
                                "deviceType" if root_device && !in_service => {
                                    parsed.device_type.get_or_insert(value);
                                }
                                "friendlyName" if root_device && !in_service => {
                                    parsed.friendly_name.get_or_insert(value);
                                }
                                "serviceType" if in_service => current_service_type = Some(value),
                                "controlURL" if in_service => current_control_url = Some(value),
                                _ => {}
                            }
                        }
                    }
                }
                current_tag = None;
                text.clear();
            }
            Event::Text(e) => {
                if current_tag.is_some() {
                    text.push_str(&e.decode().map_err(XmlError::Encoding)?);
                }
            }
            Event::GeneralRef(e) => {
                if current_tag.is_some() {
                    if let Some(ch) = e.resolve_char_ref()? {
                        text.push(ch);
                    } else {
                        let entity = e.decode().map_err(XmlError::Encoding)?;
                        if let Some(resolved) = resolve_predefined_entity(&entity) {
                            text.push_str(resolved);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let device = parsed.into_device(location)?;
    debug!(
        friendly_name = device.friendly_name.as_str(),
        device_type = device.device_type.as_str(),
        services = device.services.len(),
        "Parsed device description"
    );
    Ok(device)
}

/// Resolve a possibly relative controlURL against the description URL.
///
/// - If `control_url` is already absolute (starts with http:// or https://), it is returned as-is.
/// - An absolute path is resolved against the scheme://host:port of `description_url`.
/// - A relative path is resolved against the directory of `description_url`.
pub fn resolve_control_url(description_url: &str, control_url: &str) -> String {
    if control_url.starts_with("http://") || control_url.starts_with("https://") {
        return control_url.to_string();
    }

    if let Some((scheme, rest)) = description_url.split_once("://") {
        let (authority, path) = match rest.find('/') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, "/"),
        };
        let base = format!("{}://{}", scheme, authority);

        if control_url.starts_with('/') {
            return format!("{}{}", base, control_url);
        }

        let dir = match path.rfind('/') {
            Some(pos) => &path[..=pos],
            None => "/",
        };
        return format!("{}{}{}", base, dir, control_url);
    }

    // Fallback: just return the raw control_url if we cannot parse
    control_url.to_string()
}
