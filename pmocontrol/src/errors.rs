use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlPointError {
    #[error("{0}")]
    ParsingError(String),
    #[error("Device {0} does not expose service {1}")]
    UpnpOperationNotSupported(String, String),
    #[error("Missing {0} element in SOAP body")]
    UpnpMissingReturnValue(String),
    #[error("Invalid {0} value: {1}")]
    UpnpBadReturnValue(String, String),
    #[error("Soap Error: Upnp action call {0}")]
    SoapAction(String),
    #[error("{0} returned UPnP error {1}: {2} (HTTP status {3})")]
    SoapUpnpParseError(String, u32, String, u16),
    #[error("{0} failed with HTTP status {1} and body: {2}")]
    SoapActionWrongBody(String, u16, String),
    #[error("Soap Error: No envelop for action {0}")]
    SoapNoEnvelop(String),
    #[error("Description Error: {0}")]
    DescriptionError(String),
    #[error("Discovery Error: {0}")]
    DiscoveryError(String),
    #[error("MediaServer Error: {0}")]
    MediaServerError(String),
}

impl ControlPointError {
    pub fn upnp_operation_not_supported(device: &str, service: &str) -> Self {
        ControlPointError::UpnpOperationNotSupported(device.to_string(), service.to_string())
    }

    pub fn upnp_missing_return_value(value: &str) -> Self {
        ControlPointError::UpnpMissingReturnValue(value.to_string())
    }

    pub fn upnp_bad_return_value(name: &str, value: &str) -> Self {
        ControlPointError::UpnpBadReturnValue(name.to_string(), value.to_string())
    }

    /// Code HTTP de la réponse fautive, quand il est connu
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ControlPointError::SoapUpnpParseError(_, _, _, status)
            | ControlPointError::SoapActionWrongBody(_, status, _) => Some(*status),
            _ => None,
        }
    }

    /// Code d'erreur UPnP (`<errorCode>`) remonté par le device
    pub fn upnp_error_code(&self) -> Option<u32> {
        match self {
            ControlPointError::SoapUpnpParseError(_, code, _, _) => Some(*code),
            _ => None,
        }
    }
}
