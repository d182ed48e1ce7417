use std::time::Duration;

use pmoupnp::soap::{
    FieldMap, SoapEnvelope, build_soap_request, error_codes, parse_soap_envelope, parse_soap_fault,
};
use tracing::{debug, trace};
use ureq::Agent;

use crate::errors::ControlPointError;

/// Result of a SOAP call:
/// - HTTP status code
/// - raw XML body (always)
/// - parsed SOAP envelope if parsing succeeded
#[derive(Debug)]
pub struct SoapCallResult {
    pub action: String,
    pub status: u16,
    pub raw_body: String,
    pub envelope: Option<SoapEnvelope>,
}

impl SoapCallResult {
    pub fn new(action: &str, status: u16, raw_body: String) -> Self {
        // A body that is not valid SOAP still yields a result: callers get
        // the status and the raw text.
        let envelope = parse_soap_envelope(raw_body.as_bytes()).ok();
        Self {
            action: action.to_string(),
            status,
            raw_body,
            envelope,
        }
    }

    /// Output arguments of `<u:{action}Response>`.
    ///
    /// A SOAP fault is reported with its UPnP error code, any other
    /// non-2xx reply with its HTTP status and body.
    pub fn into_fields(self) -> Result<FieldMap, ControlPointError> {
        if let Some(env) = &self.envelope {
            if let Some(fault) = parse_soap_fault(env) {
                let (code, description) = match fault.upnp_error {
                    Some(err) => {
                        let description = if err.error_description.is_empty() {
                            error_codes::describe(err.error_code)
                                .unwrap_or_default()
                                .to_string()
                        } else {
                            err.error_description
                        };
                        (err.error_code, description)
                    }
                    None => (0, fault.fault_string),
                };
                return Err(ControlPointError::SoapUpnpParseError(
                    self.action,
                    code,
                    description,
                    self.status,
                ));
            }
        }

        if !(200..300).contains(&self.status) {
            return Err(ControlPointError::SoapActionWrongBody(
                self.action,
                self.status,
                self.raw_body,
            ));
        }

        let envelope = self
            .envelope
            .ok_or_else(|| ControlPointError::SoapNoEnvelop(self.action.clone()))?;

        envelope.response_fields(&self.action).ok_or_else(|| {
            ControlPointError::upnp_missing_return_value(&format!("{}Response", self.action))
        })
    }
}

/// Invoke a UPnP SOAP action on a control URL.
///
/// - `control_url`: full HTTP URL of the service control endpoint
/// - `service_type`: service URN, e.g. "urn:schemas-upnp-org:service:AVTransport:1"
/// - `action`: action name, e.g. "GetTransportInfo"
/// - `args`: list of (name, value) pairs, e.g. &[("InstanceID", "0")]
pub fn invoke_upnp_action(
    control_url: &str,
    service_type: &str,
    action: &str,
    args: &[(&str, &str)],
) -> Result<SoapCallResult, ControlPointError> {
    invoke_upnp_action_with_timeout(control_url, service_type, action, args, None)
}

/// Same as [`invoke_upnp_action`] with a global timeout on the HTTP exchange.
pub fn invoke_upnp_action_with_timeout(
    control_url: &str,
    service_type: &str,
    action: &str,
    args: &[(&str, &str)],
    timeout: Option<Duration>,
) -> Result<SoapCallResult, ControlPointError> {
    let body_xml = build_soap_request(service_type, action, args).map_err(|err| {
        ControlPointError::SoapAction(format!("cannot build {} request: {}", action, err))
    })?;

    // 4xx/5xx must not be turned into ureq errors: a SOAP fault travels
    // in the body of an HTTP 500.
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build();

    let agent: Agent = config.into();

    let soap_action_header = format!(r#""{}#{}""#, service_type, action);

    debug!(control_url, action, "Sending SOAP request");
    let mut response = agent
        .post(control_url)
        .header("Content-Type", r#"text/xml; charset="utf-8""#)
        .header("SOAPAction", &soap_action_header)
        .send(body_xml)
        .map_err(|err| {
            ControlPointError::SoapAction(format!("{} to {}: {}", action, control_url, err))
        })?;

    let status = response.status().as_u16();

    let raw_body = response.body_mut().read_to_string().map_err(|err| {
        ControlPointError::SoapAction(format!("{}: cannot read response body: {}", action, err))
    })?;
    trace!(action, status, body = %raw_body, "SOAP response");

    Ok(SoapCallResult::new(action, status, raw_body))
}
