//! SOAP Faults pour UPnP

use xmltree::{Element, XMLNode};

use super::envelope::find_child_with_suffix;
use super::{SoapEnvelope, SoapError};

/// Erreur SOAP (Fault)
#[derive(Debug, Clone)]
pub struct SoapFault {
    /// Code d'erreur (ex: "s:Client")
    pub fault_code: String,

    /// Description de l'erreur
    pub fault_string: String,

    /// Détails UPnP optionnels
    pub upnp_error: Option<UpnpError>,
}

/// Erreur UPnP spécifique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpnpError {
    /// Code d'erreur UPnP (ex: 401, 701)
    pub error_code: u32,

    /// Description de l'erreur
    pub error_description: String,
}

fn child_text(parent: &Element, suffix: &str) -> Option<String> {
    find_child_with_suffix(parent, suffix)
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
}

/// Extrait le `<s:Fault>` d'une enveloppe de réponse, s'il y en a un
pub fn parse_soap_fault(envelope: &SoapEnvelope) -> Option<SoapFault> {
    let fault = find_child_with_suffix(&envelope.body.content, "Fault")?;

    let upnp_error = find_child_with_suffix(fault, "detail")
        .and_then(|detail| find_child_with_suffix(detail, "UPnPError"))
        .and_then(|err| {
            let error_code = child_text(err, "errorCode")?.parse::<u32>().ok()?;
            let error_description = child_text(err, "errorDescription").unwrap_or_default();
            Some(UpnpError {
                error_code,
                error_description,
            })
        });

    Some(SoapFault {
        fault_code: child_text(fault, "faultcode").unwrap_or_default(),
        fault_string: child_text(fault, "faultstring").unwrap_or_default(),
        upnp_error,
    })
}

fn text_element(name: &str, text: &str) -> Element {
    let mut elem = Element::new(name);
    elem.children.push(XMLNode::Text(text.to_string()));
    elem
}

/// Construit un SOAP Fault XML, tel qu'un device le renverrait
///
/// # Arguments
///
/// * `fault_code` - Code du fault (ex: "s:Client")
/// * `fault_string` - Message d'erreur
/// * `upnp_error` - Code et description UPnP optionnels
pub fn build_soap_fault(
    fault_code: &str,
    fault_string: &str,
    upnp_error: Option<(u32, &str)>,
) -> Result<String, SoapError> {
    let mut fault = Element::new("s:Fault");
    fault
        .children
        .push(XMLNode::Element(text_element("faultcode", fault_code)));
    fault
        .children
        .push(XMLNode::Element(text_element("faultstring", fault_string)));

    if let Some((code, desc)) = upnp_error {
        let mut upnp = Element::new("UPnPError");
        upnp.attributes.insert(
            "xmlns".to_string(),
            "urn:schemas-upnp-org:control-1-0".to_string(),
        );
        upnp.children.push(XMLNode::Element(text_element(
            "errorCode",
            &code.to_string(),
        )));
        upnp.children
            .push(XMLNode::Element(text_element("errorDescription", desc)));

        let mut detail = Element::new("detail");
        detail.children.push(XMLNode::Element(upnp));
        fault.children.push(XMLNode::Element(detail));
    }

    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(fault));

    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "xmlns:s".to_string(),
        "http://schemas.xmlsoap.org/soap/envelope/".to_string(),
    );
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf)?)
}
