//! Construction des requêtes (et réponses) SOAP

use xmltree::{Element, XMLNode};

use super::SoapError;

fn build_soap_envelope_with_body(body_child: Element) -> Result<String, SoapError> {
    // Body
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    // Envelope
    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "xmlns:s".to_string(),
        "http://schemas.xmlsoap.org/soap/envelope/".to_string(),
    );
    envelope.attributes.insert(
        "s:encodingStyle".to_string(),
        "http://schemas.xmlsoap.org/soap/encoding/".to_string(),
    );
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf)?)
}

fn action_element(name: String, service_urn: &str, args: &[(&str, &str)]) -> Element {
    let mut elem = Element::new(&name);
    elem.attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    for (key, value) in args {
        let mut child = Element::new(*key);
        child.children.push(XMLNode::Text((*value).to_string()));
        elem.children.push(XMLNode::Element(child));
    }

    elem
}

/// Construit le corps d'une invocation d'action UPnP
///
/// # Arguments
///
/// * `service_urn` - URN du service (ex: "urn:schemas-upnp-org:service:AVTransport:1")
/// * `action` - Nom de l'action (ex: "Play")
/// * `args` - Arguments d'entrée, dans l'ordre attendu par le service
///
/// Les valeurs sont échappées par l'émetteur XML : un `CurrentURIMetaData`
/// contenant du DIDL-Lite est donc transmis sous forme de texte.
pub fn build_soap_request(
    service_urn: &str,
    action: &str,
    args: &[(&str, &str)],
) -> Result<String, SoapError> {
    let request = action_element(format!("u:{}", action), service_urn, args);
    build_soap_envelope_with_body(request)
}

/// Construit une réponse SOAP UPnP, telle qu'un device la renverrait
pub fn build_soap_response(
    service_urn: &str,
    action: &str,
    values: &[(&str, &str)],
) -> Result<String, SoapError> {
    let response = action_element(format!("u:{}Response", action), service_urn, values);
    build_soap_envelope_with_body(response)
}
