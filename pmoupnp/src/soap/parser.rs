//! Parser des enveloppes SOAP reçues d'un device

use std::io::BufReader;

use xmltree::Element;

use super::{SoapBody, SoapEnvelope, SoapError, SoapHeader};

/// Parse une enveloppe SOAP complète
pub fn parse_soap_envelope(xml: &[u8]) -> Result<SoapEnvelope, SoapError> {
    let reader = BufReader::new(xml);
    let root = Element::parse(reader)?;

    // Vérifier que c'est bien une Envelope
    if !root.name.ends_with("Envelope") {
        return Err(SoapError::MissingEnvelope);
    }

    // Extraire Header (optionnel)
    let header = root
        .children
        .iter()
        .find_map(|n| n.as_element().filter(|e| e.name.ends_with("Header")))
        .map(|e| SoapHeader { content: e.clone() });

    // Extraire Body (obligatoire)
    let body_elem = root
        .children
        .iter()
        .find_map(|n| n.as_element().filter(|e| e.name.ends_with("Body")))
        .ok_or(SoapError::MissingBody)?;

    let body = SoapBody {
        content: body_elem.clone(),
    };

    Ok(SoapEnvelope { header, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transport_info_response() {
        let xml = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <u:GetTransportInfoResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">
      <CurrentTransportState>PLAYING</CurrentTransportState>
      <CurrentTransportStatus>OK</CurrentTransportStatus>
      <CurrentSpeed>1</CurrentSpeed>
    </u:GetTransportInfoResponse>
  </s:Body>
</s:Envelope>"#;

        let envelope = parse_soap_envelope(xml.as_bytes()).unwrap();
        assert!(envelope.header.is_none());

        let fields = envelope.response_fields("GetTransportInfo").unwrap();
        assert_eq!(fields.get("CurrentTransportState").unwrap(), "PLAYING");
        assert_eq!(fields.get("CurrentTransportStatus").unwrap(), "OK");
        assert_eq!(fields.get("CurrentSpeed").unwrap(), "1");
    }

    #[test]
    fn test_empty_arguments_are_kept() {
        let xml = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <u:GetMediaInfoResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">
      <NrTracks>1</NrTracks>
      <NextURI></NextURI>
    </u:GetMediaInfoResponse>
  </s:Body>
</s:Envelope>"#;

        let envelope = parse_soap_envelope(xml.as_bytes()).unwrap();
        let fields = envelope.response_fields("GetMediaInfo").unwrap();
        assert_eq!(fields.get("NextURI").map(String::as_str), Some(""));
        assert!(envelope.response_fields("GetPositionInfo").is_none());
    }

    #[test]
    fn test_reject_non_envelope() {
        let err = parse_soap_envelope(b"<html><body/></html>").unwrap_err();
        assert!(matches!(err, SoapError::MissingEnvelope));
    }
}
