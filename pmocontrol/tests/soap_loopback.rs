//! End-to-end SOAP exchanges against a one-shot HTTP responder on 127.0.0.1.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use pmocontrol::{
    AVTRANSPORT_SERVICE, AvTransport, CONTENT_DIRECTORY_SERVICE, ContentDirectory,
    ControlPointError, Device, ServiceEndpoint, TransportState, UpnpAvTransport,
    UpnpContentDirectory,
};
use pmoupnp::soap::{build_soap_fault, build_soap_response};

/// Serves the given `(status, body)` replies in order, one connection each,
/// and forwards every received request body.
fn serve(replies: Vec<(u16, String)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in replies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request = vec![0u8; content_length];
            reader.read_exact(&mut request).unwrap();
            tx.send(String::from_utf8(request).unwrap()).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {} X\r\nContent-Type: text/xml; charset=\"utf-8\"\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
        }
    });

    (format!("http://{}", addr), rx)
}

fn device(base: &str) -> Device {
    Device {
        friendly_name: "Loopback".to_string(),
        device_type: "urn:schemas-upnp-org:device:MediaRenderer:1".to_string(),
        location: format!("{}/desc.xml", base),
        udn: "uuid:loopback".to_string(),
        services: vec![
            ServiceEndpoint {
                service_type: AVTRANSPORT_SERVICE.to_string(),
                control_url: format!("{}/avt", base),
            },
            ServiceEndpoint {
                service_type: CONTENT_DIRECTORY_SERVICE.to_string(),
                control_url: format!("{}/cd", base),
            },
        ],
    }
}

#[test]
fn get_transport_info_over_http() {
    let body = build_soap_response(
        AVTRANSPORT_SERVICE,
        "GetTransportInfo",
        &[
            ("CurrentTransportState", "PLAYING"),
            ("CurrentTransportStatus", "OK"),
            ("CurrentSpeed", "1"),
        ],
    )
    .unwrap();
    let (base, requests) = serve(vec![(200, body)]);

    let avt = UpnpAvTransport::new(Duration::from_secs(5));
    let info = avt.get_transport_info(&device(&base), 0).unwrap();

    assert_eq!(info.current_transport_state, TransportState::Playing);
    assert!(info.status_ok());

    let request = requests.recv().unwrap();
    assert!(request.contains("GetTransportInfo"));
    assert!(request.contains("<InstanceID>0</InstanceID>"));
}

#[test]
fn set_uri_sends_escaped_metadata() {
    let body = build_soap_response(AVTRANSPORT_SERVICE, "SetAVTransportURI", &[]).unwrap();
    let (base, requests) = serve(vec![(200, body)]);

    let avt = UpnpAvTransport::new(Duration::from_secs(5));
    avt.set_uri(&device(&base), 0, "http://x/1.mp3", "<DIDL-Lite/>")
        .unwrap();

    let request = requests.recv().unwrap();
    assert!(request.contains("<CurrentURI>http://x/1.mp3</CurrentURI>"));
    assert!(request.contains("&lt;DIDL-Lite/"));
}

#[test]
fn soap_fault_surfaces_upnp_error_code() {
    let body = build_soap_fault("s:Client", "UPnPError", Some((701, "Transition not available")))
        .unwrap();
    let (base, _requests) = serve(vec![(500, body)]);

    let avt = UpnpAvTransport::new(Duration::from_secs(5));
    let err = avt.pause(&device(&base), 0).unwrap_err();

    assert_eq!(err.upnp_error_code(), Some(701));
    assert_eq!(err.http_status(), Some(500));
}

#[test]
fn browse_follows_total_matches_across_pages() {
    let page = |items: &[(&str, &str)], returned: &str| {
        let mut didl = String::from(
            r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
        );
        for (id, url) in items {
            didl.push_str(&format!(
                r#"<item id="{id}" parentID="0"><dc:title>{id}</dc:title><res protocolInfo="http-get:*:audio/mpeg:*">{url}</res></item>"#
            ));
        }
        didl.push_str("</DIDL-Lite>");
        build_soap_response(
            CONTENT_DIRECTORY_SERVICE,
            "Browse",
            &[
                ("Result", didl.as_str()),
                ("NumberReturned", returned),
                ("TotalMatches", "3"),
                ("UpdateID", "1"),
            ],
        )
        .unwrap()
    };

    let (base, requests) = serve(vec![
        (200, page(&[("1", "http://x/1"), ("2", "http://x/2")], "2")),
        (200, page(&[("3", "http://x/3")], "1")),
    ]);

    let cd = UpnpContentDirectory::new(Duration::from_secs(5)).with_page_size(2);
    let nodes = cd.browse(&device(&base), "0").unwrap();

    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let first = requests.recv().unwrap();
    let second = requests.recv().unwrap();
    assert!(first.contains("<StartingIndex>0</StartingIndex>"));
    assert!(second.contains("<StartingIndex>2</StartingIndex>"));
}

#[test]
fn missing_service_is_reported_without_request() {
    let mut renderer = device("http://127.0.0.1:9");
    renderer.services.clear();

    let err = UpnpContentDirectory::default()
        .browse(&renderer, "0")
        .unwrap_err();
    assert!(matches!(
        err,
        ControlPointError::UpnpOperationNotSupported(_, _)
    ));
}
