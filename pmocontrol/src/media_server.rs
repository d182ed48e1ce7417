use std::time::Duration;

use pmodidl::DidlObject;
use tracing::{debug, warn};

use crate::DEFAULT_HTTP_TIMEOUT;
use crate::errors::ControlPointError;
use crate::model::{CONTENT_DIRECTORY_SERVICE, ContentNode, Device, NodeKind};
use crate::soap_client::invoke_upnp_action_with_timeout;

/// Number of children requested per Browse call
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Hierarchical browsing of a media server.
pub trait ContentDirectory {
    /// Direct children of `container_id`, in the order the server returns them.
    fn browse(
        &self,
        device: &Device,
        container_id: &str,
    ) -> Result<Vec<ContentNode>, ControlPointError>;
}

/// SOAP `ContentDirectory:Browse` client.
///
/// Children are fetched page by page until `TotalMatches` is reached.
#[derive(Debug, Clone)]
pub struct UpnpContentDirectory {
    timeout: Duration,
    page_size: u32,
}

impl Default for UpnpContentDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

/// One page of a BrowseDirectChildren answer
#[derive(Debug)]
struct BrowsePage {
    nodes: Vec<ContentNode>,
    number_returned: u32,
    total_matches: u32,
}

impl UpnpContentDirectory {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn browse_page(
        &self,
        device: &Device,
        object_id: &str,
        start: u32,
    ) -> Result<BrowsePage, ControlPointError> {
        let service = device.service(CONTENT_DIRECTORY_SERVICE).ok_or_else(|| {
            ControlPointError::upnp_operation_not_supported(
                &device.friendly_name,
                CONTENT_DIRECTORY_SERVICE,
            )
        })?;

        let start_str = start.to_string();
        let count_str = self.page_size.to_string();
        let args = [
            ("ObjectID", object_id),
            ("BrowseFlag", "BrowseDirectChildren"),
            ("Filter", "*"),
            ("StartingIndex", start_str.as_str()),
            ("RequestedCount", count_str.as_str()),
            ("SortCriteria", ""),
        ];

        let fields = invoke_upnp_action_with_timeout(
            &service.control_url,
            &service.service_type,
            "Browse",
            &args,
            Some(self.timeout),
        )?
        .into_fields()?;

        let didl_xml = fields
            .get("Result")
            .ok_or_else(|| ControlPointError::upnp_missing_return_value("Result"))?;
        let nodes = map_didl_entries(didl_xml)?;

        let number_returned = parse_count(fields.get("NumberReturned"), nodes.len() as u32);
        let total_matches = parse_count(fields.get("TotalMatches"), 0);

        Ok(BrowsePage {
            nodes,
            number_returned,
            total_matches,
        })
    }
}

fn parse_count(raw: Option<&String>, fallback: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(fallback)
}

impl ContentDirectory for UpnpContentDirectory {
    fn browse(
        &self,
        device: &Device,
        container_id: &str,
    ) -> Result<Vec<ContentNode>, ControlPointError> {
        let mut children = Vec::new();
        let mut start = 0u32;

        loop {
            let page = self.browse_page(device, container_id, start)?;
            debug!(
                server = device.friendly_name.as_str(),
                container_id,
                start,
                returned = page.number_returned,
                total = page.total_matches,
                "Browse page"
            );

            children.extend(page.nodes);
            start += page.number_returned;

            if page.number_returned == 0 {
                break;
            }
            if page.total_matches > 0 {
                if start >= page.total_matches {
                    break;
                }
            } else if page.number_returned < self.page_size {
                // Server that does not report TotalMatches
                break;
            }
        }

        Ok(children)
    }
}

/// Maps a DIDL-Lite `Result` payload to content nodes, preserving order.
pub fn map_didl_entries(xml: &str) -> Result<Vec<ContentNode>, ControlPointError> {
    let objects = pmodidl::parse_didl(xml).map_err(|err| {
        ControlPointError::MediaServerError(format!("Failed to parse DIDL-Lite payload: {}", err))
    })?;

    let nodes = objects
        .into_iter()
        .map(|object| match object {
            DidlObject::Container(container) => ContentNode {
                id: container.id,
                title: container.title,
                kind: NodeKind::Container,
                url: None,
                content_type: None,
                date: None,
            },
            DidlObject::Item(item) => {
                let resource = item.primary_resource();
                if resource.is_none() {
                    warn!(
                        entry_id = item.id.as_str(),
                        title = item.title.as_str(),
                        resource_count = item.resources.len(),
                        "No playable resource for item"
                    );
                }
                ContentNode {
                    url: resource.map(|r| r.url.clone()),
                    content_type: resource.and_then(|r| r.mime_type()).map(str::to_string),
                    date: item.date.clone(),
                    id: item.id,
                    title: item.title,
                    kind: NodeKind::Item,
                }
            }
        })
        .collect();

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_didl_entries_keeps_server_order() {
        let xml = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
            xmlns:dc="http://purl.org/dc/elements/1.1/"
            xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
            <container id="a" parentID="0"><dc:title>Disc 1</dc:title></container>
            <item id="t1" parentID="0">
                <dc:title>Intro</dc:title>
                <dc:date>1999-05-01</dc:date>
                <res protocolInfo="http-get:*:audio/flac:*">http://nas/t1.flac</res>
            </item>
            <container id="b" parentID="0"><dc:title>Disc 2</dc:title></container>
        </DIDL-Lite>"#;

        let nodes = map_didl_entries(xml).unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "t1", "b"]);

        assert!(nodes[0].is_container());
        assert_eq!(nodes[0].url, None);

        assert_eq!(nodes[1].kind, NodeKind::Item);
        assert_eq!(nodes[1].url.as_deref(), Some("http://nas/t1.flac"));
        assert_eq!(nodes[1].content_type.as_deref(), Some("audio/flac"));
        assert_eq!(nodes[1].date.as_deref(), Some("1999-05-01"));
    }

    #[test]
    fn item_without_resource_has_no_url() {
        let xml = r#"<DIDL-Lite><item id="x" parentID="0"><title>Ghost</title></item></DIDL-Lite>"#;
        let nodes = map_didl_entries(xml).unwrap();
        assert_eq!(nodes[0].url, None);
        assert_eq!(nodes[0].to_playback_item(), None);
    }

    #[test]
    fn invalid_payload_is_a_media_server_error() {
        let err = map_didl_entries("<html>oops</html>").unwrap_err();
        assert!(matches!(err, ControlPointError::MediaServerError(_)));
    }
}
