//! # pmodidl - DIDL-Lite Parser
//!
//! Parser et utilitaires pour le format DIDL-Lite utilisé dans UPnP/DLNA.
//!
//! Le parsing conserve l'ordre du document : containers et items sont
//! rendus dans une seule séquence, dans l'ordre où le serveur les a émis.

use std::fmt::Write;
use std::io::BufReader;

use quick_xml::escape::escape;
use thiserror::Error;
use xmltree::{Element, XMLNode};

/// Classe UPnP générique utilisée pour les métadonnées de lecture
pub const GENERIC_AUDIO_CLASS: &str = "object.item.audioItem";

#[derive(Debug, Error)]
pub enum DidlError {
    #[error("XML parse error: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("Root element is <{0}>, expected <DIDL-Lite>")]
    NotDidl(String),

    #[error("<{0}> element without id attribute")]
    MissingId(&'static str),
}

// ============= Structures DIDL-Lite =============

/// Objet de premier niveau d'un document DIDL-Lite
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DidlObject {
    Container(Container),
    Item(Item),
}

impl DidlObject {
    pub fn id(&self) -> &str {
        match self {
            DidlObject::Container(c) => &c.id,
            DidlObject::Item(i) => &i.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            DidlObject::Container(c) => &c.title,
            DidlObject::Item(i) => &i.title,
        }
    }
}

/// Container pouvant contenir d'autres containers ou items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub class: String,
    pub child_count: Option<u32>,
}

/// Item représentant un objet média
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub class: String,
    pub creator: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub resources: Vec<Resource>,
}

/// Ressource média (URL + protocolInfo)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub protocol_info: String,
    pub duration: Option<String>,
    pub url: String,
}

impl Resource {
    /// Type MIME, troisième champ de `protocol:network:contentFormat:additionalInfo`
    pub fn mime_type(&self) -> Option<&str> {
        self.protocol_info
            .split(':')
            .nth(2)
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != "*")
    }
}

impl Item {
    /// Retourne la ressource principale (première avec une URL)
    pub fn primary_resource(&self) -> Option<&Resource> {
        self.resources.iter().find(|r| !r.url.trim().is_empty())
    }
}

// ============= Parsing =============

fn child_text(parent: &Element, local_name: &str) -> Option<String> {
    parent.children.iter().find_map(|node| match node {
        XMLNode::Element(elem) if elem.name == local_name => elem
            .get_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        _ => None,
    })
}

fn attribute(elem: &Element, name: &str) -> Option<String> {
    elem.attributes.get(name).cloned()
}

fn parse_container(elem: &Element) -> Result<Container, DidlError> {
    Ok(Container {
        id: attribute(elem, "id").ok_or(DidlError::MissingId("container"))?,
        parent_id: attribute(elem, "parentID").unwrap_or_default(),
        title: child_text(elem, "title").unwrap_or_default(),
        class: child_text(elem, "class").unwrap_or_default(),
        child_count: attribute(elem, "childCount").and_then(|c| c.parse().ok()),
    })
}

fn parse_item(elem: &Element) -> Result<Item, DidlError> {
    let resources = elem
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|child| child.name == "res")
        .map(|res| Resource {
            protocol_info: attribute(res, "protocolInfo").unwrap_or_default(),
            duration: attribute(res, "duration"),
            url: res
                .get_text()
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
        })
        .collect();

    Ok(Item {
        id: attribute(elem, "id").ok_or(DidlError::MissingId("item"))?,
        parent_id: attribute(elem, "parentID").unwrap_or_default(),
        title: child_text(elem, "title").unwrap_or_default(),
        class: child_text(elem, "class").unwrap_or_default(),
        creator: child_text(elem, "creator"),
        artist: child_text(elem, "artist"),
        album: child_text(elem, "album"),
        date: child_text(elem, "date"),
        resources,
    })
}

/// Parse un document DIDL-Lite en conservant l'ordre des objets.
///
/// Un payload vide donne une liste vide. Les éléments inconnus
/// (`desc`, extensions vendeur) sont ignorés.
pub fn parse_didl(xml: &str) -> Result<Vec<DidlObject>, DidlError> {
    let trimmed = xml.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let root = Element::parse(BufReader::new(trimmed.as_bytes()))?;
    if root.name != "DIDL-Lite" {
        return Err(DidlError::NotDidl(root.name));
    }

    let mut objects = Vec::new();
    for elem in root.children.iter().filter_map(XMLNode::as_element) {
        match elem.name.as_str() {
            "container" => objects.push(DidlObject::Container(parse_container(elem)?)),
            "item" => objects.push(DidlObject::Item(parse_item(elem)?)),
            _ => {}
        }
    }

    Ok(objects)
}

// ============= Génération =============

/// Construit un DIDL-Lite minimal décrivant un seul item lisible.
///
/// Titre, URL et identifiant sont échappés (`& < > " '`).
pub fn single_item_metadata(id: &str, title: &str, url: &str, class: &str) -> String {
    let mut buf = String::new();
    buf.push_str(
        r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">"#,
    );
    // write! sur une String ne peut pas échouer
    let _ = write!(
        buf,
        r#"<item id="{}" parentID="-1" restricted="1"><dc:title>{}</dc:title><upnp:class>{}</upnp:class><res protocolInfo="http-get:*:*:*">{}</res></item>"#,
        escape(id),
        escape(title),
        escape(class),
        escape(url),
    );
    buf.push_str("</DIDL-Lite>");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_document_order() {
        let xml = r#"
        <DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
                   xmlns:dc="http://purl.org/dc/elements/1.1/"
                   xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
            <item id="1" parentID="0">
                <dc:title>First</dc:title>
                <upnp:class>object.item.audioItem.musicTrack</upnp:class>
                <res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/1.mp3</res>
            </item>
            <container id="10" parentID="0" childCount="3">
                <dc:title>Album</dc:title>
                <upnp:class>object.container.album.musicAlbum</upnp:class>
            </container>
            <item id="2" parentID="0">
                <dc:title>Second</dc:title>
                <upnp:class>object.item.audioItem.musicTrack</upnp:class>
                <dc:date>2001-01-01</dc:date>
                <res protocolInfo="http-get:*:audio/flac:*">http://example.com/2.flac</res>
            </item>
        </DIDL-Lite>
        "#;

        let objects = parse_didl(xml).unwrap();
        let ids: Vec<&str> = objects.iter().map(DidlObject::id).collect();
        assert_eq!(ids, vec!["1", "10", "2"]);

        match &objects[1] {
            DidlObject::Container(c) => {
                assert_eq!(c.title, "Album");
                assert_eq!(c.child_count, Some(3));
            }
            other => panic!("expected container, got {other:?}"),
        }

        match &objects[2] {
            DidlObject::Item(i) => {
                assert_eq!(i.date.as_deref(), Some("2001-01-01"));
                let res = i.primary_resource().unwrap();
                assert_eq!(res.url, "http://example.com/2.flac");
                assert_eq!(res.mime_type(), Some("audio/flac"));
            }
            other => panic!("expected item, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_without_namespaces() {
        // devices UPnP laxistes
        let xml = r#"
        <DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">
            <item id="1" parentID="0">
                <title>Test Song</title>
                <class>object.item.audioItem.musicTrack</class>
                <res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/song.mp3</res>
            </item>
        </DIDL-Lite>
        "#;

        let objects = parse_didl(xml).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].title(), "Test Song");
    }

    #[test]
    fn test_empty_payload() {
        assert!(parse_didl("  ").unwrap().is_empty());
    }

    #[test]
    fn test_item_without_id_is_rejected() {
        let xml = r#"<DIDL-Lite><item parentID="0"><title>x</title></item></DIDL-Lite>"#;
        assert!(matches!(
            parse_didl(xml),
            Err(DidlError::MissingId("item"))
        ));
    }

    #[test]
    fn test_single_item_metadata_escapes_special_characters() {
        let didl = single_item_metadata(
            "7",
            r#"Rock & Roll <Live> "Best" 'Of'"#,
            "http://x/7.mp3?a=1&b=2",
            GENERIC_AUDIO_CLASS,
        );

        assert!(didl.contains("Rock &amp; Roll &lt;Live&gt; &quot;Best&quot; &apos;Of&apos;"));
        assert!(didl.contains("http://x/7.mp3?a=1&amp;b=2"));
        assert!(didl.contains("<upnp:class>object.item.audioItem</upnp:class>"));

        // Le document généré se relit
        let objects = parse_didl(&didl).unwrap();
        match &objects[0] {
            DidlObject::Item(i) => {
                assert_eq!(i.title, r#"Rock & Roll <Live> "Best" 'Of'"#);
                assert_eq!(i.primary_resource().unwrap().url, "http://x/7.mp3?a=1&b=2");
            }
            other => panic!("expected item, got {other:?}"),
        }
    }
}
