use std::fmt;

use serde::{Deserialize, Serialize};

pub const MEDIA_SERVER_DEVICE: &str = "urn:schemas-upnp-org:device:MediaServer:1";
pub const MEDIA_RENDERER_DEVICE: &str = "urn:schemas-upnp-org:device:MediaRenderer:1";
pub const CONTENT_DIRECTORY_SERVICE: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";
pub const AVTRANSPORT_SERVICE: &str = "urn:schemas-upnp-org:service:AVTransport:1";

/// Service endpoint taken from the device description.
///
/// `control_url` is absolute (resolved against the description URL).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub service_type: String,
    pub control_url: String,
}

/// A UPnP device as read from its description document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub friendly_name: String,
    pub device_type: String,
    pub location: String,
    pub udn: String,
    pub services: Vec<ServiceEndpoint>,
}

// "urn:schemas-upnp-org:service:AVTransport:1" -> "urn:schemas-upnp-org:service:avtransport"
fn service_family(service_type: &str) -> String {
    let lower = service_type.trim().to_ascii_lowercase();
    match lower.rsplit_once(':') {
        Some((family, version)) if version.chars().all(|c| c.is_ascii_digit()) => {
            family.to_string()
        }
        _ => lower,
    }
}

impl Device {
    /// First endpoint implementing `service_type`, any version.
    pub fn service(&self, service_type: &str) -> Option<&ServiceEndpoint> {
        let wanted = service_family(service_type);
        self.services
            .iter()
            .find(|s| service_family(&s.service_type) == wanted)
    }

    pub fn has_service(&self, service_type: &str) -> bool {
        self.service(service_type).is_some()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.friendly_name, self.location)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Item,
    Container,
}

/// Child of a ContentDirectory container.
///
/// `url`, `content_type` and `date` are only filled for items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentNode {
    pub id: String,
    pub title: String,
    pub kind: NodeKind,
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub date: Option<String>,
}

impl ContentNode {
    pub fn container(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind: NodeKind::Container,
            url: None,
            content_type: None,
            date: None,
        }
    }

    pub fn item(id: &str, title: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind: NodeKind::Item,
            url: Some(url.to_string()),
            content_type: None,
            date: None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }

    /// Playable projection of an item; `None` for containers and for
    /// items without a URL.
    pub fn to_playback_item(&self) -> Option<PlaybackItem> {
        if self.is_container() {
            return None;
        }
        let url = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        Some(PlaybackItem {
            id: self.id.clone(),
            url: url.to_string(),
            title: self.title.clone(),
        })
    }
}

/// What a renderer is asked to play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackItem {
    pub id: String,
    pub url: String,
    pub title: String,
}

/// `CurrentTransportState` of an AVTransport instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    PausedPlayback,
    Other(String),
}

impl TransportState {
    /// Exact match on the UPnP token; anything else is kept verbatim.
    pub fn from_upnp(state: &str) -> Self {
        match state.trim() {
            "STOPPED" => TransportState::Stopped,
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" => TransportState::PausedPlayback,
            other => TransportState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransportState::Stopped => "STOPPED",
            TransportState::Playing => "PLAYING",
            TransportState::PausedPlayback => "PAUSED_PLAYBACK",
            TransportState::Other(s) => s,
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `CurrentTransportStatus` value reported by a healthy renderer
pub const TRANSPORT_STATUS_OK: &str = "OK";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportInfo {
    pub current_transport_state: TransportState,
    pub current_transport_status: String,
    pub current_speed: String,
}

impl TransportInfo {
    pub fn status_ok(&self) -> bool {
        self.current_transport_status == TRANSPORT_STATUS_OK
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub nr_tracks: u32,
    pub media_duration: String,
    pub current_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionInfo {
    pub track: u32,
    pub track_duration: String,
    pub track_uri: String,
    pub rel_time: String,
}
