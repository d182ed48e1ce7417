//! # pmocontrol - Control point UPnP
//!
//! Client side of the UPnP AV architecture used by pmoplay:
//!
//! - [`discovery`]: SSDP search and device description fetch,
//! - [`media_server`]: ContentDirectory browsing,
//! - [`avtransport_client`]: AVTransport playback control,
//! - [`glob`]: shell-style matching on device names and titles.
//!
//! Each collaborator is a trait ([`DeviceLocator`], [`ContentDirectory`],
//! [`AvTransport`]) with a SOAP implementation, so callers can be tested
//! against scripted fakes.

pub mod avtransport_client;
pub mod discovery;
pub mod errors;
pub mod glob;
pub mod media_server;
pub mod model;
pub mod provider;
pub mod soap_client;

use std::time::Duration;

pub use avtransport_client::{AvTransport, UpnpAvTransport};
pub use discovery::{DeviceLocator, DeviceQuery, DiscoveryError, UpnpDeviceLocator, select_device};
pub use errors::ControlPointError;
pub use glob::{GlobPattern, matches_glob};
pub use media_server::{ContentDirectory, UpnpContentDirectory};
pub use model::{
    AVTRANSPORT_SERVICE, CONTENT_DIRECTORY_SERVICE, ContentNode, Device, MediaInfo, NodeKind,
    PlaybackItem, PositionInfo, ServiceEndpoint, TransportInfo, TransportState,
};
pub use provider::HttpXmlDescriptionProvider;
pub use soap_client::{SoapCallResult, invoke_upnp_action, invoke_upnp_action_with_timeout};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
