use std::time::Duration;

use pmoupnp::soap::FieldMap;
use tracing::debug;

use crate::DEFAULT_HTTP_TIMEOUT;
use crate::errors::ControlPointError;
use crate::model::{
    AVTRANSPORT_SERVICE, Device, MediaInfo, PositionInfo, TransportInfo, TransportState,
};
use crate::soap_client::invoke_upnp_action_with_timeout;

/// AVTransport actions used to drive a renderer.
///
/// Every call targets one `InstanceID` of the device's AVTransport service.
pub trait AvTransport {
    fn set_uri(
        &self,
        device: &Device,
        instance_id: u32,
        uri: &str,
        metadata: &str,
    ) -> Result<(), ControlPointError>;

    fn play(&self, device: &Device, instance_id: u32) -> Result<(), ControlPointError>;

    fn pause(&self, device: &Device, instance_id: u32) -> Result<(), ControlPointError>;

    fn stop(&self, device: &Device, instance_id: u32) -> Result<(), ControlPointError>;

    fn get_transport_info(
        &self,
        device: &Device,
        instance_id: u32,
    ) -> Result<TransportInfo, ControlPointError>;

    fn get_media_info(
        &self,
        device: &Device,
        instance_id: u32,
    ) -> Result<MediaInfo, ControlPointError>;

    fn get_position_info(
        &self,
        device: &Device,
        instance_id: u32,
    ) -> Result<PositionInfo, ControlPointError>;
}

/// SOAP implementation of [`AvTransport`].
#[derive(Debug, Clone)]
pub struct UpnpAvTransport {
    timeout: Duration,
}

impl Default for UpnpAvTransport {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl UpnpAvTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn call(
        &self,
        device: &Device,
        action: &str,
        args: &[(&str, &str)],
    ) -> Result<FieldMap, ControlPointError> {
        let service = device.service(AVTRANSPORT_SERVICE).ok_or_else(|| {
            ControlPointError::upnp_operation_not_supported(
                &device.friendly_name,
                AVTRANSPORT_SERVICE,
            )
        })?;

        debug!(
            renderer = device.friendly_name.as_str(),
            action, "AVTransport call"
        );

        invoke_upnp_action_with_timeout(
            &service.control_url,
            &service.service_type,
            action,
            args,
            Some(self.timeout),
        )?
        .into_fields()
    }
}

impl AvTransport for UpnpAvTransport {
    fn set_uri(
        &self,
        device: &Device,
        instance_id: u32,
        uri: &str,
        metadata: &str,
    ) -> Result<(), ControlPointError> {
        let instance_id_str = instance_id.to_string();
        self.call(
            device,
            "SetAVTransportURI",
            &[
                ("InstanceID", instance_id_str.as_str()),
                ("CurrentURI", uri),
                ("CurrentURIMetaData", metadata),
            ],
        )?;
        Ok(())
    }

    fn play(&self, device: &Device, instance_id: u32) -> Result<(), ControlPointError> {
        let instance_id_str = instance_id.to_string();
        self.call(
            device,
            "Play",
            &[("InstanceID", instance_id_str.as_str()), ("Speed", "1")],
        )?;
        Ok(())
    }

    fn pause(&self, device: &Device, instance_id: u32) -> Result<(), ControlPointError> {
        let instance_id_str = instance_id.to_string();
        self.call(device, "Pause", &[("InstanceID", instance_id_str.as_str())])?;
        Ok(())
    }

    fn stop(&self, device: &Device, instance_id: u32) -> Result<(), ControlPointError> {
        let instance_id_str = instance_id.to_string();
        self.call(device, "Stop", &[("InstanceID", instance_id_str.as_str())])?;
        Ok(())
    }

    fn get_transport_info(
        &self,
        device: &Device,
        instance_id: u32,
    ) -> Result<TransportInfo, ControlPointError> {
        let instance_id_str = instance_id.to_string();
        let fields = self.call(
            device,
            "GetTransportInfo",
            &[("InstanceID", instance_id_str.as_str())],
        )?;
        parse_transport_info(&fields)
    }

    fn get_media_info(
        &self,
        device: &Device,
        instance_id: u32,
    ) -> Result<MediaInfo, ControlPointError> {
        let instance_id_str = instance_id.to_string();
        let fields = self.call(
            device,
            "GetMediaInfo",
            &[("InstanceID", instance_id_str.as_str())],
        )?;
        parse_media_info(&fields)
    }

    fn get_position_info(
        &self,
        device: &Device,
        instance_id: u32,
    ) -> Result<PositionInfo, ControlPointError> {
        let instance_id_str = instance_id.to_string();
        let fields = self.call(
            device,
            "GetPositionInfo",
            &[("InstanceID", instance_id_str.as_str())],
        )?;
        parse_position_info(&fields)
    }
}

fn required<'a>(fields: &'a FieldMap, name: &str) -> Result<&'a str, ControlPointError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ControlPointError::upnp_missing_return_value(name))
}

fn optional(fields: &FieldMap, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

fn parse_u32(fields: &FieldMap, name: &str) -> Result<u32, ControlPointError> {
    match fields.get(name).map(String::as_str) {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ControlPointError::upnp_bad_return_value(name, raw)),
    }
}

pub(crate) fn parse_transport_info(fields: &FieldMap) -> Result<TransportInfo, ControlPointError> {
    Ok(TransportInfo {
        current_transport_state: TransportState::from_upnp(required(
            fields,
            "CurrentTransportState",
        )?),
        current_transport_status: required(fields, "CurrentTransportStatus")?.to_string(),
        current_speed: optional(fields, "CurrentSpeed"),
    })
}

pub(crate) fn parse_media_info(fields: &FieldMap) -> Result<MediaInfo, ControlPointError> {
    Ok(MediaInfo {
        nr_tracks: parse_u32(fields, "NrTracks")?,
        media_duration: optional(fields, "MediaDuration"),
        current_uri: optional(fields, "CurrentURI"),
    })
}

pub(crate) fn parse_position_info(fields: &FieldMap) -> Result<PositionInfo, ControlPointError> {
    Ok(PositionInfo {
        track: parse_u32(fields, "Track")?,
        track_duration: optional(fields, "TrackDuration"),
        track_uri: optional(fields, "TrackURI"),
        rel_time: optional(fields, "RelTime"),
    })
}
