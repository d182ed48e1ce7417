//! In-memory renderer, media server and player shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use pmocontrol::{
    AvTransport, ContentDirectory, ContentNode, ControlPointError, Device, MediaInfo,
    PlaybackItem, PositionInfo, TransportInfo, TransportState,
};
use pmoplayback::{Outcome, Player, Sleeper};

pub fn device(name: &str) -> Device {
    Device {
        friendly_name: name.to_string(),
        device_type: String::new(),
        location: format!("http://{name}/description.xml"),
        udn: format!("uuid:{name}"),
        services: Vec::new(),
    }
}

pub fn playback_item(id: &str) -> PlaybackItem {
    PlaybackItem {
        id: id.to_string(),
        url: format!("http://nas/{id}.flac"),
        title: format!("Track {id}"),
    }
}

/// Renderer answering GetTransportInfo from a script; `STOPPED` once the
/// script runs out. The transport status is `OK` unless overridden for a
/// given GetTransportInfo call.
#[derive(Default)]
pub struct FakeRenderer {
    states: RefCell<VecDeque<String>>,
    statuses: HashMap<usize, String>,
    failing: Vec<String>,
    calls: RefCell<Vec<String>>,
    pub metadata: RefCell<Vec<String>>,
}

impl FakeRenderer {
    pub fn scripted<'s>(states: impl IntoIterator<Item = &'s str>) -> Self {
        Self {
            states: RefCell::new(states.into_iter().map(str::to_string).collect()),
            ..Default::default()
        }
    }

    /// Reports `status` on the `call`-th GetTransportInfo (1-based).
    pub fn with_status(mut self, call: usize, status: &str) -> Self {
        self.statuses.insert(call, status.to_string());
        self
    }

    /// Makes every call of `action` fail.
    pub fn failing(mut self, action: &str) -> Self {
        self.failing.push(action.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == action).count()
    }

    fn record(&self, action: &str) {
        self.calls.borrow_mut().push(action.to_string());
    }

    fn answer(&self, action: &str) -> Result<(), ControlPointError> {
        if self.failing.iter().any(|a| a == action) {
            return Err(ControlPointError::SoapAction(format!("{action} refused")));
        }
        Ok(())
    }
}

impl AvTransport for FakeRenderer {
    fn set_uri(
        &self,
        _device: &Device,
        _instance_id: u32,
        uri: &str,
        metadata: &str,
    ) -> Result<(), ControlPointError> {
        self.record(&format!("SetAVTransportURI {uri}"));
        self.metadata.borrow_mut().push(metadata.to_string());
        self.answer("SetAVTransportURI")
    }

    fn play(&self, _device: &Device, _instance_id: u32) -> Result<(), ControlPointError> {
        self.record("Play");
        self.answer("Play")
    }

    fn pause(&self, _device: &Device, _instance_id: u32) -> Result<(), ControlPointError> {
        self.record("Pause");
        self.answer("Pause")
    }

    fn stop(&self, _device: &Device, _instance_id: u32) -> Result<(), ControlPointError> {
        self.record("Stop");
        self.answer("Stop")
    }

    fn get_transport_info(
        &self,
        _device: &Device,
        _instance_id: u32,
    ) -> Result<TransportInfo, ControlPointError> {
        self.record("GetTransportInfo");
        self.answer("GetTransportInfo")?;
        let call = self.count("GetTransportInfo");
        let status = self
            .statuses
            .get(&call)
            .cloned()
            .unwrap_or_else(|| "OK".to_string());
        let state = self
            .states
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| "STOPPED".to_string());
        Ok(TransportInfo {
            current_transport_state: TransportState::from_upnp(&state),
            current_transport_status: status,
            current_speed: "1".to_string(),
        })
    }

    fn get_media_info(
        &self,
        _device: &Device,
        _instance_id: u32,
    ) -> Result<MediaInfo, ControlPointError> {
        self.record("GetMediaInfo");
        self.answer("GetMediaInfo")?;
        Ok(MediaInfo::default())
    }

    fn get_position_info(
        &self,
        _device: &Device,
        _instance_id: u32,
    ) -> Result<PositionInfo, ControlPointError> {
        self.record("GetPositionInfo");
        self.answer("GetPositionInfo")?;
        Ok(PositionInfo::default())
    }
}

#[derive(Default)]
pub struct NoSleep {
    pub calls: Cell<u32>,
}

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {
        self.calls.set(self.calls.get() + 1);
    }
}

/// ContentDirectory backed by a map from container id to children.
#[derive(Default)]
pub struct Library {
    children: HashMap<String, Vec<ContentNode>>,
    pub browsed: RefCell<Vec<String>>,
}

impl Library {
    pub fn with(mut self, parent: &str, children: Vec<ContentNode>) -> Self {
        self.children.insert(parent.to_string(), children);
        self
    }

    /// ```text
    /// 0
    /// ├── jazz          Jazz
    /// │   ├── blue      Blue Train
    /// │   │   ├── t1
    /// │   │   └── t2
    /// │   └── t3
    /// └── rock          Rock
    ///     └── t4
    /// ```
    pub fn sample() -> Self {
        Library::default()
            .with(
                "0",
                vec![
                    ContentNode::container("jazz", "Jazz"),
                    ContentNode::container("rock", "Rock"),
                ],
            )
            .with(
                "jazz",
                vec![
                    ContentNode::container("blue", "Blue Train"),
                    node("t3"),
                ],
            )
            .with("blue", vec![node("t1"), node("t2")])
            .with("rock", vec![node("t4")])
    }
}

pub fn node(id: &str) -> ContentNode {
    let item = playback_item(id);
    ContentNode::item(&item.id, &item.title, &item.url)
}

impl ContentDirectory for Library {
    fn browse(
        &self,
        _server: &Device,
        container_id: &str,
    ) -> Result<Vec<ContentNode>, ControlPointError> {
        self.browsed.borrow_mut().push(container_id.to_string());
        self.children
            .get(container_id)
            .cloned()
            .ok_or_else(|| ControlPointError::SoapAction(format!("no such object {container_id}")))
    }
}

/// Player that remembers what it was asked to play.
#[derive(Clone, Default)]
pub struct RecordingPlayer {
    pub played: Rc<RefCell<Vec<String>>>,
    pub fail_on: Option<String>,
}

impl RecordingPlayer {
    pub fn failing_on(id: &str) -> Self {
        Self {
            fail_on: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn played(&self) -> Vec<String> {
        self.played.borrow().clone()
    }
}

impl Player for RecordingPlayer {
    fn play(&self, item: &PlaybackItem) -> Outcome {
        self.played.borrow_mut().push(item.id.clone());
        if self.fail_on.as_deref() == Some(item.id.as_str()) {
            Outcome::StartTimeout { retries: 11 }
        } else {
            Outcome::Success
        }
    }
}
