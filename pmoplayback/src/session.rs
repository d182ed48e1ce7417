//! Playback session controller.
//!
//! One call to [`SessionController::play`] drives a renderer through a
//! single item: SetAVTransportURI, Play, then a fixed-cadence status loop
//! that ends on one of the [`Outcome`] variants.

use std::thread;
use std::time::Duration;

use pmocontrol::{AvTransport, Device, PlaybackItem, TransportState};
use pmodidl::{GENERIC_AUDIO_CLASS, single_item_metadata};
use tracing::{debug, info, warn};

use crate::options::PlaybackOptions;
use crate::outcome::{ActionStage, Outcome};

/// Blocking wait between polls.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Counters of one playback attempt; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub instance_id: u32,
    pub transport_state: Option<TransportState>,
    pub confirmed_started: bool,
    /// Poll at which the current pause was first observed
    pub pause_mark: Option<u64>,
    pub poll_count: u64,
    pub start_retries: u32,
}

impl Session {
    pub fn new(instance_id: u32) -> Self {
        Self {
            instance_id,
            transport_state: None,
            confirmed_started: false,
            pause_mark: None,
            poll_count: 0,
            start_retries: 0,
        }
    }

    /// Consecutive paused polls, the current one included
    pub fn paused_polls(&self) -> u64 {
        self.pause_mark
            .map_or(0, |mark| self.poll_count.saturating_sub(mark) + 1)
    }
}

pub struct SessionController<'a> {
    transport: &'a dyn AvTransport,
    sleeper: &'a dyn Sleeper,
}

impl<'a> SessionController<'a> {
    pub fn new(transport: &'a dyn AvTransport, sleeper: &'a dyn Sleeper) -> Self {
        Self { transport, sleeper }
    }

    pub fn play(&self, device: &Device, item: &PlaybackItem, options: &PlaybackOptions) -> Outcome {
        if let Err(err) = options.validate() {
            return Outcome::ConfigurationError(err.to_string());
        }

        let instance_id = options.instance_id;

        if options.stop_only {
            if let Err(err) = self.transport.stop(device, instance_id) {
                debug!(renderer = device.friendly_name.as_str(), error = %err, "Stop failed, ignored");
            }
            return Outcome::Stopped;
        }

        let title = options.title_option.as_deref().unwrap_or(&item.title);
        let metadata = single_item_metadata(&item.id, title, &item.url, GENERIC_AUDIO_CLASS);

        info!(
            renderer = device.friendly_name.as_str(),
            id = item.id.as_str(),
            title,
            url = item.url.as_str(),
            "Starting playback"
        );

        if let Err(err) = self
            .transport
            .set_uri(device, instance_id, &item.url, &metadata)
        {
            return Outcome::action_error(ActionStage::Setup, "SetAVTransportURI", &err);
        }
        if let Err(err) = self.transport.play(device, instance_id) {
            return Outcome::action_error(ActionStage::Setup, "Play", &err);
        }

        self.sleeper.sleep(options.settle_delay);

        let mut session = Session::new(instance_id);
        let outcome = self.monitor(device, &mut session, options);
        debug!(
            id = item.id.as_str(),
            polls = session.poll_count,
            retries = session.start_retries,
            outcome = outcome.kind(),
            "Playback session ended"
        );
        outcome
    }

    fn monitor(&self, device: &Device, session: &mut Session, options: &PlaybackOptions) -> Outcome {
        loop {
            session.poll_count += 1;

            let info = match self.transport.get_transport_info(device, session.instance_id) {
                Ok(info) => info,
                Err(err) => {
                    return Outcome::action_error(ActionStage::Monitor, "GetTransportInfo", &err);
                }
            };
            if let Err(err) = self.transport.get_media_info(device, session.instance_id) {
                return Outcome::action_error(ActionStage::Monitor, "GetMediaInfo", &err);
            }
            let position = match self.transport.get_position_info(device, session.instance_id) {
                Ok(position) => position,
                Err(err) => {
                    return Outcome::action_error(ActionStage::Monitor, "GetPositionInfo", &err);
                }
            };

            if !info.status_ok() {
                warn!(status = info.current_transport_status.as_str(), "Transport fault");
                return Outcome::TransportFault {
                    status: info.current_transport_status,
                };
            }

            let state = info.current_transport_state;
            debug!(
                poll = session.poll_count,
                state = %state,
                rel_time = position.rel_time.as_str(),
                "Renderer status"
            );

            match &state {
                TransportState::Stopped => {
                    if session.confirmed_started {
                        return Outcome::Success;
                    }
                    session.start_retries += 1;
                    if session.start_retries > options.max_start_retries {
                        warn!(retries = session.start_retries, "Playback never started");
                        return Outcome::StartTimeout {
                            retries: session.start_retries,
                        };
                    }
                    debug!(retry = session.start_retries, "Still stopped, reissuing Play");
                    if let Err(err) = self.transport.play(device, session.instance_id) {
                        return Outcome::action_error(ActionStage::Monitor, "Play", &err);
                    }
                }
                TransportState::Playing => {
                    session.confirmed_started = true;
                    session.pause_mark = None;
                }
                TransportState::PausedPlayback => {
                    session.pause_mark.get_or_insert(session.poll_count);
                    let paused = session.paused_polls();

                    if let Some(limit) = options.pause_limit_polls {
                        if paused > limit {
                            warn!(paused_polls = paused, limit, "Pause limit exceeded, stopping");
                            if let Err(err) = self.transport.stop(device, session.instance_id) {
                                warn!(error = %err, "Stop after pause limit failed");
                            }
                            return Outcome::PauseLimitExceeded {
                                paused_polls: paused,
                            };
                        }
                    }

                    if let Some(threshold) = options.pause_restart_threshold_polls {
                        if paused > threshold {
                            if let Err(outcome) = self.refresh_pause(device, session, options) {
                                return outcome;
                            }
                            session.pause_mark = Some(session.poll_count);
                        }
                    }
                }
                TransportState::Other(_) => {
                    session.pause_mark = None;
                }
            }
            session.transport_state = Some(state);

            self.sleeper.sleep(options.poll_interval);
        }
    }

    /// Resumes then pauses again a renderer that would drop a long pause.
    fn refresh_pause(
        &self,
        device: &Device,
        session: &Session,
        options: &PlaybackOptions,
    ) -> Result<(), Outcome> {
        info!(paused_polls = session.paused_polls(), "Refreshing pause");

        self.transport
            .play(device, session.instance_id)
            .map_err(|err| Outcome::action_error(ActionStage::Refresh, "Play", &err))?;
        if !self.wait_for_state(device, session.instance_id, options, &TransportState::Playing)? {
            return Err(Outcome::UnpauseFailed);
        }

        self.transport
            .pause(device, session.instance_id)
            .map_err(|err| Outcome::action_error(ActionStage::Refresh, "Pause", &err))?;
        if !self.wait_for_state(
            device,
            session.instance_id,
            options,
            &TransportState::PausedPlayback,
        )? {
            return Err(Outcome::RepauseFailed);
        }

        Ok(())
    }

    fn wait_for_state(
        &self,
        device: &Device,
        instance_id: u32,
        options: &PlaybackOptions,
        wanted: &TransportState,
    ) -> Result<bool, Outcome> {
        for _ in 0..options.refresh_max_polls {
            self.sleeper.sleep(options.refresh_interval);
            let info = self
                .transport
                .get_transport_info(device, instance_id)
                .map_err(|err| Outcome::action_error(ActionStage::Refresh, "GetTransportInfo", &err))?;
            if !info.status_ok() {
                warn!(status = info.current_transport_status.as_str(), "Transport fault during pause refresh");
                return Err(Outcome::TransportFault {
                    status: info.current_transport_status,
                });
            }
            if &info.current_transport_state == wanted {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmocontrol::{ControlPointError, MediaInfo, PositionInfo, TransportInfo};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedRenderer {
        states: RefCell<VecDeque<&'static str>>,
        calls: RefCell<Vec<String>>,
        fail_set_uri: bool,
    }

    impl ScriptedRenderer {
        fn with_states(states: &[&'static str]) -> Self {
            Self {
                states: RefCell::new(states.iter().copied().collect()),
                ..Default::default()
            }
        }

        fn count(&self, action: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == action).count()
        }

        fn record(&self, action: &str) {
            self.calls.borrow_mut().push(action.to_string());
        }
    }

    impl AvTransport for ScriptedRenderer {
        fn set_uri(&self, _: &Device, _: u32, _: &str, _: &str) -> Result<(), ControlPointError> {
            self.record("SetAVTransportURI");
            if self.fail_set_uri {
                return Err(ControlPointError::SoapActionWrongBody(
                    "SetAVTransportURI".into(),
                    500,
                    String::new(),
                ));
            }
            Ok(())
        }
        fn play(&self, _: &Device, _: u32) -> Result<(), ControlPointError> {
            self.record("Play");
            Ok(())
        }
        fn pause(&self, _: &Device, _: u32) -> Result<(), ControlPointError> {
            self.record("Pause");
            Ok(())
        }
        fn stop(&self, _: &Device, _: u32) -> Result<(), ControlPointError> {
            self.record("Stop");
            Err(ControlPointError::SoapAction("unreachable".into()))
        }
        fn get_transport_info(&self, _: &Device, _: u32) -> Result<TransportInfo, ControlPointError> {
            self.record("GetTransportInfo");
            let state = self.states.borrow_mut().pop_front().unwrap_or("STOPPED");
            Ok(TransportInfo {
                current_transport_state: TransportState::from_upnp(state),
                current_transport_status: "OK".to_string(),
                current_speed: "1".to_string(),
            })
        }
        fn get_media_info(&self, _: &Device, _: u32) -> Result<MediaInfo, ControlPointError> {
            Ok(MediaInfo::default())
        }
        fn get_position_info(&self, _: &Device, _: u32) -> Result<PositionInfo, ControlPointError> {
            Ok(PositionInfo::default())
        }
    }

    #[derive(Default)]
    struct CountingSleeper(Cell<u32>);

    impl Sleeper for CountingSleeper {
        fn sleep(&self, _: Duration) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn device() -> Device {
        Device {
            friendly_name: "Test".into(),
            device_type: String::new(),
            location: String::new(),
            udn: String::new(),
            services: Vec::new(),
        }
    }

    fn item() -> PlaybackItem {
        PlaybackItem {
            id: "1".into(),
            url: "http://x/1.mp3".into(),
            title: "One".into(),
        }
    }

    #[test]
    fn paused_polls_counts_current_poll() {
        let mut session = Session::new(0);
        assert_eq!(session.paused_polls(), 0);
        session.poll_count = 4;
        session.pause_mark = Some(4);
        assert_eq!(session.paused_polls(), 1);
        session.poll_count = 9;
        assert_eq!(session.paused_polls(), 6);
    }

    #[test]
    fn stop_only_ignores_stop_errors() {
        let renderer = ScriptedRenderer::default();
        let sleeper = CountingSleeper::default();
        let options = PlaybackOptions {
            stop_only: true,
            ..Default::default()
        };

        let outcome = SessionController::new(&renderer, &sleeper).play(&device(), &item(), &options);
        assert_eq!(outcome, Outcome::Stopped);
        assert_eq!(*renderer.calls.borrow(), vec!["Stop".to_string()]);
    }

    #[test]
    fn set_uri_failure_is_a_setup_error() {
        let renderer = ScriptedRenderer {
            fail_set_uri: true,
            ..Default::default()
        };
        let sleeper = CountingSleeper::default();

        let outcome = SessionController::new(&renderer, &sleeper).play(
            &device(),
            &item(),
            &PlaybackOptions::default(),
        );
        assert!(matches!(
            outcome,
            Outcome::ActionError {
                stage: ActionStage::Setup,
                ..
            }
        ));
        assert_eq!(renderer.count("Play"), 0);
    }

    #[test]
    fn other_states_reset_the_pause_mark() {
        let renderer = ScriptedRenderer::with_states(&[
            "PLAYING",
            "PAUSED_PLAYBACK",
            "PAUSED_PLAYBACK",
            "TRANSITIONING",
            "PAUSED_PLAYBACK",
            "PAUSED_PLAYBACK",
            "STOPPED",
        ]);
        let sleeper = CountingSleeper::default();
        let options = PlaybackOptions {
            pause_limit_polls: Some(2),
            ..Default::default()
        };

        let outcome = SessionController::new(&renderer, &sleeper).play(&device(), &item(), &options);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(renderer.count("Stop"), 0);
    }

    #[test]
    fn pause_refresh_resumes_then_pauses_again() {
        let renderer = ScriptedRenderer::with_states(&[
            "PLAYING",
            "PAUSED_PLAYBACK",
            "PAUSED_PLAYBACK",
            "PAUSED_PLAYBACK",
            // refresh: Play observed, then Pause observed
            "PLAYING",
            "PAUSED_PLAYBACK",
            "PLAYING",
            "STOPPED",
        ]);
        let sleeper = CountingSleeper::default();
        let options = PlaybackOptions {
            pause_restart_threshold_polls: Some(2),
            ..Default::default()
        };

        let outcome = SessionController::new(&renderer, &sleeper).play(&device(), &item(), &options);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(renderer.count("Pause"), 1);
        // initial Play + refresh Play
        assert_eq!(renderer.count("Play"), 2);
    }

    #[test]
    fn pause_refresh_gives_up_when_renderer_stays_paused() {
        let mut states = vec!["PLAYING", "PAUSED_PLAYBACK", "PAUSED_PLAYBACK"];
        states.extend(std::iter::repeat_n("PAUSED_PLAYBACK", 3));
        let renderer = ScriptedRenderer::with_states(&states);
        let sleeper = CountingSleeper::default();
        let options = PlaybackOptions {
            pause_restart_threshold_polls: Some(1),
            refresh_max_polls: 3,
            ..Default::default()
        };

        let outcome = SessionController::new(&renderer, &sleeper).play(&device(), &item(), &options);
        assert_eq!(outcome, Outcome::UnpauseFailed);
    }
}
