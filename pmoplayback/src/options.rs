use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("pause limit and pause refresh threshold are mutually exclusive")]
    ConflictingPausePolicies,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Tuning of one playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Wait between the initial Play and the first status poll
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    /// STOPPED polls tolerated before PLAYING was ever seen
    pub max_start_retries: u32,
    /// Paused polls after which the renderer is briefly resumed and paused again
    pub pause_restart_threshold_polls: Option<u64>,
    /// Paused polls after which playback is stopped
    pub pause_limit_polls: Option<u64>,
    /// Title sent in the metadata instead of the item title
    pub title_option: Option<String>,
    /// Only send Stop
    pub stop_only: bool,
    pub instance_id: u32,
    pub refresh_max_polls: u32,
    pub refresh_interval: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            max_start_retries: 10,
            pause_restart_threshold_polls: None,
            pause_limit_polls: None,
            title_option: None,
            stop_only: false,
            instance_id: 0,
            refresh_max_polls: 20,
            refresh_interval: Duration::from_secs(1),
        }
    }
}

impl PlaybackOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.pause_limit_polls.is_some() && self.pause_restart_threshold_polls.is_some() {
            return Err(OptionsError::ConflictingPausePolicies);
        }
        if self.poll_interval.is_zero() && !self.stop_only {
            return Err(OptionsError::ZeroPollInterval);
        }
        Ok(())
    }
}
