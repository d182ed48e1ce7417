//! Terminal result of one playback attempt.

use std::fmt;

use pmocontrol::ControlPointError;

/// Phase in which a remote action failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStage {
    /// SetAVTransportURI / initial Play
    Setup,
    /// Status polling, or a Play reissued while waiting for the start
    Monitor,
    /// Play / Pause of the pause-refresh exchange
    Refresh,
    /// External player process
    External,
}

impl fmt::Display for ActionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionStage::Setup => "setup",
            ActionStage::Monitor => "monitor",
            ActionStage::Refresh => "pause refresh",
            ActionStage::External => "external player",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Track played to its end
    Success,
    /// Stop-only request completed
    Stopped,
    /// Renderer never reached PLAYING
    StartTimeout { retries: u32 },
    /// Paused for longer than the configured limit; Stop has been sent
    PauseLimitExceeded { paused_polls: u64 },
    /// Pause refresh: PLAYING not observed after Play
    UnpauseFailed,
    /// Pause refresh: PAUSED_PLAYBACK not observed after Pause
    RepauseFailed,
    /// `CurrentTransportStatus` other than OK
    TransportFault { status: String },
    ActionError {
        stage: ActionStage,
        action: String,
        message: String,
        http_status: Option<u16>,
        upnp_error_code: Option<u32>,
    },
    ConfigurationError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::Stopped)
    }

    pub fn action_error(stage: ActionStage, action: &str, err: &ControlPointError) -> Self {
        Outcome::ActionError {
            stage,
            action: action.to_string(),
            message: err.to_string(),
            http_status: err.http_status(),
            upnp_error_code: err.upnp_error_code(),
        }
    }

    /// Short machine-friendly name, used in run logs
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Stopped => "stopped",
            Outcome::StartTimeout { .. } => "start-timeout",
            Outcome::PauseLimitExceeded { .. } => "pause-limit-exceeded",
            Outcome::UnpauseFailed => "unpause-failed",
            Outcome::RepauseFailed => "repause-failed",
            Outcome::TransportFault { .. } => "transport-fault",
            Outcome::ActionError { .. } => "action-error",
            Outcome::ConfigurationError(_) => "configuration-error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "played to the end"),
            Outcome::Stopped => write!(f, "stopped"),
            Outcome::StartTimeout { retries } => {
                write!(f, "playback did not start after {} retries", retries)
            }
            Outcome::PauseLimitExceeded { paused_polls } => {
                write!(f, "paused for {} polls, playback stopped", paused_polls)
            }
            Outcome::UnpauseFailed => write!(f, "renderer did not resume during pause refresh"),
            Outcome::RepauseFailed => write!(f, "renderer did not pause again during pause refresh"),
            Outcome::TransportFault { status } => write!(f, "transport status {}", status),
            Outcome::ActionError {
                stage,
                action,
                message,
                ..
            } => write!(f, "{} failed ({}): {}", action, stage, message),
            Outcome::ConfigurationError(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_and_stopped_are_successful() {
        assert!(Outcome::Success.is_success());
        assert!(Outcome::Stopped.is_success());
        assert!(!Outcome::StartTimeout { retries: 11 }.is_success());
        assert!(!Outcome::ConfigurationError("x".into()).is_success());
    }

    #[test]
    fn action_error_keeps_upnp_details() {
        let err = ControlPointError::SoapUpnpParseError(
            "Play".to_string(),
            701,
            "Transition not available".to_string(),
            500,
        );
        match Outcome::action_error(ActionStage::Setup, "Play", &err) {
            Outcome::ActionError {
                stage,
                http_status,
                upnp_error_code,
                ..
            } => {
                assert_eq!(stage, ActionStage::Setup);
                assert_eq!(http_status, Some(500));
                assert_eq!(upnp_error_code, Some(701));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
