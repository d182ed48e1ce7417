//! What "play this item" means for a run in execute mode.

use std::process::Command;

use pmocontrol::{Device, PlaybackItem};
use tracing::{debug, warn};

use crate::options::PlaybackOptions;
use crate::outcome::{ActionStage, Outcome};
use crate::session::SessionController;

pub trait Player {
    fn play(&self, item: &PlaybackItem) -> Outcome;
}

/// Drives a renderer in-process through a [`SessionController`].
pub struct RendererPlayer<'a> {
    controller: SessionController<'a>,
    renderer: Device,
    options: PlaybackOptions,
}

impl<'a> RendererPlayer<'a> {
    pub fn new(controller: SessionController<'a>, renderer: Device, options: PlaybackOptions) -> Self {
        Self {
            controller,
            renderer,
            options,
        }
    }
}

impl Player for RendererPlayer<'_> {
    fn play(&self, item: &PlaybackItem) -> Outcome {
        self.controller.play(&self.renderer, item, &self.options)
    }
}

/// Runs an external program once per item.
///
/// Command line: `program args... [title_option title] url`.
/// Exit status 0 is success.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    title_option: Option<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            title_option: None,
        }
    }

    /// Passes the item title to the program, preceded by `option`
    pub fn with_title_option(mut self, option: impl Into<String>) -> Self {
        self.title_option = Some(option.into());
        self
    }

    pub fn command(&self, item: &PlaybackItem) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(option) = &self.title_option {
            command.arg(option).arg(&item.title);
        }
        command.arg(&item.url);
        command
    }
}

impl Player for CommandPlayer {
    fn play(&self, item: &PlaybackItem) -> Outcome {
        debug!(program = self.program.as_str(), id = item.id.as_str(), "Spawning player");
        match self.command(item).status() {
            Ok(status) if status.success() => Outcome::Success,
            Ok(status) => {
                warn!(program = self.program.as_str(), %status, "Player failed");
                Outcome::ActionError {
                    stage: ActionStage::External,
                    action: self.program.clone(),
                    message: format!("exited with {}", status),
                    http_status: None,
                    upnp_error_code: None,
                }
            }
            Err(err) => Outcome::ActionError {
                stage: ActionStage::External,
                action: self.program.clone(),
                message: err.to_string(),
                http_status: None,
                upnp_error_code: None,
            },
        }
    }
}
