//! Playlist runs: resolve a start point, walk it, act on every item.

use std::io::Write;
use std::iter;

use pmocontrol::{ContentDirectory, ControlPointError, Device, PlaybackItem};
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::errors::RunError;
use crate::player::Player;
use crate::playlist::PlaylistWriter;
use crate::resume::{ResumeFilter, ResumeState, Step};
use crate::runlog::RunLog;
use crate::target::{StartSpec, Target, resolve_target};
use crate::walker::{WalkEvent, Walker};

/// What to do with each item; exactly one mode per run.
pub enum OutputMode<'a> {
    Execute(Box<dyn Player + 'a>),
    Playlist,
    ExtendedPlaylist,
    DryRun,
}

impl OutputMode<'_> {
    pub fn is_execute(&self) -> bool {
        matches!(self, OutputMode::Execute(_))
    }
}

pub struct RunRequest<'a> {
    pub start: StartSpec,
    pub output: OutputMode<'a>,
    /// Skip items up to the checkpointed one
    pub resume: bool,
    /// Keep the checkpoint up to date (execute mode only)
    pub save: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Items played, listed or announced, depending on the mode
    pub played: usize,
    pub skipped: usize,
    pub containers: usize,
    /// The checkpointed item never showed up
    pub resume_not_found: bool,
}

pub struct Orchestrator<'a, W: Write> {
    directory: &'a dyn ContentDirectory,
    server: &'a Device,
    checkpoint: Box<dyn CheckpointStore + 'a>,
    output: PlaylistWriter<W>,
    run_log: Option<RunLog>,
    strict_resume: bool,
}

impl<'a, W: Write> Orchestrator<'a, W> {
    pub fn new(
        directory: &'a dyn ContentDirectory,
        server: &'a Device,
        checkpoint: Box<dyn CheckpointStore + 'a>,
        out: W,
    ) -> Self {
        Self {
            directory,
            server,
            checkpoint,
            output: PlaylistWriter::new(out),
            run_log: None,
            strict_resume: false,
        }
    }

    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    /// Turns a missing checkpointed item into [`RunError::ResumeNotFound`]
    pub fn strict_resume(mut self, strict: bool) -> Self {
        self.strict_resume = strict;
        self
    }

    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    pub fn run(&mut self, request: &RunRequest<'_>) -> Result<RunReport, RunError> {
        let resume_state = if request.resume {
            let stored = self.checkpoint.load()?;
            if stored.is_none() {
                info!("No checkpoint to resume from, starting from the beginning");
            }
            ResumeState::from_checkpoint(stored)
        } else {
            ResumeState::Inactive
        };
        if let Some(target) = resume_state.target() {
            info!(checkpoint = target, "Resuming after checkpoint");
        }

        let directory = self.directory;
        let server = self.server;
        let events: Box<dyn Iterator<Item = Result<WalkEvent, ControlPointError>> + 'a> =
            match resolve_target(directory, server, &request.start)? {
                Target::Container { id, title } => {
                    info!(id = id.as_str(), title = title.as_str(), "Walking container");
                    Box::new(Walker::new(directory, server, &id))
                }
                Target::Item(item) => Box::new(iter::once(Ok(WalkEvent::Item(item)))),
            };

        let mut report = RunReport::default();
        let mut steps = ResumeFilter::new(events, resume_state);

        for step in steps.by_ref() {
            match step? {
                Step::Skip(item) => {
                    info!(id = item.id.as_str(), title = item.title.as_str(), "skipping");
                    report.skipped += 1;
                }
                Step::Play(item) => {
                    self.handle_item(request, &item)?;
                    report.played += 1;
                }
                Step::ContainerDone { id, title } => {
                    report.containers += 1;
                    if let Some(log) = self.run_log.as_mut() {
                        log.container(&id, &title).map_err(RunError::RunLog)?;
                    }
                }
            }
        }
        self.output.flush()?;

        if let Some(target) = steps.state().target() {
            warn!(checkpoint = target, "Checkpointed item not found, nothing was resumed");
            if self.strict_resume {
                return Err(RunError::ResumeNotFound(target.to_string()));
            }
            report.resume_not_found = true;
        }

        if request.output.is_execute() && request.save {
            self.checkpoint.clear()?;
        }

        info!(
            played = report.played,
            skipped = report.skipped,
            containers = report.containers,
            "Run complete"
        );
        Ok(report)
    }

    fn handle_item(&mut self, request: &RunRequest<'_>, item: &PlaybackItem) -> Result<(), RunError> {
        match &request.output {
            OutputMode::Execute(player) => {
                if request.save {
                    self.checkpoint.store(&item.id)?;
                }
                let outcome = player.play(item);
                if outcome.is_success() {
                    if let Some(log) = self.run_log.as_mut() {
                        log.played(item).map_err(RunError::RunLog)?;
                    }
                    Ok(())
                } else {
                    if let Some(log) = self.run_log.as_mut() {
                        log.failed(item, &outcome).map_err(RunError::RunLog)?;
                    }
                    Err(RunError::Playback {
                        item: item.clone(),
                        outcome,
                    })
                }
            }
            OutputMode::Playlist => Ok(self.output.write_plain(item)?),
            OutputMode::ExtendedPlaylist => Ok(self.output.write_extended(item)?),
            OutputMode::DryRun => {
                info!(
                    id = item.id.as_str(),
                    title = item.title.as_str(),
                    url = item.url.as_str(),
                    "Would play"
                );
                let note = format!("would play {} ({}) {}", item.title, item.id, item.url);
                Ok(self.output.write_note(&note)?)
            }
        }
    }
}
