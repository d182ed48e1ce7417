use pmocontrol::{ControlPointError, PlaybackItem};
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::outcome::Outcome;
use crate::playlist::PlaylistError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    ControlPoint(#[from] ControlPointError),

    #[error("Path {path}: nothing matches '{component}' under container {parent}")]
    PathNotFound {
        path: String,
        component: String,
        parent: String,
    },

    #[error("No container or item titled '{0}'")]
    NameNotFound(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    #[error("Run log: {0}")]
    RunLog(#[source] std::io::Error),

    #[error("Playback of '{}' ({}) failed: {outcome}", .item.title, .item.id)]
    Playback { item: PlaybackItem, outcome: Outcome },

    #[error("Checkpointed item {0} was not found in the playlist")]
    ResumeNotFound(String),
}
