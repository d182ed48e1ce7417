//! Command line arguments as parsed by `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use pmocontrol::DeviceQuery;
use pmoplayback::{LogMode, StartSpec};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory
    ///
    /// [default: $PMOPLAY_CONFIG, ./.pmoplay or ~/.pmoplay]
    #[arg(long, global = true, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub config_dir: Option<String>,

    /// SSDP listening window, in seconds [default: discovery.timeout_secs]
    #[arg(long, global = true, value_name = "SECS")]
    pub wait: Option<u64>,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, global = true, default_value_t = false, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List media servers and renderers answering on the local network
    Discover(DiscoverArgs),
    /// List the children of a media server container
    Browse(BrowseArgs),
    /// Play one URL on a renderer and wait for the end of playback
    Play(PlayArgs),
    /// Walk a media server tree and play, list or announce every item
    Playlist(PlaylistArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceKind {
    Renderer,
    Server,
    All,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    #[arg(long, value_enum, default_value_t = DeviceKind::All)]
    pub kind: DeviceKind,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ServerArgs {
    /// Media server friendly name (glob)
    #[arg(short, long, value_name = "GLOB")]
    pub server: Option<String>,

    /// Media server description URL, skips discovery
    #[arg(long, value_name = "URL", value_hint = ValueHint::Url)]
    pub server_location: Option<String>,
}

impl ServerArgs {
    pub fn query(&self) -> DeviceQuery {
        device_query(self.server.as_deref(), self.server_location.as_deref())
    }
}

#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct RendererArgs {
    /// Renderer friendly name (glob)
    #[arg(short, long, value_name = "GLOB")]
    pub renderer: Option<String>,

    /// Renderer description URL, skips discovery
    #[arg(long, value_name = "URL", value_hint = ValueHint::Url)]
    pub renderer_location: Option<String>,
}

impl RendererArgs {
    pub fn query(&self) -> Option<DeviceQuery> {
        if self.renderer.is_none() && self.renderer_location.is_none() {
            return None;
        }
        Some(device_query(
            self.renderer.as_deref(),
            self.renderer_location.as_deref(),
        ))
    }
}

fn device_query(name: Option<&str>, location: Option<&str>) -> DeviceQuery {
    match (location, name) {
        (Some(location), _) => DeviceQuery::Location(location.to_string()),
        (None, Some(name)) => DeviceQuery::Name(name.to_string()),
        (None, None) => DeviceQuery::Name("*".to_string()),
    }
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Container object id
    #[arg(default_value = "0")]
    pub id: String,
}

/// Session tuning; unset values come from the `playback` config section.
#[derive(Debug, Args)]
pub struct PlaybackArgs {
    /// Stop playback once the renderer has been paused for more than POLLS polls
    #[arg(long, value_name = "POLLS", conflicts_with = "pause_refresh")]
    pub pause_limit: Option<u64>,

    /// Briefly resume then pause again a renderer paused for more than POLLS polls
    #[arg(long, value_name = "POLLS")]
    pub pause_refresh: Option<u64>,

    /// Seconds between two status polls
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// STOPPED polls tolerated before playback is confirmed
    #[arg(long, value_name = "N")]
    pub max_start_retries: Option<u64>,

    /// AVTransport instance
    #[arg(long, value_name = "ID")]
    pub instance_id: Option<u64>,
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub renderer: RendererArgs,

    #[command(flatten)]
    pub playback: PlaybackArgs,

    /// Title sent to the renderer [default: the URL]
    #[arg(short, long)]
    pub title: Option<String>,

    /// Object id sent in the DIDL-Lite metadata
    #[arg(long, default_value = "0")]
    pub id: String,

    /// Only send Stop to the renderer
    #[arg(long, default_value_t = false, conflicts_with = "url")]
    pub stop: bool,

    /// Media URL
    #[arg(required_unless_present = "stop", value_hint = ValueHint::Url)]
    pub url: Option<String>,
}

#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct StartArgs {
    /// Start at this container id [default: 0]
    #[arg(long = "start-id", value_name = "ID")]
    pub id: Option<String>,

    /// Start at the first container or item whose title matches
    #[arg(long = "start-name", value_name = "GLOB")]
    pub name: Option<String>,

    /// Start at a '/'-separated path of title globs
    #[arg(long = "start-path", value_name = "PATH")]
    pub path: Option<String>,
}

impl StartArgs {
    pub fn spec(&self) -> StartSpec {
        if let Some(name) = &self.name {
            StartSpec::Name(name.clone())
        } else if let Some(path) = &self.path {
            StartSpec::Path(path.clone())
        } else if let Some(id) = &self.id {
            StartSpec::Id(id.clone())
        } else {
            StartSpec::default()
        }
    }
}

/// Without any of these flags items are played on the renderer.
#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct OutputArgs {
    /// Run PROGRAM once per item, the URL as last argument
    #[arg(long, value_name = "PROGRAM", value_hint = ValueHint::CommandName)]
    pub command: Option<String>,

    /// Print one URL per line
    #[arg(long, default_value_t = false)]
    pub playlist: bool,

    /// Print a #EXTITEM: record before each URL
    #[arg(long, default_value_t = false)]
    pub extended: bool,

    /// Only tell what would be played
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct PlaylistArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub renderer: RendererArgs,

    #[command(flatten)]
    pub start: StartArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Argument passed to the --command program before the URL (repeatable)
    #[arg(long = "command-arg", value_name = "ARG", requires = "command", allow_hyphen_values = true)]
    pub command_args: Vec<String>,

    /// Option passed to the --command program before the item title
    #[arg(long, value_name = "OPTION", requires = "command", allow_hyphen_values = true)]
    pub title_option: Option<String>,

    #[command(flatten)]
    pub playback: PlaybackArgs,

    /// Skip items up to the one recorded in the checkpoint
    #[arg(long, default_value_t = false)]
    pub resume: bool,

    /// Record the item being played in the checkpoint
    #[arg(long, default_value_t = false)]
    pub save: bool,

    /// Fail when the checkpointed item is not found [default: resume.strict]
    #[arg(long, default_value_t = false)]
    pub strict_resume: bool,

    /// Checkpoint file [default: resume.checkpoint_file]
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub checkpoint_file: Option<PathBuf>,

    /// Record played items and finished containers in FILE
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Add to an existing log file (default)
    #[arg(long, default_value_t = false, requires = "log_file", conflicts_with = "overwrite")]
    pub append: bool,

    /// Truncate the log file first
    #[arg(long, default_value_t = false, requires = "log_file")]
    pub overwrite: bool,
}

impl PlaylistArgs {
    pub fn log_mode(&self) -> LogMode {
        if self.overwrite {
            LogMode::Overwrite
        } else {
            LogMode::Append
        }
    }
}
