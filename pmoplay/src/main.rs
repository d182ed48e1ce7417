//! `pmoplay` - resumable UPnP playlist player.
//!
//! Exit status: 0 on success, 1 on any fatal condition, 2 on usage errors.

mod cli;
mod logging;
mod settings;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pmoconfig::Config;
use pmocontrol::{
    AVTRANSPORT_SERVICE, CONTENT_DIRECTORY_SERVICE, ContentDirectory, Device, DeviceLocator,
    DeviceQuery, NodeKind, PlaybackItem, UpnpAvTransport, UpnpContentDirectory,
    UpnpDeviceLocator, select_device,
};
use pmoplayback::{
    CommandPlayer, FileCheckpoint, Orchestrator, OutputMode, RendererPlayer, RunLog, RunRequest,
    SessionController, ThreadSleeper,
};
use tracing::{error, info};

use crate::cli::{BrowseArgs, Cli, Command, DeviceKind, DiscoverArgs, PlayArgs, PlaylistArgs};

/// Shared by every subcommand once the configuration is loaded.
struct App {
    config: Config,
    locator: UpnpDeviceLocator,
    wait: std::time::Duration,
    http_timeout: std::time::Duration,
}

impl App {
    fn load(cli: &Cli) -> Result<Self> {
        let config = Config::load_config(cli.config_dir.as_deref().unwrap_or(""))
            .context("Cannot load configuration")?;
        let http_timeout = settings::http_timeout(&config)?;
        Ok(Self {
            wait: settings::discovery_wait(&config, cli)?,
            locator: UpnpDeviceLocator::new(http_timeout),
            http_timeout,
            config,
        })
    }

    fn device(&self, query: &DeviceQuery, service_type: &str) -> Result<Device> {
        select_device(&self.locator, query, service_type, self.wait)
            .with_context(|| format!("Cannot find a device for {service_type}"))
    }
}

fn discover(app: &App, args: &DiscoverArgs) -> Result<()> {
    let searches: &[(&str, &str)] = match args.kind {
        DeviceKind::Renderer => &[("renderer", AVTRANSPORT_SERVICE)],
        DeviceKind::Server => &[("server", CONTENT_DIRECTORY_SERVICE)],
        DeviceKind::All => &[
            ("server", CONTENT_DIRECTORY_SERVICE),
            ("renderer", AVTRANSPORT_SERVICE),
        ],
    };

    for (label, service_type) in searches {
        let devices = app
            .locator
            .search(service_type, app.wait)
            .with_context(|| format!("Search for {service_type} failed"))?;
        for device in devices.iter().filter(|d| d.has_service(service_type)) {
            println!(
                "{}\t{}\t{}\t{}",
                label, device.friendly_name, device.location, device.udn
            );
        }
    }
    Ok(())
}

fn browse(app: &App, args: &BrowseArgs) -> Result<()> {
    let server = app.device(&args.server.query(), CONTENT_DIRECTORY_SERVICE)?;
    let directory = UpnpContentDirectory::new(app.http_timeout);
    let children = directory
        .browse(&server, &args.id)
        .with_context(|| format!("Cannot browse container {}", args.id))?;

    for node in children {
        let kind = match node.kind {
            NodeKind::Container => "container",
            NodeKind::Item => "item",
        };
        println!(
            "{}\t{}\t{}\t{}",
            kind,
            node.id,
            node.title,
            node.url.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn play(app: &App, args: &PlayArgs) -> Result<()> {
    let Some(query) = args.renderer.query() else {
        bail!("A renderer is required: --renderer or --renderer-location");
    };

    let mut options = settings::playback_options(&app.config, &args.playback)?;
    options.stop_only = args.stop;
    options.title_option = args.title.clone();
    options
        .validate()
        .context("Invalid playback options")?;

    let renderer = app.device(&query, AVTRANSPORT_SERVICE)?;
    let url = args.url.clone().unwrap_or_default();
    let item = PlaybackItem {
        id: args.id.clone(),
        title: args.title.clone().unwrap_or_else(|| url.clone()),
        url,
    };

    let transport = UpnpAvTransport::new(app.http_timeout);
    let sleeper = ThreadSleeper;
    let outcome = SessionController::new(&transport, &sleeper).play(&renderer, &item, &options);
    if !outcome.is_success() {
        bail!("Playback on {} failed: {}", renderer.friendly_name, outcome);
    }
    info!(renderer = renderer.friendly_name.as_str(), %outcome, "Done");
    Ok(())
}

fn playlist(app: &App, args: &PlaylistArgs) -> Result<()> {
    let options = settings::playback_options(&app.config, &args.playback)?;
    options
        .validate()
        .context("Invalid playback options")?;

    let server = app.device(&args.server.query(), CONTENT_DIRECTORY_SERVICE)?;
    let directory = UpnpContentDirectory::new(app.http_timeout);
    let transport = UpnpAvTransport::new(app.http_timeout);
    let sleeper = ThreadSleeper;

    let output = if args.output.playlist {
        OutputMode::Playlist
    } else if args.output.extended {
        OutputMode::ExtendedPlaylist
    } else if args.output.dry_run {
        OutputMode::DryRun
    } else if let Some(program) = &args.output.command {
        let mut player = CommandPlayer::new(program.clone(), args.command_args.clone());
        if let Some(option) = &args.title_option {
            player = player.with_title_option(option.clone());
        }
        OutputMode::Execute(Box::new(player))
    } else {
        let Some(query) = args.renderer.query() else {
            bail!(
                "Nothing to do: give a renderer, --command, --playlist, --extended or --dry-run"
            );
        };
        let renderer = app.device(&query, AVTRANSPORT_SERVICE)?;
        let controller = SessionController::new(&transport, &sleeper);
        OutputMode::Execute(Box::new(RendererPlayer::new(controller, renderer, options)))
    };

    let checkpoint_path = match &args.checkpoint_file {
        Some(path) => path.clone(),
        None => app.config.get_checkpoint_file()?,
    };
    info!(path = %checkpoint_path.display(), "Using checkpoint file");

    let strict = args.strict_resume || app.config.get_strict_resume()?;
    let mut orchestrator = Orchestrator::new(
        &directory,
        &server,
        Box::new(FileCheckpoint::new(checkpoint_path)),
        io::stdout().lock(),
    )
    .strict_resume(strict);
    if let Some(path) = &args.log_file {
        let run_log = RunLog::open(path, args.log_mode())
            .with_context(|| format!("Cannot open log file {}", path.display()))?;
        orchestrator = orchestrator.with_run_log(run_log);
    }

    let request = RunRequest {
        start: args.start.spec(),
        output,
        resume: args.resume,
        save: args.save,
    };
    orchestrator.run(&request)?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let logging = logging::init(&cli)?;
    let app = App::load(&cli)?;
    logging.apply_config_level(&app.config.get_log_level()?)?;

    match &cli.command {
        Command::Discover(args) => discover(&app, args),
        Command::Browse(args) => browse(&app, args),
        Command::Play(args) => play(&app, args),
        Command::Playlist(args) => playlist(&app, args),
    }
}

fn main() -> ExitCode {
    // `clap` exits with status 2 on usage errors.
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
