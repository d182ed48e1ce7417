//! # pmoplayback - Lecture de playlists UPnP reprenables
//!
//! Two layers:
//!
//! - [`session::SessionController`] plays one item on a renderer and
//!   returns a closed [`Outcome`];
//! - [`orchestrator::Orchestrator`] walks a ContentDirectory tree, keeps a
//!   checkpoint of the item being played and, on restart, skips what was
//!   already played.
//!
//! ```no_run
//! use pmocontrol::{UpnpAvTransport, UpnpContentDirectory};
//! use pmoplayback::{
//!     FileCheckpoint, Orchestrator, OutputMode, PlaybackOptions, RendererPlayer, RunRequest,
//!     SessionController, StartSpec, ThreadSleeper,
//! };
//! # fn run(server: pmocontrol::Device, renderer: pmocontrol::Device) -> Result<(), pmoplayback::RunError> {
//! let directory = UpnpContentDirectory::default();
//! let transport = UpnpAvTransport::default();
//! let sleeper = ThreadSleeper;
//!
//! let player = RendererPlayer::new(
//!     SessionController::new(&transport, &sleeper),
//!     renderer,
//!     PlaybackOptions::default(),
//! );
//! let request = RunRequest {
//!     start: StartSpec::Path("Music/Jazz*".to_string()),
//!     output: OutputMode::Execute(Box::new(player)),
//!     resume: true,
//!     save: true,
//! };
//!
//! let checkpoint = Box::new(FileCheckpoint::new("checkpoint"));
//! let report = Orchestrator::new(&directory, &server, checkpoint, std::io::stdout()).run(&request)?;
//! println!("{} played, {} skipped", report.played, report.skipped);
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod errors;
pub mod options;
pub mod orchestrator;
pub mod outcome;
pub mod player;
pub mod playlist;
pub mod resume;
pub mod runlog;
pub mod session;
pub mod target;
pub mod walker;

pub use checkpoint::{CheckpointError, CheckpointStore, FileCheckpoint};
pub use errors::RunError;
pub use options::{OptionsError, PlaybackOptions};
pub use orchestrator::{Orchestrator, OutputMode, RunReport, RunRequest};
pub use outcome::{ActionStage, Outcome};
pub use player::{CommandPlayer, Player, RendererPlayer};
pub use playlist::{EXTENDED_MARKER, ExtendedRecord, PlaylistError, PlaylistWriter};
pub use resume::{ResumeFilter, ResumeState, Step};
pub use runlog::{LogMode, RunLog};
pub use session::{Session, SessionController, Sleeper, ThreadSleeper};
pub use target::{StartSpec, Target, resolve_target};
pub use walker::{WalkEvent, Walker};
