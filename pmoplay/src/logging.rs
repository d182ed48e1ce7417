//! `tracing` subscriber setup.
//!
//! The filter is chosen in this order:
//! 1. `RUST_LOG`
//! 2. `-q` / `-v` / `-vv`
//! 3. `log.level` from the configuration
//!
//! The configuration is only known after the subscriber is installed, so
//! the filter sits behind a reload layer and is swapped once it is loaded.

use anyhow::{Context, Result};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

use crate::cli::Cli;

const DEFAULT_LEVEL: &str = "info";

/// Crates whose level follows `-v` / `-q` and the configuration; the others
/// stay at `warn`.
const OWN_CRATES: &[&str] = &[
    "pmoplay",
    "pmoplayback",
    "pmocontrol",
    "pmoupnp",
    "pmodidl",
    "pmoconfig",
];

pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    from_config: bool,
}

fn filter_for(level: &str) -> Result<EnvFilter> {
    let directives = OWN_CRATES
        .iter()
        .map(|name| format!("{name}={level}"))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log level '{level}'"))
}

/// Installs the global subscriber; logs go to stderr.
pub fn init(cli: &Cli) -> Result<Logging> {
    let (filter, from_config) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, false),
        Err(_) => match (cli.quiet, cli.verbose) {
            (true, _) => (filter_for("warn")?, false),
            (false, 0) => (filter_for(DEFAULT_LEVEL)?, true),
            (false, 1) => (filter_for("debug")?, false),
            (false, _) => (filter_for("trace")?, false),
        },
    };

    let (filter, handle) = reload::Layer::new(filter);
    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .try_init()
        .context("Cannot install the log subscriber")?;

    Ok(Logging {
        handle,
        from_config,
    })
}

impl Logging {
    /// Applies `log.level` unless `RUST_LOG` or a flag already decided.
    pub fn apply_config_level(&self, level: &str) -> Result<()> {
        if !self.from_config {
            return Ok(());
        }
        self.handle
            .reload(filter_for(level)?)
            .context("Cannot change the log filter")
    }
}
