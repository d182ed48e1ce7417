//! Configuration values, overridden by command line flags.

use std::time::Duration;

use anyhow::{Context, Result};
use pmoconfig::Config;
use pmoplayback::PlaybackOptions;

use crate::cli::{Cli, PlaybackArgs};

fn to_u32(value: u64, name: &str) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("{name} is too large: {value}"))
}

pub fn discovery_wait(config: &Config, cli: &Cli) -> Result<Duration> {
    let secs = match cli.wait {
        Some(secs) => secs,
        None => config.get_discovery_timeout_secs()?,
    };
    Ok(Duration::from_secs(secs))
}

pub fn http_timeout(config: &Config) -> Result<Duration> {
    Ok(Duration::from_secs(config.get_http_timeout_secs()?))
}

/// Session options. Pause flags replace both pause settings of the
/// configuration, so a flag never clashes with a configured policy.
pub fn playback_options(config: &Config, args: &PlaybackArgs) -> Result<PlaybackOptions> {
    let (pause_limit_polls, pause_restart_threshold_polls) =
        if args.pause_limit.is_some() || args.pause_refresh.is_some() {
            (args.pause_limit, args.pause_refresh)
        } else {
            (
                config.get_pause_limit_polls()?,
                config.get_pause_refresh_polls()?,
            )
        };

    let poll_interval = match args.poll_interval {
        Some(secs) => secs,
        None => config.get_poll_interval_secs()?,
    };
    let max_start_retries = match args.max_start_retries {
        Some(retries) => retries,
        None => config.get_max_start_retries()?,
    };
    let instance_id = match args.instance_id {
        Some(id) => id,
        None => config.get_instance_id()?,
    };

    Ok(PlaybackOptions {
        settle_delay: Duration::from_secs(config.get_settle_delay_secs()?),
        poll_interval: Duration::from_secs(poll_interval),
        max_start_retries: to_u32(max_start_retries, "max_start_retries")?,
        pause_restart_threshold_polls,
        pause_limit_polls,
        title_option: None,
        stop_only: false,
        instance_id: to_u32(instance_id, "instance_id")?,
        refresh_max_polls: to_u32(config.get_refresh_max_polls()?, "refresh_max_polls")?,
        refresh_interval: Duration::from_secs(config.get_refresh_interval_secs()?),
    })
}
