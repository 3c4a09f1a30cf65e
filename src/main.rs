//! Entry point for the transcript replay host.
//!
//! Parses command-line arguments, loads `conf/config.toml`, and replays a
//! transcript through the sync engine against a simulated playback clock.

mod cancellation;
mod config;
mod layout;
mod replay;

use crate::cancellation::CancellationToken;
use crate::config::{load_config, serialize_config};
use crate::replay::{ReplayOptions, run_replay};
use anyhow::{Context, Result, anyhow, bail};
use playsync_core::time::format_clock;
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";
const USAGE: &str = "Usage: playsync <transcript> [--config PATH] [--media-id ID] \
[--duration SECS] [--speed X] [--pause-at SECS] [--seek-at SECS:SEGMENT] \
[--scroll-at SECS:PIXELS] [--restart] [--print-config]";

#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    config_path: PathBuf,
    print_config: bool,
    replay: ReplayOptions,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    if args.print_config {
        print!("{}", serialize_config(&config)?);
        return Ok(());
    }
    if !args.replay.transcript.exists() {
        bail!("File not found: {}", args.replay.transcript.display());
    }
    info!(
        path = %args.replay.transcript.display(),
        level = %config.log_level,
        "Starting transcript replay"
    );

    let cancel = CancellationToken::new();
    cancel.install_ctrlc_handler()?;
    let summary = run_replay(&config, &args.replay, &cancel)?;
    info!(
        media_id = %summary.media_id,
        position = %format_clock(summary.final_position),
        duration = %format_clock(summary.duration),
        active_index = ?summary.active_index,
        ticks = summary.ticks,
        scrolls = summary.scrolls,
        seeks = summary.seeks,
        interrupted = summary.interrupted,
        "Replay finished"
    );
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut print_config = false;
    let mut replay = ReplayOptions::default();
    let mut transcript = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("Missing value for {flag}\n{USAGE}"))
        };
        match arg.as_str() {
            "--config" => config_path = PathBuf::from(value("--config")?),
            "--media-id" => replay.media_id = Some(value("--media-id")?),
            "--duration" => replay.duration = Some(parse_secs("--duration", &value("--duration")?)?),
            "--speed" => replay.speed = Some(parse_secs("--speed", &value("--speed")?)?),
            "--pause-at" => replay.pause_at = Some(parse_secs("--pause-at", &value("--pause-at")?)?),
            "--seek-at" => {
                let raw = value("--seek-at")?;
                let (at, target) = split_pair("--seek-at", &raw)?;
                let index = target
                    .parse::<usize>()
                    .with_context(|| format!("Invalid segment index in --seek-at {raw}"))?;
                replay.seek_at.push((parse_secs("--seek-at", at)?, index));
            }
            "--scroll-at" => {
                let raw = value("--scroll-at")?;
                let (at, delta) = split_pair("--scroll-at", &raw)?;
                let delta = delta
                    .parse::<f64>()
                    .ok()
                    .filter(|d| d.is_finite())
                    .ok_or_else(|| anyhow!("Invalid pixel delta in --scroll-at {raw}"))?;
                replay.scroll_at.push((parse_secs("--scroll-at", at)?, delta));
            }
            "--restart" => replay.restart = true,
            "--print-config" => print_config = true,
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("Unknown option {flag}\n{USAGE}"),
            path => {
                if transcript.replace(PathBuf::from(path)).is_some() {
                    bail!("Only one transcript may be given\n{USAGE}");
                }
            }
        }
    }

    match transcript {
        Some(path) => replay.transcript = path,
        None if print_config => {}
        None => bail!("{USAGE}"),
    }
    Ok(CliArgs {
        config_path,
        print_config,
        replay,
    })
}

fn split_pair<'a>(flag: &str, raw: &'a str) -> Result<(&'a str, &'a str)> {
    raw.rsplit_once(':')
        .ok_or_else(|| anyhow!("{flag} expects SECS:VALUE, got {raw}"))
}

fn parse_secs(flag: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| anyhow!("{flag} expects a non-negative number, got {raw}"))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
