//! Configuration loading for the replay host.
//!
//! All tunable settings are loaded from `conf/config.toml` if present. Missing
//! or invalid entries fall back to defaults so a replay can always start.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{AppConfig, LogLevel};
