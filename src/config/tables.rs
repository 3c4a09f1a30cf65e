use super::defaults;
use super::models::{AppConfig, LogLevel};
use playsync_core::config::Surface;
use playsync_core::scroll::AlignMode;
use serde::{Deserialize, Serialize};

pub(super) const TABLE_NAMES: [&str; 5] = ["logging", "sync", "autoscroll", "progress", "replay"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    sync: SyncTable,
    #[serde(default)]
    autoscroll: AutoscrollConfig,
    #[serde(default)]
    progress: ProgressConfig,
    #[serde(default)]
    replay: ReplayConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            log_level: tables.logging.log_level,
            surface: tables.sync.surface,
            epsilon: tables.sync.epsilon,
            lock_window_ms: tables.sync.lock_window_ms,
            programmatic_guard_ms: tables.sync.programmatic_guard_ms,
            auto_scroll: tables.sync.auto_scroll,
            animate_scroll: tables.sync.animate_scroll,
            align_mode: tables.autoscroll.mode,
            comfort_margin: tables.autoscroll.comfort_margin,
            edge_margin: tables.autoscroll.edge_margin,
            scroll_tolerance: tables.autoscroll.tolerance,
            progress_interval_secs: tables.progress.interval_secs,
            tick_ms: tables.replay.tick_ms,
            speed: tables.replay.speed,
            cache_dir: tables.replay.cache_dir,
            viewport_height: tables.replay.viewport_height,
            line_width_chars: tables.replay.line_width_chars,
            line_height: tables.replay.line_height,
            row_gap: tables.replay.row_gap,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            sync: SyncTable {
                surface: config.surface,
                epsilon: config.epsilon,
                lock_window_ms: config.lock_window_ms,
                programmatic_guard_ms: config.programmatic_guard_ms,
                auto_scroll: config.auto_scroll,
                animate_scroll: config.animate_scroll,
            },
            autoscroll: AutoscrollConfig {
                mode: config.align_mode,
                comfort_margin: config.comfort_margin,
                edge_margin: config.edge_margin,
                tolerance: config.scroll_tolerance,
            },
            progress: ProgressConfig {
                interval_secs: config.progress_interval_secs,
            },
            replay: ReplayConfig {
                tick_ms: config.tick_ms,
                speed: config.speed,
                cache_dir: config.cache_dir.clone(),
                viewport_height: config.viewport_height,
                line_width_chars: config.line_width_chars,
                line_height: config.line_height,
                row_gap: config.row_gap,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct SyncTable {
    #[serde(default)]
    surface: Surface,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    epsilon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lock_window_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    programmatic_guard_ms: Option<u64>,
    #[serde(default = "defaults::default_auto_scroll")]
    auto_scroll: bool,
    #[serde(default = "defaults::default_animate_scroll")]
    animate_scroll: bool,
}

impl Default for SyncTable {
    fn default() -> Self {
        SyncTable {
            surface: Surface::default(),
            epsilon: None,
            lock_window_ms: None,
            programmatic_guard_ms: None,
            auto_scroll: defaults::default_auto_scroll(),
            animate_scroll: defaults::default_animate_scroll(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct AutoscrollConfig {
    #[serde(default)]
    mode: AlignMode,
    #[serde(default = "defaults::default_comfort_margin")]
    comfort_margin: f64,
    #[serde(default = "defaults::default_edge_margin")]
    edge_margin: f64,
    #[serde(default = "defaults::default_scroll_tolerance")]
    tolerance: f64,
}

impl Default for AutoscrollConfig {
    fn default() -> Self {
        AutoscrollConfig {
            mode: AlignMode::default(),
            comfort_margin: defaults::default_comfort_margin(),
            edge_margin: defaults::default_edge_margin(),
            tolerance: defaults::default_scroll_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ProgressConfig {
    #[serde(default = "defaults::default_progress_interval_secs")]
    interval_secs: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            interval_secs: defaults::default_progress_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ReplayConfig {
    #[serde(default = "defaults::default_tick_ms")]
    tick_ms: u64,
    #[serde(default = "defaults::default_speed")]
    speed: f64,
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
    #[serde(default = "defaults::default_viewport_height")]
    viewport_height: f64,
    #[serde(default = "defaults::default_line_width_chars")]
    line_width_chars: f64,
    #[serde(default = "defaults::default_line_height")]
    line_height: f64,
    #[serde(default = "defaults::default_row_gap")]
    row_gap: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            tick_ms: defaults::default_tick_ms(),
            speed: defaults::default_speed(),
            cache_dir: defaults::default_cache_dir(),
            viewport_height: defaults::default_viewport_height(),
            line_width_chars: defaults::default_line_width_chars(),
            line_height: defaults::default_line_height(),
            row_gap: defaults::default_row_gap(),
        }
    }
}
