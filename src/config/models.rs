use playsync_core::config::{Surface, SyncConfig};
use playsync_core::scroll::{AlignMode, ScrollConfig};
use playsync_core::throttle::ThrottleConfig;
use serde::{Deserialize, Serialize};

/// High-level replay configuration; deserializable from TOML.
///
/// Engine timings left unset fall back to the preset of the chosen surface.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub epsilon: Option<f64>,
    #[serde(default)]
    pub lock_window_ms: Option<u64>,
    #[serde(default)]
    pub programmatic_guard_ms: Option<u64>,
    #[serde(default = "crate::config::defaults::default_auto_scroll")]
    pub auto_scroll: bool,
    #[serde(default = "crate::config::defaults::default_animate_scroll")]
    pub animate_scroll: bool,
    #[serde(default)]
    pub align_mode: AlignMode,
    #[serde(default = "crate::config::defaults::default_comfort_margin")]
    pub comfort_margin: f64,
    #[serde(default = "crate::config::defaults::default_edge_margin")]
    pub edge_margin: f64,
    #[serde(default = "crate::config::defaults::default_scroll_tolerance")]
    pub scroll_tolerance: f64,
    #[serde(default = "crate::config::defaults::default_progress_interval_secs")]
    pub progress_interval_secs: u32,
    #[serde(default = "crate::config::defaults::default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "crate::config::defaults::default_speed")]
    pub speed: f64,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "crate::config::defaults::default_viewport_height")]
    pub viewport_height: f64,
    #[serde(default = "crate::config::defaults::default_line_width_chars")]
    pub line_width_chars: f64,
    #[serde(default = "crate::config::defaults::default_line_height")]
    pub line_height: f64,
    #[serde(default = "crate::config::defaults::default_row_gap")]
    pub row_gap: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: crate::config::defaults::default_log_level(),
            surface: Surface::default(),
            epsilon: None,
            lock_window_ms: None,
            programmatic_guard_ms: None,
            auto_scroll: crate::config::defaults::default_auto_scroll(),
            animate_scroll: crate::config::defaults::default_animate_scroll(),
            align_mode: AlignMode::default(),
            comfort_margin: crate::config::defaults::default_comfort_margin(),
            edge_margin: crate::config::defaults::default_edge_margin(),
            scroll_tolerance: crate::config::defaults::default_scroll_tolerance(),
            progress_interval_secs: crate::config::defaults::default_progress_interval_secs(),
            tick_ms: crate::config::defaults::default_tick_ms(),
            speed: crate::config::defaults::default_speed(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            viewport_height: crate::config::defaults::default_viewport_height(),
            line_width_chars: crate::config::defaults::default_line_width_chars(),
            line_height: crate::config::defaults::default_line_height(),
            row_gap: crate::config::defaults::default_row_gap(),
        }
    }
}

impl AppConfig {
    /// Engine settings for this config, clamped into usable ranges.
    pub fn to_sync_config(&self) -> SyncConfig {
        let preset = SyncConfig::for_surface(self.surface);
        let viewport = self.viewport_height();
        SyncConfig {
            surface: self.surface,
            epsilon: self
                .epsilon
                .map(|eps| non_negative(eps, preset.epsilon))
                .unwrap_or(preset.epsilon),
            lock_window_ms: self.lock_window_ms.unwrap_or(preset.lock_window_ms),
            programmatic_guard_ms: self
                .programmatic_guard_ms
                .unwrap_or(preset.programmatic_guard_ms),
            auto_scroll: self.auto_scroll,
            animate_scroll: self.animate_scroll,
            scroll: ScrollConfig {
                mode: self.align_mode,
                comfort_margin: non_negative(self.comfort_margin, preset.scroll.comfort_margin)
                    .min(viewport * 0.4),
                edge_margin: non_negative(self.edge_margin, preset.scroll.edge_margin),
                tolerance: non_negative(self.scroll_tolerance, preset.scroll.tolerance),
            },
            progress: ThrottleConfig {
                interval_secs: self.progress_interval_secs.max(1),
            },
        }
    }

    pub fn viewport_height(&self) -> f64 {
        positive(
            self.viewport_height,
            crate::config::defaults::default_viewport_height(),
        )
    }

    pub fn line_width_chars(&self) -> f64 {
        positive(
            self.line_width_chars,
            crate::config::defaults::default_line_width_chars(),
        )
        .max(8.0)
    }

    pub fn line_height(&self) -> f64 {
        positive(self.line_height, crate::config::defaults::default_line_height())
    }

    pub fn row_gap(&self) -> f64 {
        non_negative(self.row_gap, 0.0)
    }

    pub fn speed(&self) -> f64 {
        positive(self.speed, crate::config::defaults::default_speed()).clamp(0.1, 64.0)
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms.clamp(10, 5_000)
    }
}

fn non_negative(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

fn positive(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
