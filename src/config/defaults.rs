use playsync_core::scroll::ScrollConfig;
use playsync_core::store::DEFAULT_CACHE_DIR;
use playsync_core::throttle::ThrottleConfig;

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_auto_scroll() -> bool {
    true
}

pub(crate) fn default_animate_scroll() -> bool {
    true
}

pub(crate) fn default_comfort_margin() -> f64 {
    ScrollConfig::default().comfort_margin
}

pub(crate) fn default_edge_margin() -> f64 {
    ScrollConfig::default().edge_margin
}

pub(crate) fn default_scroll_tolerance() -> f64 {
    ScrollConfig::default().tolerance
}

pub(crate) fn default_progress_interval_secs() -> u32 {
    ThrottleConfig::default().interval_secs
}

pub(crate) fn default_tick_ms() -> u64 {
    250
}

pub(crate) fn default_speed() -> f64 {
    1.0
}

pub(crate) fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

pub(crate) fn default_viewport_height() -> f64 {
    600.0
}

pub(crate) fn default_line_width_chars() -> f64 {
    64.0
}

pub(crate) fn default_line_height() -> f64 {
    24.0
}

pub(crate) fn default_row_gap() -> f64 {
    12.0
}
