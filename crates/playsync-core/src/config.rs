//! Engine tuning.
//!
//! Native and browser surfaces historically used slightly different
//! constants; both live here as presets and every value can be overridden.

use crate::index::DEFAULT_EPSILON;
use crate::scroll::ScrollConfig;
use crate::throttle::ThrottleConfig;
use serde::{Deserialize, Serialize};

/// Which rendering surface hosts the transcript.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Surface {
    #[default]
    Native,
    Browser,
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Surface::Native => "native",
            Surface::Browser => "browser",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub surface: Surface,
    /// Slack applied when comparing the position against segment starts.
    pub epsilon: f64,
    /// Automatic scrolling stays off this long after a manual interaction.
    pub lock_window_ms: u64,
    /// How long scroll events after an engine scroll are attributed to it.
    pub programmatic_guard_ms: u64,
    pub auto_scroll: bool,
    /// Whether engine scrolls ask the host to animate.
    pub animate_scroll: bool,
    pub scroll: ScrollConfig,
    pub progress: ThrottleConfig,
}

impl SyncConfig {
    pub fn for_surface(surface: Surface) -> Self {
        match surface {
            Surface::Native => Self {
                surface,
                epsilon: DEFAULT_EPSILON,
                lock_window_ms: 700,
                programmatic_guard_ms: 350,
                auto_scroll: true,
                animate_scroll: true,
                scroll: ScrollConfig::default(),
                progress: ThrottleConfig::default(),
            },
            Surface::Browser => Self {
                surface,
                epsilon: 0.08,
                lock_window_ms: 900,
                programmatic_guard_ms: 500,
                auto_scroll: true,
                animate_scroll: true,
                scroll: ScrollConfig::default(),
                progress: ThrottleConfig::default(),
            },
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::for_surface(Surface::Native)
    }
}
