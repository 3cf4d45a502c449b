//! Configuration for highlight building and scroll synchronization.
//!
//! A [`HighlighterConfig`] is built once at startup (from defaults, builder calls or a
//! JSON file) and handed by reference to the components that need it.

use crate::error::{Error, Result};
use crate::geometry::CoordOrigin;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings handed to the PDF rendering surface when it is mounted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Location of the rendering surface's worker script, if it needs one.
    pub worker_src: Option<String>,

    /// Initial page scale for the rendered document.
    pub base_scale: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            worker_src: None,
            base_scale: 0.82,
        }
    }
}

/// Highlighter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlighterConfig {
    /// Maximum number of `$ref` hops followed after a pointer resolves.
    pub max_reference_depth: usize,

    /// Snippet length cap, in characters.
    pub snippet_max_chars: usize,

    /// Origin assumed for provenance boxes that do not declare one.
    pub default_coord_origin: CoordOrigin,

    /// Delay before the last scheduled direct scroll attempt.
    pub retry_delay_ms: u64,

    /// Delay before the late render nudge after highlights load.
    pub render_nudge_delay_ms: u64,

    /// Space left above a highlight when scrolling to it, in pixels.
    pub scroll_margin: f64,

    /// Gap between rendered pages assumed when only one page height is known.
    pub fallback_page_gap: f64,

    /// Page stride used when no page has been rendered yet.
    pub fallback_page_stride: f64,

    /// Whether every highlight is drawn when a document is first shown.
    pub show_all_default: bool,

    /// Maximum number of blocks considered per document.
    pub max_blocks: usize,

    /// Rendering surface settings.
    pub viewer: ViewerConfig,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlighterConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            max_reference_depth: 8,
            snippet_max_chars: 300,
            default_coord_origin: CoordOrigin::BottomLeft,
            retry_delay_ms: 140,
            render_nudge_delay_ms: 220,
            scroll_margin: 24.0,
            fallback_page_gap: 12.0,
            fallback_page_stride: 1100.0,
            show_all_default: true,
            max_blocks: 5000,
            viewer: ViewerConfig::default(),
        }
    }

    /// Parse a (possibly partial) JSON configuration. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.snippet_max_chars == 0 {
            return Err(Error::Config("snippet_max_chars must be positive".to_string()));
        }
        if !(self.fallback_page_stride.is_finite() && self.fallback_page_stride > 0.0) {
            return Err(Error::Config("fallback_page_stride must be a positive number".to_string()));
        }
        if !self.scroll_margin.is_finite() || !self.fallback_page_gap.is_finite() {
            return Err(Error::Config("scroll offsets must be finite".to_string()));
        }
        Ok(())
    }

    /// Delay before the last scheduled direct scroll attempt.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Delay before the late render nudge.
    pub fn render_nudge_delay(&self) -> Duration {
        Duration::from_millis(self.render_nudge_delay_ms)
    }

    /// Set the `$ref` follow depth.
    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    /// Set the snippet length cap.
    pub fn with_snippet_max_chars(mut self, chars: usize) -> Self {
        self.snippet_max_chars = chars;
        self
    }

    /// Set the origin assumed for undeclared provenance boxes.
    pub fn with_default_coord_origin(mut self, origin: CoordOrigin) -> Self {
        self.default_coord_origin = origin;
        self
    }

    /// Set the delayed retry for direct scroll attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the initial "show all" toggle state.
    pub fn with_show_all_default(mut self, show_all: bool) -> Self {
        self.show_all_default = show_all;
        self
    }

    /// Set the per-document block cap.
    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Set the rendering surface's worker script location.
    pub fn with_worker_src(mut self, src: impl Into<String>) -> Self {
        self.viewer.worker_src = Some(src.into());
        self
    }
}
