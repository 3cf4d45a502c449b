//! Which highlights the overlay draws.

use super::{Highlight, HighlightIndex};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overlay mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityMode {
    /// Draw every highlight
    #[default]
    All,
    /// Draw only the selected highlight
    SelectedOnly,
}

impl VisibilityMode {
    /// Mode for a "show all" toggle value.
    pub fn from_show_all(show_all: bool) -> Self {
        if show_all {
            VisibilityMode::All
        } else {
            VisibilityMode::SelectedOnly
        }
    }
}

/// Highlights to draw, tagged with the render nudge generation they were computed at.
///
/// A change of `generation` with unchanged `highlights` still means "draw again".
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleHighlights<'a> {
    /// Render nudge generation
    pub generation: u64,
    /// Highlights in display order
    pub highlights: Vec<&'a Highlight>,
}

/// Select the highlights to draw.
pub fn visible<'a>(index: &'a HighlightIndex, mode: VisibilityMode, selected: Option<&str>) -> Vec<&'a Highlight> {
    match mode {
        VisibilityMode::All => index.iter().collect(),
        VisibilityMode::SelectedOnly => selected.and_then(|id| index.get(id)).into_iter().collect(),
    }
}

/// Forces the overlay to be recomputed shortly after highlights appear, once at the
/// next paint and once after a fixed delay, so boxes land on the settled page layout.
#[derive(Debug, Clone, Default)]
pub struct RenderNudge {
    generation: u64,
    on_next_paint: bool,
    deadline: Option<Duration>,
}

impl RenderNudge {
    /// A nudge with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a nudge is still scheduled.
    pub fn is_pending(&self) -> bool {
        self.on_next_paint || self.deadline.is_some()
    }

    /// Drop scheduled nudges and restart the generation count.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Schedule the paint nudge and a timed nudge at `now + delay`.
    pub fn schedule(&mut self, now: Duration, delay: Duration) {
        self.on_next_paint = true;
        self.deadline = Some(now + delay);
    }

    /// Run the paint nudge, if scheduled. Returns whether the generation changed.
    pub fn on_paint(&mut self) -> bool {
        if std::mem::take(&mut self.on_next_paint) {
            self.generation += 1;
            true
        } else {
            false
        }
    }

    /// Run the timed nudge if it is due. Returns whether the generation changed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.generation += 1;
                true
            },
            _ => false,
        }
    }
}
