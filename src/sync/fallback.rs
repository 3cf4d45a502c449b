//! Scroll offset estimation when no direct scroll handler is available.

use crate::config::HighlighterConfig;
use crate::highlight::Highlight;
use crate::surface::{PageBox, PageLayout};

/// A computed scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollEstimate {
    /// Derived from the target page's rendered box
    Located(f64),
    /// Derived from an estimated page stride; the page itself is not rendered yet
    Approximate(f64),
}

impl ScrollEstimate {
    /// The scroll offset in pixels.
    pub fn offset(&self) -> f64 {
        match self {
            ScrollEstimate::Located(offset) | ScrollEstimate::Approximate(offset) => *offset,
        }
    }

    /// Whether the offset came from real page geometry.
    pub fn is_located(&self) -> bool {
        matches!(self, ScrollEstimate::Located(_))
    }
}

/// Estimates where to scroll for a highlight from rendered page boxes.
#[derive(Debug, Clone)]
pub struct FallbackEstimator {
    margin: f64,
    page_gap: f64,
    default_stride: f64,
}

impl Default for FallbackEstimator {
    fn default() -> Self {
        Self::from_config(&HighlighterConfig::default())
    }
}

impl FallbackEstimator {
    /// Create an estimator from configuration.
    pub fn from_config(config: &HighlighterConfig) -> Self {
        Self {
            margin: config.scroll_margin,
            page_gap: config.fallback_page_gap,
            default_stride: config.fallback_page_stride,
        }
    }

    /// Offset to scroll to for `highlight`. Never fails; without any rendered page it
    /// falls back to a fixed stride.
    pub fn estimate(&self, highlight: &Highlight, layout: &dyn PageLayout) -> ScrollEstimate {
        match layout.page_box(highlight.page_number) {
            Some(page) => ScrollEstimate::Located(self.offset_within(highlight, &page)),
            None => {
                let stride = self.page_stride(&layout.rendered_pages());
                ScrollEstimate::Approximate(stride * highlight.page_number.saturating_sub(1) as f64)
            },
        }
    }

    fn offset_within(&self, highlight: &Highlight, page: &PageBox) -> f64 {
        let rect = &highlight.bounding_rect;
        let ratio = if rect.page_height > 0.0 {
            (1.0 - rect.y2 / rect.page_height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (page.offset_top + ratio * page.height - self.margin).max(0.0)
    }

    /// Distance between consecutive page tops.
    ///
    /// Uses two rendered pages when available, otherwise one page's height plus the
    /// configured gap, otherwise the configured default stride.
    pub fn page_stride(&self, rendered: &[PageBox]) -> f64 {
        let mut pages: Vec<PageBox> = rendered
            .iter()
            .copied()
            .filter(|p| p.offset_top.is_finite() && p.height.is_finite() && p.height > 0.0)
            .collect();
        pages.sort_by_key(|p| p.page_number);
        pages.dedup_by_key(|p| p.page_number);

        if let [first, second, ..] = pages.as_slice() {
            let span = (second.page_number - first.page_number) as f64;
            let stride = (second.offset_top - first.offset_top) / span;
            if stride.is_finite() && stride > 0.0 {
                return stride;
            }
        }
        match pages.first() {
            Some(page) => page.height + self.page_gap,
            None => self.default_stride,
        }
    }
}
