//! Interfaces to the PDF rendering surface.
//!
//! The surface is external. The highlighter only needs three things from it: a
//! registered "scroll to this highlight" capability, a view of where rendered pages
//! sit in the scroll container, and a clock for scheduling retries.

use crate::highlight::Highlight;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Direct scroll capability registered by a mounted surface.
///
/// Returns `true` when the surface found the highlight's element and scrolled to it.
pub trait ScrollHandler {
    /// Scroll the viewer to a highlight.
    fn scroll_to(&mut self, highlight: &Highlight) -> bool;
}

impl<F> ScrollHandler for F
where
    F: FnMut(&Highlight) -> bool,
{
    fn scroll_to(&mut self, highlight: &Highlight) -> bool {
        self(highlight)
    }
}

/// Identity of a registered scroll handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

/// Placement of one rendered page inside the scroll container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// 1-based page number
    pub page_number: u32,
    /// Distance from the top of the scroll content, in pixels
    pub offset_top: f64,
    /// Rendered page height, in pixels
    pub height: f64,
}

impl PageBox {
    /// Create a page box.
    pub fn new(page_number: u32, offset_top: f64, height: f64) -> Self {
        Self {
            page_number,
            offset_top,
            height,
        }
    }
}

/// Query access to the pages a surface has rendered so far.
pub trait PageLayout {
    /// Box of a rendered page, if that page exists in the surface's output.
    fn page_box(&self, page_number: u32) -> Option<PageBox>;

    /// Every rendered page, in any order.
    fn rendered_pages(&self) -> Vec<PageBox>;
}

/// A fixed list of rendered pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedPages {
    pages: Vec<PageBox>,
}

impl RenderedPages {
    /// Create from page boxes.
    pub fn new(pages: Vec<PageBox>) -> Self {
        Self { pages }
    }

    /// Uniformly laid out pages `1..=count`.
    pub fn uniform(count: u32, height: f64, gap: f64) -> Self {
        Self::new(
            (1..=count)
                .map(|n| PageBox::new(n, (n - 1) as f64 * (height + gap), height))
                .collect(),
        )
    }
}

impl PageLayout for RenderedPages {
    fn page_box(&self, page_number: u32) -> Option<PageBox> {
        self.pages.iter().copied().find(|p| p.page_number == page_number)
    }

    fn rendered_pages(&self) -> Vec<PageBox> {
        self.pages.clone()
    }
}

/// Monotonic time source for retry and nudge scheduling.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// A clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
