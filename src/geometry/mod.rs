//! Geometric primitives for page overlays.
//!
//! Provenance boxes arrive in the source document's own convention ([`RawRect`]) and
//! are converted to [`NormalizedRect`]s, which always use a top-left origin and carry
//! the dimensions of the page they sit on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod normalize;

pub use normalize::normalize;

/// Corner of the page treated as `(0, 0)` by a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordOrigin {
    /// Vertical axis grows downwards from the top edge
    #[serde(alias = "TOPLEFT")]
    TopLeft,
    /// Vertical axis grows upwards from the bottom edge (PDF user space)
    #[default]
    #[serde(alias = "BOTTOMLEFT")]
    BottomLeft,
}

impl CoordOrigin {
    /// Parse the origin tag used by document trees.
    ///
    /// Case, hyphens, underscores and spaces are ignored, so `"TOPLEFT"`,
    /// `"top-left"` and `"Top_Left"` are all accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use block_highlighter::geometry::CoordOrigin;
    ///
    /// assert_eq!(CoordOrigin::parse("TOPLEFT"), Some(CoordOrigin::TopLeft));
    /// assert_eq!(CoordOrigin::parse("bottom-left"), Some(CoordOrigin::BottomLeft));
    /// assert_eq!(CoordOrigin::parse("center"), None);
    /// ```
    pub fn parse(tag: &str) -> Option<Self> {
        let compact: String = tag
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_uppercase)
            .collect();
        match compact.as_str() {
            "TOPLEFT" => Some(CoordOrigin::TopLeft),
            "BOTTOMLEFT" => Some(CoordOrigin::BottomLeft),
            _ => None,
        }
    }
}

/// Pixel dimensions of one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    /// 1-based page number
    pub page_number: u32,
    /// Page width
    pub width: f64,
    /// Page height
    pub height: f64,
}

impl PageSize {
    /// Create a page size. Returns `None` unless the page number is at least 1 and
    /// both dimensions are finite and positive.
    pub fn new(page_number: u32, width: f64, height: f64) -> Option<Self> {
        let valid_dimension = |v: f64| v.is_finite() && v > 0.0;
        if page_number >= 1 && valid_dimension(width) && valid_dimension(height) {
            Some(Self {
                page_number,
                width,
                height,
            })
        } else {
            None
        }
    }
}

/// Lookup from page number to page dimensions for one document load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSizes {
    pages: BTreeMap<u32, PageSize>,
}

impl PageSizes {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a page, replacing any earlier entry with the same number.
    pub fn insert(&mut self, size: PageSize) {
        self.pages.insert(size.page_number, size);
    }

    /// Dimensions of a page, if known.
    pub fn get(&self, page_number: u32) -> Option<&PageSize> {
        self.pages.get(&page_number)
    }

    /// Whether the page is known.
    pub fn contains(&self, page_number: u32) -> bool {
        self.pages.contains_key(&page_number)
    }

    /// Number of known pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page is known.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages in ascending page-number order.
    pub fn iter(&self) -> impl Iterator<Item = &PageSize> {
        self.pages.values()
    }
}

impl FromIterator<PageSize> for PageSizes {
    fn from_iter<I: IntoIterator<Item = PageSize>>(iter: I) -> Self {
        let mut sizes = PageSizes::new();
        for size in iter {
            sizes.insert(size);
        }
        sizes
    }
}

/// One provenance rectangle as found in the document tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRect {
    /// Left edge
    pub left: f64,
    /// Top edge, in the rectangle's own convention
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge, in the rectangle's own convention
    pub bottom: f64,
    /// Origin the coordinates are expressed against
    pub origin: CoordOrigin,
}

impl RawRect {
    /// Create a raw rectangle.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64, origin: CoordOrigin) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            origin,
        }
    }

    /// Whether all four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A rectangle with top-left origin on a known page.
///
/// Invariant: `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRect {
    /// Left edge
    pub x1: f64,
    /// Top edge
    pub y1: f64,
    /// Right edge
    pub x2: f64,
    /// Bottom edge
    pub y2: f64,
    /// Width of the page the rectangle lies on
    pub page_width: f64,
    /// Height of the page the rectangle lies on
    pub page_height: f64,
    /// 1-based page number
    pub page_number: u32,
}

impl NormalizedRect {
    /// Build a rectangle from two corners on a page, ordering the coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use block_highlighter::geometry::{NormalizedRect, PageSize};
    ///
    /// let page = PageSize::new(1, 600.0, 800.0).unwrap();
    /// let rect = NormalizedRect::from_corners(550.0, 150.0, 50.0, 100.0, &page);
    /// assert_eq!((rect.x1, rect.y1, rect.x2, rect.y2), (50.0, 100.0, 550.0, 150.0));
    /// ```
    pub fn from_corners(xa: f64, ya: f64, xb: f64, yb: f64, page: &PageSize) -> Self {
        Self {
            x1: xa.min(xb),
            y1: ya.min(yb),
            x2: xa.max(xb),
            y2: ya.max(yb),
            page_width: page.width,
            page_height: page.height,
            page_number: page.page_number,
        }
    }

    /// Rectangle width.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Rectangle height.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Smallest rectangle containing both. Page fields are taken from `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use block_highlighter::geometry::{NormalizedRect, PageSize};
    ///
    /// let page = PageSize::new(1, 600.0, 800.0).unwrap();
    /// let a = NormalizedRect::from_corners(0.0, 0.0, 50.0, 50.0, &page);
    /// let b = NormalizedRect::from_corners(25.0, 25.0, 75.0, 75.0, &page);
    /// let union = a.union(&b);
    /// assert_eq!((union.x1, union.y1, union.x2, union.y2), (0.0, 0.0, 75.0, 75.0));
    /// ```
    pub fn union(&self, other: &NormalizedRect) -> NormalizedRect {
        NormalizedRect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
            ..*self
        }
    }

    /// Bounding rectangle of a set of rectangles, or `None` for an empty set.
    pub fn bounding<'a, I>(rects: I) -> Option<NormalizedRect>
    where
        I: IntoIterator<Item = &'a NormalizedRect>,
    {
        let mut iter = rects.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, rect| acc.union(rect)))
    }

    /// Whether two rectangles on the same page overlap.
    pub fn intersects(&self, other: &NormalizedRect) -> bool {
        self.page_number == other.page_number
            && self.x1 < other.x2
            && self.x2 > other.x1
            && self.y1 < other.y2
            && self.y2 > other.y1
    }
}
