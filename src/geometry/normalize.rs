//! Conversion of raw provenance boxes into top-left page rectangles.

use super::{CoordOrigin, NormalizedRect, PageSizes, RawRect};

/// Convert one raw provenance rectangle into a [`NormalizedRect`].
///
/// Bottom-left rectangles have their vertical edges flipped against the page height
/// (`y = height - raw`); top-left rectangles pass through. Both axes are then
/// min/max ordered. Returns `None` when a coordinate is not finite or the page is
/// not in `pages`.
///
/// # Examples
///
/// ```
/// use block_highlighter::geometry::{normalize, CoordOrigin, PageSize, PageSizes, RawRect};
///
/// let pages: PageSizes = PageSize::new(1, 600.0, 200.0).into_iter().collect();
/// let raw = RawRect::new(10.0, 100.0, 90.0, 50.0, CoordOrigin::BottomLeft);
/// let rect = normalize(&raw, 1, &pages).unwrap();
/// assert_eq!((rect.y1, rect.y2), (100.0, 150.0));
/// ```
pub fn normalize(raw: &RawRect, page_number: u32, pages: &PageSizes) -> Option<NormalizedRect> {
    if !raw.is_finite() {
        return None;
    }
    let page = pages.get(page_number)?;

    let (y_top, y_bottom) = match raw.origin {
        CoordOrigin::BottomLeft => (page.height - raw.top, page.height - raw.bottom),
        CoordOrigin::TopLeft => (raw.top, raw.bottom),
    };

    Some(NormalizedRect::from_corners(raw.left, y_top, raw.right, y_bottom, page))
}
