//! Pure calculation functions for fit and placement geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Offset, Size};

/// Calculate the largest size with the source aspect ratio that fits inside `target`.
///
/// One edge matches the target exactly; the other is rounded and never
/// exceeds its target edge. Neither edge drops below one pixel.
///
/// # Examples
/// ```
/// # use whitecrop::imaging::{Size, calculate_contain_dimensions};
/// // 400x200 landscape into a 1200x1200 square → 1200x600
/// assert_eq!(
///     calculate_contain_dimensions(Size::new(400, 200), Size::new(1200, 1200)),
///     Size::new(1200, 600)
/// );
/// ```
pub fn calculate_contain_dimensions(source: Size, target: Size) -> Size {
    let (src_w, src_h) = source.as_tuple();
    let (tgt_w, tgt_h) = target.as_tuple();
    if src_w == 0 || src_h == 0 {
        return target;
    }

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    let (w, h) = if src_aspect > tgt_aspect {
        // Source is wider: width matches, height shrinks
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h)
    } else {
        // Source is taller (or same aspect): height matches
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w, tgt_h)
    };

    Size::new(w.clamp(1, tgt_w.max(1)), h.clamp(1, tgt_h.max(1)))
}

/// Offset that centers `inner` within `outer`: `floor((outer - inner) / 2)` per axis.
///
/// An inner edge larger than the outer one is placed at zero on that axis.
pub fn center_offset(outer: Size, inner: Size) -> Offset {
    Offset::new(
        outer.width.saturating_sub(inner.width) / 2,
        outer.height.saturating_sub(inner.height) / 2,
    )
}
