//! Bounding box reduction.
//!
//! Two steps, kept apart so each can be tested on its own:
//!
//! 1. [`reduce`] walks a sorted [`BorderIndexSet`] and finds where the leading
//!    background run ends and where the trailing one begins. Either side may
//!    have no answer; that is reported as `None`, never as a magic index.
//! 2. [`resolve_axis`] turns those raw bounds into the inclusive foreground
//!    span, substituting the full extent for any side that had no answer.
//!
//! For a 10-wide axis with background `{0,1,2,7,8,9}` the raw bounds are
//! `start = 2`, `end = 7` and the resolved span is `3..=6`.

use super::classify::{BorderIndexSet, BorderSets};

/// Raw reducer output for one axis.
///
/// `start` is the last index of the leading background run, `end` the first
/// index of the trailing one. `None` means no gap was found on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawBounds {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl RawBounds {
    /// True when neither side produced a bound.
    pub fn is_inconclusive(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Find the first interior gap from each end of a sorted index set.
///
/// Sets with fewer than two elements, or one contiguous run, have no gap and
/// yield `None` on both sides.
pub fn reduce(set: &BorderIndexSet) -> RawBounds {
    let indices = set.as_slice();
    let start = indices
        .windows(2)
        .find(|w| w[0] + 1 != w[1])
        .map(|w| w[0]);
    let end = indices
        .windows(2)
        .rev()
        .find(|w| w[0] + 1 != w[1])
        .map(|w| w[1]);
    RawBounds { start, end }
}

/// Inclusive span of foreground indices along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSpan {
    pub start: u32,
    pub end: u32,
}

impl AxisSpan {
    /// Number of indices in the span. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Resolve raw bounds against the axis extent.
///
/// A missing `start` falls back to `0`, a missing `end` to `extent - 1`.
/// Should the two sides ever cross, the whole axis is kept rather than
/// producing an empty crop.
pub fn resolve_axis(raw: RawBounds, extent: u32) -> AxisSpan {
    let last = extent.saturating_sub(1);
    let start = raw.start.map_or(0, |s| s.saturating_add(1)).min(last);
    let end = raw.end.map_or(last, |e| e.saturating_sub(1)).min(last);
    if start > end {
        return AxisSpan {
            start: 0,
            end: last,
        };
    }
    AxisSpan { start, end }
}

/// Resolved foreground spans for both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBounds {
    /// Horizontal extent, from the background column set.
    pub columns: AxisSpan,
    /// Vertical extent, from the background row set.
    pub rows: AxisSpan,
}

/// Reduce and resolve both axes of a classified image.
pub fn resolve_bounds(sets: &BorderSets, width: u32, height: u32) -> ResolvedBounds {
    ResolvedBounds {
        columns: resolve_axis(reduce(&sets.columns), width),
        rows: resolve_axis(reduce(&sets.rows), height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(indices: &[u32]) -> BorderIndexSet {
        BorderIndexSet::from_indices(indices.iter().copied())
    }

    // =========================================================================
    // reduce
    // =========================================================================

    #[test]
    fn contiguous_run_has_no_bounds() {
        let raw = reduce(&set(&[0, 1, 2, 3, 4]));
        assert_eq!(raw, RawBounds::default());
        assert!(raw.is_inconclusive());
    }

    #[test]
    fn fewer_than_two_elements_has_no_bounds() {
        assert!(reduce(&set(&[])).is_inconclusive());
        assert!(reduce(&set(&[4])).is_inconclusive());
    }

    #[test]
    fn centered_square_bounds() {
        let raw = reduce(&set(&[0, 1, 2, 7, 8, 9]));
        assert_eq!(
            raw,
            RawBounds {
                start: Some(2),
                end: Some(7)
            }
        );
    }

    #[test]
    fn single_gap_of_one() {
        // White except column 4 on a 9-wide axis.
        let raw = reduce(&set(&[0, 1, 2, 3, 5, 6, 7, 8]));
        assert_eq!(raw.start, Some(3));
        assert_eq!(raw.end, Some(5));
    }

    #[test]
    fn first_and_last_gap_are_used() {
        // Two foreground bands: 2..=3 and 6..=6.
        let raw = reduce(&set(&[0, 1, 4, 5, 7, 8]));
        assert_eq!(raw.start, Some(1));
        assert_eq!(raw.end, Some(7));
    }

    #[test]
    fn subject_touching_left_edge() {
        // Foreground at 0..=3; background 4..=9 is one run, so no gap.
        let raw = reduce(&set(&[4, 5, 6, 7, 8, 9]));
        assert!(raw.is_inconclusive());
    }

    // =========================================================================
    // resolve_axis
    // =========================================================================

    #[test]
    fn resolve_inclusive_span() {
        let span = resolve_axis(
            RawBounds {
                start: Some(2),
                end: Some(7),
            },
            10,
        );
        assert_eq!(span, AxisSpan { start: 3, end: 6 });
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn resolve_missing_bounds_uses_full_extent() {
        let span = resolve_axis(RawBounds::default(), 10);
        assert_eq!(span, AxisSpan { start: 0, end: 9 });
        assert_eq!(span.len(), 10);
    }

    #[test]
    fn resolve_one_sided() {
        let only_start = resolve_axis(
            RawBounds {
                start: Some(4),
                end: None,
            },
            10,
        );
        assert_eq!(only_start, AxisSpan { start: 5, end: 9 });

        let only_end = resolve_axis(
            RawBounds {
                start: None,
                end: Some(3),
            },
            10,
        );
        assert_eq!(only_end, AxisSpan { start: 0, end: 2 });
    }

    #[test]
    fn resolve_single_pixel() {
        let span = resolve_axis(
            RawBounds {
                start: Some(3),
                end: Some(5),
            },
            9,
        );
        assert_eq!(span, AxisSpan { start: 4, end: 4 });
        assert_eq!(span.len(), 1);
    }

    #[test]
    fn resolve_crossed_bounds_keeps_whole_axis() {
        let span = resolve_axis(
            RawBounds {
                start: Some(6),
                end: Some(5),
            },
            10,
        );
        assert_eq!(span, AxisSpan { start: 0, end: 9 });
    }

    #[test]
    fn resolve_bounds_both_axes() {
        let sets = BorderSets {
            columns: set(&[0, 1, 2, 7, 8, 9]),
            rows: set(&[0, 1, 2, 3, 4, 5]),
        };
        let resolved = resolve_bounds(&sets, 10, 6);
        assert_eq!(resolved.columns, AxisSpan { start: 3, end: 6 });
        assert_eq!(resolved.rows, AxisSpan { start: 0, end: 5 });
    }
}
