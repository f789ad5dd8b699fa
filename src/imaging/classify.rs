//! Border classification: which whole rows and columns are background.
//!
//! A line (one full row or one full column) is background when it passes a
//! two-stage test against the image's [`LuminanceThreshold`]:
//!
//! 1. Every pixel's rounded channel average must be at least the threshold.
//!    The first darker pixel rejects the line immediately.
//! 2. The mean of those per-pixel averages must be strictly above the threshold.
//!
//! The hard per-pixel floor rejects any line that touches the subject, while
//! the mean check lets through mild compression noise on near-white lines.
//!
//! Column sweeps produce the set that bounds the horizontal extent; row sweeps
//! produce the set that bounds the vertical extent.

use super::grid::{Pixel, PixelGrid};
use super::threshold::LuminanceThreshold;

/// Sorted, de-duplicated set of line indices judged to be background.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorderIndexSet(Vec<u32>);

impl BorderIndexSet {
    /// Build a set from indices in any order.
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        let mut v: Vec<u32> = indices.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.0.binary_search(&index).is_ok()
    }
}

/// Background line sets for both axes of one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorderSets {
    /// Background column indices; bound the horizontal extent.
    pub columns: BorderIndexSet,
    /// Background row indices; bound the vertical extent.
    pub rows: BorderIndexSet,
}

/// `round((r + g + b) / 3)` in integer arithmetic.
///
/// The fractional part of a sum divided by three is only ever 0, ⅓ or ⅔,
/// so there are no halves to break ties on.
#[inline]
pub fn pixel_average([r, g, b]: Pixel) -> u8 {
    ((r as u16 + g as u16 + b as u16 + 1) / 3) as u8
}

/// Two-stage background test for one line of pixels.
pub fn is_background_line(
    line: impl IntoIterator<Item = Pixel>,
    threshold: LuminanceThreshold,
) -> bool {
    let t = threshold.value();
    let mut sum = 0u64;
    let mut count = 0u64;
    for pixel in line {
        let avg = pixel_average(pixel);
        if (avg as f64) < t {
            return false;
        }
        sum += avg as u64;
        count += 1;
    }
    if count == 0 {
        return false;
    }
    sum as f64 / count as f64 > t
}

/// Indices of columns whose every pixel is background.
pub fn background_columns(grid: &PixelGrid, threshold: LuminanceThreshold) -> BorderIndexSet {
    BorderIndexSet::from_indices(
        (0..grid.width()).filter(|&col| is_background_line(grid.column(col), threshold)),
    )
}

/// Indices of rows whose every pixel is background.
pub fn background_rows(grid: &PixelGrid, threshold: LuminanceThreshold) -> BorderIndexSet {
    BorderIndexSet::from_indices(
        (0..grid.height())
            .filter(|&row| is_background_line(grid.row(row).iter().copied(), threshold)),
    )
}

/// Classify both axes.
pub fn classify_borders(grid: &PixelGrid, threshold: LuminanceThreshold) -> BorderSets {
    BorderSets {
        columns: background_columns(grid, threshold),
        rows: background_rows(grid, threshold),
    }
}
