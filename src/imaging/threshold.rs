//! Background luminance threshold.
//!
//! The threshold is derived from the image itself: the mean of every red,
//! green and blue sample (one flat average, not per channel), scaled by
//! [`ThresholdParams::multiplier`] and capped at [`ThresholdParams::ceiling`].
//!
//! Mostly-white images get a high threshold; images with a large subject get
//! a lower one. The ceiling keeps already-bright images from demanding pixels
//! brighter than any real white background can deliver.

use super::grid::PixelGrid;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MULTIPLIER: f64 = 1.03;
pub const DEFAULT_CEILING: f64 = 250.0;

/// Tunables for [`estimate_threshold`]. Loaded from the `[detection]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdParams {
    /// Factor applied to the mean brightness.
    pub multiplier: f64,
    /// Upper bound on the resulting threshold.
    pub ceiling: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_MULTIPLIER,
            ceiling: DEFAULT_CEILING,
        }
    }
}

/// Per-image cutoff separating background from foreground brightness.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LuminanceThreshold(f64);

impl LuminanceThreshold {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for LuminanceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Mean of all channel samples in the grid.
pub fn mean_brightness(grid: &PixelGrid) -> f64 {
    let sum: u64 = grid
        .pixels()
        .iter()
        .map(|&[r, g, b]| r as u64 + g as u64 + b as u64)
        .sum();
    sum as f64 / (grid.pixel_count() as f64 * 3.0)
}

/// Compute the background threshold for one image.
pub fn estimate_threshold(grid: &PixelGrid, params: &ThresholdParams) -> LuminanceThreshold {
    let scaled = mean_brightness(grid) * params.multiplier;
    LuminanceThreshold(scaled.min(params.ceiling))
}
