//! Composition planning.
//!
//! Turns resolved foreground bounds and an [`OutputProfile`] into the three
//! numbers the raster engine needs: what to crop, what to fit it into, and
//! where to paste the result on the canvas. No pixels are touched here.

use super::bounds::ResolvedBounds;
use super::params::{CropRect, FitMode, Offset, Rgb, Size};
use crate::profile::OutputProfile;
use serde::Serialize;

/// Everything needed to turn a decoded image into its canvas layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompositionPlan {
    /// Foreground rectangle in source coordinates.
    pub crop: CropRect,
    /// Content box the crop is fit into (the profile's content size).
    pub resize: Size,
    #[serde(skip)]
    pub fit: FitMode,
    /// Top-left corner of the content box on the canvas.
    pub offset: Offset,
    pub canvas: Size,
    #[serde(skip)]
    pub background: Rgb,
}

/// Crop rectangle covering the resolved spans on both axes.
pub fn crop_rect_from_bounds(bounds: &ResolvedBounds) -> CropRect {
    CropRect {
        left: bounds.columns.start,
        top: bounds.rows.start,
        width: bounds.columns.len(),
        height: bounds.rows.len(),
    }
}

/// Plan the crop, fit and placement for one image.
///
/// Padding and canvas are always white, the same color the detector treats
/// as background.
pub fn plan_composition(bounds: &ResolvedBounds, profile: &OutputProfile) -> CompositionPlan {
    CompositionPlan {
        crop: crop_rect_from_bounds(bounds),
        resize: profile.content,
        fit: FitMode::Contain,
        offset: profile.paste_offset(),
        canvas: profile.canvas,
        background: Rgb::WHITE,
    }
}
