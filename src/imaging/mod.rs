//! Whitespace detection and canvas composition.
//!
//! | Stage | Module |
//! |---|---|
//! | **Pixel grid** | [`grid`]: the decoded RGB raster every detector reads |
//! | **Threshold** | [`threshold`]: mean brightness x 1.03, capped at 250 |
//! | **Classify** | [`classify`]: which whole rows and columns are background |
//! | **Reduce** | [`bounds`]: first gap from each end, then fallback to full extent |
//! | **Plan** | [`planner`]: crop rect, content box, canvas offset |
//! | **Execute** | [`operations`]: [`Normalizer`] driving an [`ImageBackend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for fit and centering math (unit testable)
//! - **Parameters**: Data structures describing raster engine calls
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The pipeline combining detection + backend

pub mod backend;
pub mod bounds;
pub mod calculations;
pub mod classify;
pub mod grid;
pub mod operations;
pub mod params;
pub mod planner;
pub mod rust_backend;
pub mod threshold;

pub use backend::{BackendError, Decoded, ImageBackend};
pub use calculations::{calculate_contain_dimensions, center_offset};
pub use grid::{GridError, Pixel, PixelGrid};
pub use operations::{EncodeSettings, ErrorKind, Normalized, Normalizer, PipelineError, Stage};
pub use params::{CropRect, FitMode, Offset, OutputFormat, Quality, Rgb, Size};
pub use planner::CompositionPlan;
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use threshold::{LuminanceThreshold, ThresholdParams};
