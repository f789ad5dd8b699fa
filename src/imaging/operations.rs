//! High-level crop pipeline.
//!
//! [`Normalizer`] sequences the pure detection stages and the backend calls
//! for one image:
//!
//! ```text
//! Received → Decoded → Thresholded → Classified → BoundsResolved → Planned
//!          → Composited → Encoded → Done
//! ```
//!
//! The `no-crop` mode leaves the sequence right after decoding and goes
//! straight to the final encode. Any failure stops the run and reports the
//! stage that was being attempted; no partial output is returned.
//!
//! A normalizer holds no per-image state, so one instance can be shared across
//! worker threads.

use super::backend::{BackendError, Decoded, ImageBackend};
use super::bounds::resolve_bounds;
use super::classify::classify_borders;
use super::grid::GridError;
use super::params::{
    CompositeParams, CropResizePadParams, EncodeParams, OutputFormat, Quality, Rgb,
};
use super::planner::{CompositionPlan, plan_composition};
use super::threshold::{ThresholdParams, estimate_threshold};
use crate::profile::{CropMode, OutputProfile, ProfileError, ProfileTable};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Pipeline states for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Received,
    Decoded,
    Thresholded,
    Classified,
    BoundsResolved,
    Planned,
    Composited,
    Encoded,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Received => "received",
            Stage::Decoded => "decoded",
            Stage::Thresholded => "thresholded",
            Stage::Classified => "classified",
            Stage::BoundsResolved => "bounds-resolved",
            Stage::Planned => "planned",
            Stage::Composited => "composited",
            Stage::Encoded => "encoded",
            Stage::Done => "done",
        })
    }
}

/// What went wrong, independent of where.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("unreadable image: {0}")]
    Decode(String),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error(transparent)]
    InvalidProfile(#[from] ProfileError),
    #[error("raster engine produced no output: {0}")]
    Encode(String),
}

impl ErrorKind {
    /// Classify a backend error raised while reading the input.
    fn reading(err: BackendError) -> Self {
        match err {
            BackendError::Grid(GridError::Empty { width, height }) => {
                ErrorKind::EmptyImage { width, height }
            }
            other => ErrorKind::Decode(other.to_string()),
        }
    }

    /// Classify a backend error raised while producing output.
    fn writing(err: BackendError) -> Self {
        ErrorKind::Encode(err.to_string())
    }
}

/// A failed pipeline run: the stage being attempted and the cause.
#[derive(Error, Debug)]
#[error("failed at {stage} stage: {kind}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub kind: ErrorKind,
}

impl PipelineError {
    fn new(stage: Stage, kind: ErrorKind) -> Self {
        Self { stage, kind }
    }
}

/// Final output format and quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeSettings {
    pub format: OutputFormat,
    pub quality: Quality,
}

impl From<EncodeSettings> for EncodeParams {
    fn from(settings: EncodeSettings) -> Self {
        EncodeParams {
            format: settings.format,
            quality: settings.quality,
        }
    }
}

/// A successfully normalized image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Encoded output in the configured format.
    pub bytes: Vec<u8>,
    /// The layout that was applied; `None` for `no-crop`.
    pub plan: Option<CompositionPlan>,
}

/// Runs the crop pipeline against a backend.
pub struct Normalizer<'a, B: ImageBackend> {
    backend: &'a B,
    profiles: &'a ProfileTable,
    threshold: ThresholdParams,
    encode: EncodeSettings,
}

impl<'a, B: ImageBackend> Normalizer<'a, B> {
    pub fn new(
        backend: &'a B,
        profiles: &'a ProfileTable,
        threshold: ThresholdParams,
        encode: EncodeSettings,
    ) -> Self {
        Self {
            backend,
            profiles,
            threshold,
            encode,
        }
    }

    /// Resolve a profile name, failing before any image is touched.
    pub fn profile(&self, name: &str) -> Result<&'a OutputProfile, PipelineError> {
        self.profiles
            .get(name)
            .map_err(|e| PipelineError::new(Stage::Received, e.into()))
    }

    /// Normalize one image using a named profile.
    pub fn normalize(
        &self,
        bytes: &[u8],
        profile_name: &str,
        mode: CropMode,
    ) -> Result<Normalized, PipelineError> {
        let profile = self.profile(profile_name)?;
        self.normalize_with(bytes, profile, mode)
    }

    /// Normalize one image with an already resolved profile.
    pub fn normalize_with(
        &self,
        bytes: &[u8],
        profile: &OutputProfile,
        mode: CropMode,
    ) -> Result<Normalized, PipelineError> {
        debug!(stage = %Stage::Received, bytes = bytes.len(), %mode);

        let (working, decoded) = self.decode_opaque(bytes)?;
        debug!(
            stage = %Stage::Decoded,
            width = decoded.grid.width(),
            height = decoded.grid.height(),
            channels = decoded.channels,
            flattened = decoded.has_alpha,
        );

        let plan = match mode {
            CropMode::NoCrop => None,
            CropMode::Crop => Some(self.plan(&decoded, profile)),
        };

        let composed = match &plan {
            None => working,
            Some(plan) => {
                let composed = self.compose(&working, plan)?;
                debug!(stage = %Stage::Composited, bytes = composed.len());
                composed
            }
        };

        let encoded = self
            .backend
            .encode(&composed, &self.encode.into())
            .map_err(|e| PipelineError::new(Stage::Encoded, ErrorKind::writing(e)))?;
        debug!(stage = %Stage::Encoded, format = %self.encode.format, bytes = encoded.len());
        debug!(stage = %Stage::Done);

        Ok(Normalized {
            bytes: encoded,
            plan,
        })
    }

    /// Decode the input, flattening transparency first when present.
    ///
    /// Returns the bytes later stages should read together with their grid.
    fn decode_opaque(&self, bytes: &[u8]) -> Result<(Vec<u8>, Decoded), PipelineError> {
        let fail = |e| PipelineError::new(Stage::Decoded, ErrorKind::reading(e));
        let decoded = self.backend.decode(bytes).map_err(fail)?;
        if !decoded.has_alpha {
            return Ok((bytes.to_vec(), decoded));
        }
        let flat = self
            .backend
            .flatten_to_opaque(bytes, Rgb::WHITE)
            .map_err(fail)?;
        let mut reread = self.backend.decode(&flat).map_err(fail)?;
        reread.has_alpha = true;
        reread.channels = decoded.channels;
        Ok((flat, reread))
    }

    /// Run the pure detection stages and plan the layout.
    fn plan(&self, decoded: &Decoded, profile: &OutputProfile) -> CompositionPlan {
        let grid = &decoded.grid;

        let threshold = estimate_threshold(grid, &self.threshold);
        debug!(stage = %Stage::Thresholded, %threshold);

        let sets = classify_borders(grid, threshold);
        debug!(
            stage = %Stage::Classified,
            background_columns = sets.columns.len(),
            background_rows = sets.rows.len(),
        );

        let bounds = resolve_bounds(&sets, grid.width(), grid.height());
        debug!(
            stage = %Stage::BoundsResolved,
            columns = ?bounds.columns,
            rows = ?bounds.rows,
        );

        let plan = plan_composition(&bounds, profile);
        debug!(
            stage = %Stage::Planned,
            crop = %plan.crop,
            resize = %plan.resize,
            canvas = %plan.canvas,
            left = plan.offset.left,
            top = plan.offset.top,
        );
        plan
    }

    fn compose(&self, source: &[u8], plan: &CompositionPlan) -> Result<Vec<u8>, PipelineError> {
        let fail = |e| PipelineError::new(Stage::Composited, ErrorKind::writing(e));
        let content = self
            .backend
            .crop_resize_pad(&CropResizePadParams {
                source,
                rect: plan.crop,
                target: plan.resize,
                fit: plan.fit,
                background: plan.background,
            })
            .map_err(fail)?;
        self.backend
            .composite_on_canvas(&CompositeParams {
                canvas: plan.canvas,
                background: plan.background,
                overlay: &content,
                offset: plan.offset,
            })
            .map_err(fail)
    }
}
