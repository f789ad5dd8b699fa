//! # whitecrop
//!
//! Automatic whitespace cropping for product photos shot on a white backdrop.
//! Each image is trimmed to its foreground, fit into a fixed content box, and
//! pasted onto a white canvas, so a whole catalogue comes out with identical
//! framing.
//!
//! # Architecture: Detect, Plan, Execute
//!
//! ```text
//! bytes → PixelGrid → threshold → background rows/cols → bounds → plan → raster engine → bytes
//! ```
//!
//! Everything up to the plan is pure computation over a decoded pixel grid and
//! is unit tested without encoding a single image. Pixels are only touched at
//! the edges, through the [`imaging::ImageBackend`] trait: decode on the way
//! in; crop, composite and encode on the way out.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Detection stages, composition planning, the backend trait and the per-image [`imaging::Normalizer`] |
//! | [`profile`] | Output profiles (content box, canvas, placement) and crop mode |
//! | [`config`] | `config.toml` loading, merging onto stock defaults, validation |
//! | [`scan`] | Expands input files and directories into a sorted image list |
//! | [`process`] | Batch runs: parallel normalization, batch failure policy, output writing |
//! | [`cache`] | Content-addressed cache so unchanged inputs are not re-encoded |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Whole Lines, Not Pixels
//!
//! A row or column is background only when every pixel in it is brighter than
//! the threshold and its mean is too. One dark pixel is enough to keep a line,
//! which is what a product shot needs: thin straps and cables survive the crop.
//! The threshold adapts to the photo (mean brightness x 1.03) but never exceeds
//! 250, so a slightly grey backdrop still counts as white.
//!
//! ## First Gap From Each End
//!
//! The crop edges are the first break in the background run counted from each
//! side. Background lines that appear inside the product (a gap between two
//! shoes) do not split it. An image with no gap on an axis keeps that whole
//! axis rather than failing.
//!
//! ## Profiles Are Data
//!
//! Content size, canvas size and placement live in [`profile::ProfileTable`],
//! filled from config. The two stock profiles are ordinary entries, and a new
//! layout is a `[profiles.<name>]` table, not a code change.
//!
//! ## Pure-Rust Imaging
//!
//! [`imaging::RustBackend`] uses the `image` crate for decoding, Lanczos3
//! resampling, and JPEG/AVIF encoding. No system libraries are needed.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod output;
pub mod process;
pub mod profile;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
