//! Shared test utilities for the whitecrop test suite.
//!
//! Synthetic pixel grids for the detection stages, encoded fixtures for the
//! backend and batch tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! // White 10x10 with a black 4x4 square at (3, 3)
//! let grid = grid_with_rect(10, 10, (3, 3), (4, 4), [0, 0, 0]);
//! let backend = MockBackend::new().with_image(b"square", decoded(grid));
//! ```

use image::{ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

use crate::imaging::backend::Decoded;
use crate::imaging::grid::{Pixel, PixelGrid};

// =========================================================================
// Pixel grids
// =========================================================================

/// An all-white grid.
pub fn white_grid(width: u32, height: u32) -> PixelGrid {
    PixelGrid::from_fn(width, height, |_, _| [255, 255, 255]).unwrap()
}

/// A white grid with one solid rectangle of `color`.
///
/// `origin` is `(left, top)`, `size` is `(width, height)`.
pub fn grid_with_rect(
    width: u32,
    height: u32,
    origin: (u32, u32),
    size: (u32, u32),
    color: Pixel,
) -> PixelGrid {
    let (left, top) = origin;
    let (w, h) = size;
    PixelGrid::from_fn(width, height, |col, row| {
        if (left..left + w).contains(&col) && (top..top + h).contains(&row) {
            color
        } else {
            [255, 255, 255]
        }
    })
    .unwrap()
}

/// Wrap a grid as an opaque RGB decode result.
pub fn decoded(grid: PixelGrid) -> Decoded {
    Decoded {
        grid,
        channels: 3,
        has_alpha: false,
    }
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Encode an RGB image as PNG bytes.
pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// Encode an RGBA image built from `f(x, y)` as PNG bytes.
pub fn rgba_png_bytes(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| image::Rgba(f(x, y)));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// PNG bytes for a grid, pixel for pixel.
pub fn grid_png(grid: &PixelGrid) -> Vec<u8> {
    png_bytes(&RgbImage::from_fn(grid.width(), grid.height(), |x, y| {
        image::Rgb(grid.get(y, x))
    }))
}
