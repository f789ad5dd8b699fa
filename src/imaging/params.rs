//! Parameter types for raster engine calls.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the orchestrator in [`operations`](super::operations)
//! (which decides what to crop, where to paste, how to encode) and the
//! [`backend`](super::backend) (which does the actual pixel work). Keeping the
//! two apart is what lets the tests drive the whole pipeline through a mock.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1-100, default 90). Clamped on construction.
//! - [`Rgb`]: An opaque fill color. [`Rgb::WHITE`] is the canvas and padding color.
//! - [`Size`], [`Offset`], [`CropRect`]: Pixel geometry.
//! - [`FitMode`]: How a crop is fit into its resize target.
//! - [`OutputFormat`]: The final encoded format.
//! - [`CropResizePadParams`], [`CompositeParams`], [`EncodeParams`]: One struct per backend call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Pure white. The detector looks for it and the canvas is filled with it;
    /// the two must stay the same color family or padding seams show.
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
}

/// Width and height in pixels.
///
/// Serialized as a `[width, height]` pair so config files stay compact:
/// `content = [1200, 1200]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Size> for [u32; 2] {
    fn from(size: Size) -> Self {
        [size.width, size.height]
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Top-left placement of one raster inside another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Offset {
    pub left: u32,
    pub top: u32,
}

impl Offset {
    pub const fn new(left: u32, top: u32) -> Self {
        Self { left, top }
    }
}

/// A rectangle in source image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// The rectangle covering a whole `width` x `height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True when the rectangle is non-empty and lies inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.left.checked_add(self.width).is_some_and(|r| r <= width)
            && self.top.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.left, self.top
        )
    }
}

/// How a crop is fit into its resize target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Preserve aspect ratio, scale until one edge touches the target,
    /// center, and pad the remainder with the background color.
    #[default]
    Contain,
}

/// Final encoded output format. Lossy and compressed in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Avif,
}

impl OutputFormat {
    /// File extension used for written outputs.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Avif => "avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Avif => "avif",
        })
    }
}

/// Crop a region, fit it into `target`, and pad with `background`.
#[derive(Debug, Clone, PartialEq)]
pub struct CropResizePadParams<'a> {
    pub source: &'a [u8],
    pub rect: CropRect,
    pub target: Size,
    pub fit: FitMode,
    pub background: Rgb,
}

/// Paste `overlay` onto a fresh `canvas`-sized raster filled with `background`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams<'a> {
    pub canvas: Size,
    pub background: Rgb,
    pub overlay: &'a [u8],
    pub offset: Offset,
}

/// Encode into the final output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn size_serializes_as_pair() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            size: Size,
        }
        let parsed: Wrapper = toml::from_str("size = [1620, 1300]").unwrap();
        assert_eq!(parsed.size, Size::new(1620, 1300));
        let out = toml::to_string(&parsed).unwrap();
        assert!(out.contains("size = [1620, 1300]"));
    }

    #[test]
    fn crop_rect_fits_within_bounds() {
        let rect = CropRect {
            left: 3,
            top: 3,
            width: 4,
            height: 4,
        };
        assert!(rect.fits_within(10, 10));
        assert!(rect.fits_within(7, 7));
        assert!(!rect.fits_within(6, 10));
    }

    #[test]
    fn crop_rect_rejects_empty_and_overflow() {
        assert!(!CropRect::full(0, 5).fits_within(10, 10));
        let overflow = CropRect {
            left: u32::MAX,
            top: 0,
            width: 2,
            height: 1,
        };
        assert!(!overflow.fits_within(u32::MAX, 1));
    }

    #[test]
    fn crop_rect_display() {
        let rect = CropRect {
            left: 3,
            top: 5,
            width: 40,
            height: 20,
        };
        assert_eq!(rect.to_string(), "40x20+3+5");
    }

    #[test]
    fn output_format_extensions() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Avif.extension(), "avif");
        assert_eq!(OutputFormat::default(), OutputFormat::Jpeg);
    }
}
