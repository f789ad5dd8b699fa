//! Pure Rust raster engine on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Flatten alpha | per-pixel blend over the background color |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Pad / composite | `imageops::overlay` onto a filled `RgbImage` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//!
//! Intermediate buffers between calls are lossless PNG so that no quality is
//! lost before the single final encode.

use super::backend::{BackendError, Decoded, ImageBackend};
use super::calculations::{calculate_contain_dimensions, center_offset};
use super::grid::PixelGrid;
use super::params::{CompositeParams, CropResizePadParams, EncodeParams, OutputFormat, Rgb, Size};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in and known to work.
///
/// AVIF is excluded: the `image` crate's `"avif"` feature only enables the
/// **encoder** (rav1e). `ImageFormat::reading_enabled()` returns `true` for AVIF
/// anyway, so the candidate list cannot contain it.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Write an intermediate raster as PNG.
fn to_png(img: &RgbImage) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG intermediate failed: {e}")))?;
    Ok(buffer)
}

fn filled_canvas(size: Size, background: Rgb) -> RgbImage {
    RgbImage::from_pixel(size.width, size.height, image::Rgb(background.0))
}

/// Alpha-blend one channel over the background, rounding to nearest.
fn blend(channel: u8, alpha: u8, background: u8) -> u8 {
    let a = alpha as u32;
    ((channel as u32 * a + background as u32 * (255 - a) + 127) / 255) as u8
}

fn flatten(img: &DynamicImage, background: Rgb) -> RgbImage {
    let rgba = img.to_rgba8();
    let [br, bg, bb] = background.0;
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        image::Rgb([blend(r, a, br), blend(g, a, bg), blend(b, a, bb)])
    })
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, BackendError> {
        let img = load_image(bytes)?;
        let color = img.color();
        let rgb = img.to_rgb8();
        let grid = PixelGrid::from_raw_rgb(rgb.width(), rgb.height(), rgb.as_raw())?;
        Ok(Decoded {
            grid,
            channels: color.channel_count(),
            has_alpha: color.has_alpha(),
        })
    }

    fn flatten_to_opaque(&self, bytes: &[u8], background: Rgb) -> Result<Vec<u8>, BackendError> {
        let img = load_image(bytes)?;
        to_png(&flatten(&img, background))
    }

    fn crop_resize_pad(&self, params: &CropResizePadParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(params.source)?;
        let rect = params.rect;
        if !rect.fits_within(img.width(), img.height()) {
            return Err(BackendError::ProcessingFailed(format!(
                "crop {rect} outside {}x{} image",
                img.width(),
                img.height()
            )));
        }

        let cropped = img.crop_imm(rect.left, rect.top, rect.width, rect.height);
        let fitted = calculate_contain_dimensions(rect.size(), params.target);
        let resized = cropped
            .resize_exact(fitted.width, fitted.height, FilterType::Lanczos3)
            .to_rgb8();

        let mut canvas = filled_canvas(params.target, params.background);
        let offset = center_offset(params.target, fitted);
        imageops::overlay(&mut canvas, &resized, offset.left as i64, offset.top as i64);
        to_png(&canvas)
    }

    fn composite_on_canvas(&self, params: &CompositeParams) -> Result<Vec<u8>, BackendError> {
        let overlay = load_image(params.overlay)?.to_rgb8();
        let mut canvas = filled_canvas(params.canvas, params.background);
        imageops::overlay(
            &mut canvas,
            &overlay,
            params.offset.left as i64,
            params.offset.top as i64,
        );
        to_png(&canvas)
    }

    fn encode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let img = DynamicImage::ImageRgb8(load_image(bytes)?.to_rgb8());
        let quality = params.quality.value() as u8;
        let mut buffer = Vec::new();
        let result = match params.format {
            OutputFormat::Jpeg => img.write_with_encoder(
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality),
            ),
            OutputFormat::Avif => img.write_with_encoder(
                image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buffer, 6, quality),
            ),
        };
        result.map_err(|e| BackendError::Encode(format!("{} encode failed: {e}", params.format)))?;
        Ok(buffer)
    }
}
