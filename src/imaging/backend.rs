//! Raster engine trait and shared types.
//!
//! The [`ImageBackend`] trait is the narrow contract between the detection
//! core and whatever does the actual pixel work. Every backend must support
//! five operations: decode, flatten, crop-resize-pad, composite, and encode.
//! Images travel between calls as encoded byte buffers, so a backend is free
//! to choose its own intermediate format.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` crate.

use super::grid::{GridError, PixelGrid};
use super::params::{CompositeParams, CropResizePadParams, EncodeParams, Rgb};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of a decode operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// RGB samples taken from the first three channels.
    pub grid: PixelGrid,
    /// Channel count of the source image (3 for RGB, 4 for RGBA, 1 or 2 for gray).
    pub channels: u8,
    /// True when the source carries an alpha channel.
    pub has_alpha: bool,
}

/// Trait for raster engines.
///
/// Implementations must be `Sync`: one backend instance is shared by every
/// worker thread in a batch.
pub trait ImageBackend: Sync {
    /// Decode image bytes into a pixel grid plus basic metadata.
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, BackendError>;

    /// Composite the image over an opaque `background`, dropping alpha.
    fn flatten_to_opaque(&self, bytes: &[u8], background: Rgb) -> Result<Vec<u8>, BackendError>;

    /// Crop a rectangle, fit it into the target size, and pad the remainder.
    fn crop_resize_pad(&self, params: &CropResizePadParams) -> Result<Vec<u8>, BackendError>;

    /// Paste an overlay onto a fresh canvas filled with the background color.
    fn composite_on_canvas(&self, params: &CompositeParams) -> Result<Vec<u8>, BackendError>;

    /// Encode into the final output format.
    fn encode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{CropRect, Offset, OutputFormat, Size};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// Decode results are looked up by the exact input bytes, so parallel
    /// callers each get their own image regardless of scheduling order.
    #[derive(Default)]
    pub struct MockBackend {
        pub images: Mutex<HashMap<Vec<u8>, Decoded>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_encode: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Flatten(usize),
        CropResizePad {
            rect: CropRect,
            target: Size,
        },
        Composite {
            canvas: Size,
            offset: Offset,
        },
        Encode {
            format: OutputFormat,
            quality: u32,
        },
    }

    /// Bytes the mock produces for a flattened input.
    pub const FLATTENED: &[u8] = b"mock:flattened";
    /// Bytes the mock produces for a crop-resize-pad call.
    pub const CROPPED: &[u8] = b"mock:cropped";
    /// Bytes the mock produces for a composite call.
    pub const COMPOSITED: &[u8] = b"mock:composited";

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register what `decode` returns for a given input.
        pub fn with_image(self, bytes: &[u8], decoded: Decoded) -> Self {
            self.images.lock().unwrap().insert(bytes.to_vec(), decoded);
            self
        }

        pub fn failing_encode(mut self) -> Self {
            self.fail_encode = true;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<Decoded, BackendError> {
            self.record(RecordedOp::Decode(bytes.len()));
            self.images
                .lock()
                .unwrap()
                .get(bytes)
                .cloned()
                .ok_or_else(|| BackendError::Decode("no mock image for input".to_string()))
        }

        fn flatten_to_opaque(&self, bytes: &[u8], _background: Rgb) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Flatten(bytes.len()));
            Ok(FLATTENED.to_vec())
        }

        fn crop_resize_pad(&self, params: &CropResizePadParams) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::CropResizePad {
                rect: params.rect,
                target: params.target,
            });
            Ok(CROPPED.to_vec())
        }

        fn composite_on_canvas(&self, params: &CompositeParams) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Composite {
                canvas: params.canvas,
                offset: params.offset,
            });
            Ok(COMPOSITED.to_vec())
        }

        fn encode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Encode {
                format: params.format,
                quality: params.quality.value(),
            });
            if self.fail_encode {
                return Err(BackendError::Encode("mock encoder refused".to_string()));
            }
            let mut out = format!("encoded-{}:", params.format).into_bytes();
            out.extend_from_slice(bytes);
            Ok(out)
        }
    }

    #[test]
    fn mock_decodes_registered_bytes() {
        let grid = PixelGrid::from_fn(2, 2, |_, _| [255, 255, 255]).unwrap();
        let backend = MockBackend::new().with_image(
            b"white",
            Decoded {
                grid: grid.clone(),
                channels: 3,
                has_alpha: false,
            },
        );

        let decoded = backend.decode(b"white").unwrap();
        assert_eq!(decoded.grid, grid);
        assert!(matches!(backend.decode(b"other"), Err(BackendError::Decode(_))));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Decode(5), RecordedOp::Decode(5)]
        );
    }

    #[test]
    fn mock_records_crop_and_composite() {
        let backend = MockBackend::new();
        let rect = CropRect::full(10, 10);
        backend
            .crop_resize_pad(&CropResizePadParams {
                source: b"src",
                rect,
                target: Size::new(1200, 1200),
                fit: Default::default(),
                background: Rgb::WHITE,
            })
            .unwrap();
        backend
            .composite_on_canvas(&CompositeParams {
                canvas: Size::new(1620, 1620),
                background: Rgb::WHITE,
                overlay: CROPPED,
                offset: Offset::new(210, 210),
            })
            .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::CropResizePad {
                    rect,
                    target: Size::new(1200, 1200)
                },
                RecordedOp::Composite {
                    canvas: Size::new(1620, 1620),
                    offset: Offset::new(210, 210)
                },
            ]
        );
    }

    #[test]
    fn mock_encode_can_fail() {
        let backend = MockBackend::new().failing_encode();
        let result = backend.encode(b"x", &EncodeParams::default());
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }
}
