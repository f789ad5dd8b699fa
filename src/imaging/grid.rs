//! The decoded pixel grid every detection stage works on.
//!
//! Decoding is the raster engine's job; this module only fixes the shape of
//! what comes out of it. A [`PixelGrid`] is `height` rows of `width` RGB
//! triples, stored row-major. Alpha and any extra channels are dropped by
//! the engine before the grid is built.
//!
//! The constructors reject zero-sized grids, so every grid that exists has at
//! least one pixel and the threshold estimator always has a defined mean.

use thiserror::Error;

/// One RGB sample.
pub type Pixel = [u8; 3];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("pixel buffer holds {actual} values, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Immutable `[row][col]` grid of RGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Build a grid from row-major pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(GridError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a grid from an interleaved `RGBRGB...` buffer.
    pub fn from_raw_rgb(width: u32, height: u32, raw: &[u8]) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if raw.len() != expected {
            return Err(GridError::SizeMismatch {
                width,
                height,
                expected,
                actual: raw.len(),
            });
        }
        let pixels = raw.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        Self::new(width, height, pixels)
    }

    /// Build a grid by evaluating `f(col, row)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Pixel,
    ) -> Result<Self, GridError> {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                pixels.push(f(col, row));
            }
        }
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Pixel at `(row, col)`. Panics when out of range, like slice indexing.
    pub fn get(&self, row: u32, col: u32) -> Pixel {
        assert!(row < self.height && col < self.width, "pixel out of range");
        self.pixels[row as usize * self.width as usize + col as usize]
    }

    /// All pixels of horizontal line `row`, left to right.
    pub fn row(&self, row: u32) -> &[Pixel] {
        let w = self.width as usize;
        let start = row as usize * w;
        &self.pixels[start..start + w]
    }

    /// All pixels of vertical line `col`, top to bottom.
    pub fn column(&self, col: u32) -> impl Iterator<Item = Pixel> + '_ {
        assert!(col < self.width, "column out of range");
        self.pixels
            .iter()
            .skip(col as usize)
            .step_by(self.width as usize)
            .copied()
    }

    /// Every pixel in row-major order.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: u32, height: u32) -> PixelGrid {
        PixelGrid::from_fn(width, height, |col, row| [row as u8, col as u8, 0]).unwrap()
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert_eq!(
            PixelGrid::new(0, 4, vec![]),
            Err(GridError::Empty {
                width: 0,
                height: 4
            })
        );
        assert!(matches!(
            PixelGrid::from_raw_rgb(3, 0, &[]),
            Err(GridError::Empty { .. })
        ));
    }

    #[test]
    fn new_rejects_wrong_pixel_count() {
        let err = PixelGrid::new(2, 2, vec![[0, 0, 0]; 3]).unwrap_err();
        assert_eq!(
            err,
            GridError::SizeMismatch {
                width: 2,
                height: 2,
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn from_raw_rgb_groups_triples() {
        let raw = [1, 2, 3, 4, 5, 6];
        let grid = PixelGrid::from_raw_rgb(2, 1, &raw).unwrap();
        assert_eq!(grid.get(0, 0), [1, 2, 3]);
        assert_eq!(grid.get(0, 1), [4, 5, 6]);
    }

    #[test]
    fn from_raw_rgb_rejects_short_buffer() {
        assert!(matches!(
            PixelGrid::from_raw_rgb(2, 2, &[0; 11]),
            Err(GridError::SizeMismatch { expected: 12, .. })
        ));
    }

    #[test]
    fn row_and_column_access() {
        let grid = numbered(4, 3);
        assert_eq!(grid.row(2), &[[2, 0, 0], [2, 1, 0], [2, 2, 0], [2, 3, 0]]);
        let col: Vec<Pixel> = grid.column(1).collect();
        assert_eq!(col, vec![[0, 1, 0], [1, 1, 0], [2, 1, 0]]);
    }

    #[test]
    fn dimensions_match_construction() {
        let grid = numbered(5, 7);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 7);
        assert_eq!(grid.pixel_count(), 35);
    }

    #[test]
    #[should_panic(expected = "pixel out of range")]
    fn get_out_of_range_panics() {
        numbered(2, 2).get(2, 0);
    }
}
