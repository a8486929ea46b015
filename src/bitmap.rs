//! 1-bit bitmaps in the panel's native row format
//!
//! Rows are stored top to bottom, each row packed 8 pixels per byte with the
//! leftmost pixel in bit 7. A set bit is a white pixel.

use std::path::{Path, PathBuf};

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Size},
    Pixel,
};
use image::RgbaImage;
use thiserror::Error;

/// Packed byte of eight white pixels
pub const WHITE: u8 = 0xFF;
/// Packed byte of eight black pixels
pub const BLACK: u8 = 0x00;

/// Channel mean above which a pixel is white
const THRESHOLD: u32 = 0x7F;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("image {} is too small ({width} x {height})", path.display())]
    TooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    rows: usize,
    columns: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Every packed byte set to `fill`
    pub fn solid(rows: usize, columns: usize, fill: u8) -> Self {
        Bitmap {
            rows,
            columns,
            data: vec![fill; rows * columns.div_ceil(8)],
        }
    }

    /// Threshold the top-left `columns` x `rows` of `raster`.
    ///
    /// Returns `None` when the raster is smaller than that in either direction.
    pub fn from_rgba(raster: &RgbaImage, rows: usize, columns: usize) -> Option<Self> {
        if (raster.width() as usize) < columns || (raster.height() as usize) < rows {
            return None;
        }

        let mut bitmap = Bitmap::solid(rows, columns, BLACK);
        let line_bytes = bitmap.line_bytes();
        for y in 0..rows {
            for x in 0..columns {
                let [r, g, b, _] = raster.get_pixel(x as u32, y as u32).0;
                let mean = (u32::from(r) + u32::from(g) + u32::from(b)) / 3;
                if mean > THRESHOLD {
                    bitmap.data[y * line_bytes + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        Some(bitmap)
    }

    /// Decode a PNG file and threshold it to `columns` x `rows`
    pub fn load_png(path: impl AsRef<Path>, rows: usize, columns: usize) -> Result<Self, LoadError> {
        let path = path.as_ref();
        log::info!("Loading image {}", path.display());

        let raster = image::open(path)
            .map_err(|e| LoadError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .to_rgba8();

        log::debug!("Decoded size: {}x{}", raster.width(), raster.height());

        Bitmap::from_rgba(&raster, rows, columns).ok_or_else(|| LoadError::TooSmall {
            path: path.to_path_buf(),
            width: raster.width(),
            height: raster.height(),
        })
    }

    /// Flip every pixel
    pub fn invert(&mut self) {
        for byte in self.data.iter_mut() {
            *byte ^= 0xFF;
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Packed bytes in one row
    pub fn line_bytes(&self) -> usize {
        self.columns.div_ceil(8)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Packed rows, top to bottom. A bitmap without columns has empty rows.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        let line_bytes = self.line_bytes();
        (0..self.rows).map(move |row| &self.data[row * line_bytes..(row + 1) * line_bytes])
    }

    /// `Some(true)` for a white pixel, `None` outside the bitmap
    pub fn pixel(&self, x: usize, y: usize) -> Option<bool> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let byte = self.data[y * self.line_bytes() + x / 8];
        Some(byte & (0x80 >> (x % 8)) != 0)
    }

    /// Set one pixel, coordinates outside the bitmap are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize, white: bool) {
        if x >= self.columns || y >= self.rows {
            return;
        }
        let index = y * self.line_bytes() + x / 8;
        let mask = 0x80 >> (x % 8);
        if white {
            self.data[index] |= mask;
        } else {
            self.data[index] &= !mask;
        }
    }
}

impl OriginDimensions for Bitmap {
    fn size(&self) -> Size {
        Size::new(self.columns as u32, self.rows as u32)
    }
}

/// `BinaryColor::On` draws white
impl DrawTarget for Bitmap {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x < 0 || coord.y < 0 {
                continue;
            }
            self.set_pixel(coord.x as usize, coord.y as usize, color.is_on());
        }
        Ok(())
    }
}
