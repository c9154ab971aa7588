//! Tile decoder.
//!
//! Turns the bytes of an encoded tile (JPEG or PNG) into a [`TileBitmap`].
//!
//! - **Sub-sampling**: when the view is zoomed out past the coarsest level,
//!   tiles are downsampled by `2^sub_sample` at decode time so that the
//!   bitmaps held in memory match their on-screen size.
//! - **Buffer reuse**: a pooled bitmap can be passed in. When its geometry
//!   matches and no sub-sampling is needed, RGBA sources are decoded
//!   straight into it and RGB sources through a single 3-channel scratch
//!   buffer. Other cases decode into a fresh image and copy. A bitmap of the
//!   wrong geometry is dropped (edge tiles may be smaller than the standard
//!   tile).

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader, RgbaImage};

use crate::error::TileError;

use super::bitmap::TileBitmap;

/// Edge length of a decoded standard tile for a given sub-sample.
#[inline]
pub fn expected_dimension(tile_size: u32, sub_sample: u32) -> u32 {
    tile_size.checked_shr(sub_sample).unwrap_or(0).max(1)
}

fn decode_error(err: impl std::fmt::Display) -> TileError {
    TileError::Decode {
        message: err.to_string(),
    }
}

/// Decoder for encoded tile images.
#[derive(Debug, Clone, Default)]
pub struct TileDecoder {}

impl TileDecoder {
    pub fn new() -> Self {
        Self {}
    }

    /// Decode `source`, downsampled by `2^sub_sample`.
    ///
    /// When `reuse` has the decoded dimensions its pixels are overwritten and
    /// it is returned; otherwise a new bitmap is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Decode`] if `source` is not a supported image.
    pub fn decode(
        &self,
        source: &[u8],
        sub_sample: u32,
        reuse: Option<TileBitmap>,
    ) -> Result<TileBitmap, TileError> {
        let decoder = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(decode_error)?
            .into_decoder()
            .map_err(decode_error)?;

        let (width, height) = decoder.dimensions();
        let target = if sub_sample > 0 {
            (
                expected_dimension(width, sub_sample),
                expected_dimension(height, sub_sample),
            )
        } else {
            (width, height)
        };
        let reuse = reuse.filter(|bitmap| bitmap.dimensions() == target);

        if sub_sample == 0 {
            return match reuse {
                Some(mut bitmap) => {
                    decode_into(decoder, bitmap.pixels_mut())?;
                    Ok(bitmap)
                }
                None => Ok(TileBitmap::from_image(decode_rgba(decoder)?)),
            };
        }

        let full = decode_rgba(decoder)?;
        let pixels = imageops::resize(&full, target.0, target.1, FilterType::Triangle);
        match reuse {
            Some(mut bitmap) => {
                bitmap.pixels_mut().copy_from_slice(pixels.as_raw());
                Ok(bitmap)
            }
            None => Ok(TileBitmap::from_image(pixels)),
        }
    }

    /// Get image dimensions without decoding the pixels.
    pub fn dimensions(&self, source: &[u8]) -> Result<(u32, u32), TileError> {
        ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(decode_error)?
            .into_dimensions()
            .map_err(decode_error)
    }
}

fn decode_rgba(decoder: impl ImageDecoder) -> Result<RgbaImage, TileError> {
    Ok(DynamicImage::from_decoder(decoder)
        .map_err(decode_error)?
        .into_rgba8())
}

/// Decode into `pixels`, which must have the decoder's dimensions.
fn decode_into(decoder: impl ImageDecoder, pixels: &mut RgbaImage) -> Result<(), TileError> {
    match decoder.color_type() {
        ColorType::Rgba8 => decoder.read_image(pixels).map_err(decode_error),
        ColorType::Rgb8 => {
            let mut rgb = vec![0u8; decoder.total_bytes() as usize];
            decoder.read_image(&mut rgb).map_err(decode_error)?;
            for (dst, src) in pixels.chunks_exact_mut(4).zip(rgb.chunks_exact(3)) {
                dst[..3].copy_from_slice(src);
                dst[3] = u8::MAX;
            }
            Ok(())
        }
        _ => {
            let decoded = decode_rgba(decoder)?;
            pixels.copy_from_slice(decoded.as_raw());
            Ok(())
        }
    }
}
