//! Luminance conversion for interleaved 8-bit images
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8.
//!
//! Rows are converted in parallel with rayon; alpha is ignored.

use image::GrayImage;
use rayon::prelude::*;

use crate::error::PreprocessError;
use crate::models::{ColorSpace, SourceImage};

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Byte offsets of the red, green and blue samples inside one pixel
#[derive(Debug, Clone, Copy)]
struct ChannelOrder {
    stride: usize,
    r: usize,
    g: usize,
    b: usize,
}

impl ChannelOrder {
    fn for_color(color: ColorSpace) -> Option<Self> {
        let (stride, r, g, b) = match color {
            ColorSpace::Rgb => (3, 0, 1, 2),
            ColorSpace::Bgr => (3, 2, 1, 0),
            ColorSpace::Rgba => (4, 0, 1, 2),
            ColorSpace::Bgra => (4, 2, 1, 0),
            ColorSpace::Gray | ColorSpace::GrayAlpha => return None,
        };
        Some(Self { stride, r, g, b })
    }
}

/// Convert a source image to an 8-bit grayscale image of the same size
pub fn to_grayscale(image: &SourceImage) -> Result<GrayImage, PreprocessError> {
    let (width, height) = (image.width(), image.height());

    let gray = match image.color() {
        ColorSpace::Gray => image.data().to_vec(),
        ColorSpace::GrayAlpha => {
            return Err(PreprocessError::UnsupportedLayout(ColorSpace::GrayAlpha.name()));
        }
        color => {
            let order = ChannelOrder::for_color(color)
                .ok_or(PreprocessError::UnsupportedLayout(color.name()))?;
            color_to_grayscale_parallel(image.data(), width as usize, height as usize, order)
        }
    };

    GrayImage::from_raw(width, height, gray).ok_or(PreprocessError::DimensionMismatch {
        expected: (width, height),
        actual: (0, 0),
    })
}

/// Convert interleaved color pixels to grayscale, one row per rayon task
fn color_to_grayscale_parallel(data: &[u8], width: usize, height: usize, order: ChannelOrder) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    let row_bytes = width * order.stride;

    gray.par_chunks_mut(width)
        .zip(data.par_chunks(row_bytes))
        .for_each(|(out, row)| {
            for (dst, px) in out.iter_mut().zip(row.chunks_exact(order.stride)) {
                *dst = luminance(px[order.r], px[order.g], px[order.b]);
            }
        });

    gray
}

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}
