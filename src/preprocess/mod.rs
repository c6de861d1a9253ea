//! Grayscale preparation applied to the source image before each decoder.
//!
//! - `original`: luminance only
//! - `histogram`: luminance + global histogram equalization
//! - `otsu`: equalized luminance binarized at the Otsu level

pub mod grayscale;

use image::GrayImage;
use imageproc::contrast::{equalize_histogram, otsu_level, threshold};

use crate::error::PreprocessError;
use crate::models::{Preprocessing, SourceImage};

pub use grayscale::to_grayscale;

impl Preprocessing {
    /// Produce the grayscale image a decoder will see
    ///
    /// The output always has the dimensions of `image`.
    pub fn transform(&self, image: &SourceImage) -> Result<GrayImage, PreprocessError> {
        let gray = to_grayscale(image)?;

        let prepared = match self {
            Preprocessing::Original => gray,
            Preprocessing::Histogram => equalize_histogram(&gray),
            Preprocessing::Otsu => binarize_otsu(&equalize_histogram(&gray)),
        };

        let expected = (image.width(), image.height());
        if prepared.dimensions() != expected {
            return Err(PreprocessError::DimensionMismatch {
                expected,
                actual: prepared.dimensions(),
            });
        }
        Ok(prepared)
    }
}

/// Pixels above the Otsu level become 255, the rest 0
fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    threshold(gray, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColorSpace;

    fn gradient(width: u32, height: u32) -> SourceImage {
        // narrow band of mid grays
        let data = (0..width * height)
            .map(|i| 100 + (i % 40) as u8)
            .collect::<Vec<_>>();
        SourceImage::new(data, width, height, ColorSpace::Gray).unwrap()
    }

    #[test]
    fn test_original_is_plain_luminance() {
        let image = gradient(8, 5);
        let out = Preprocessing::Original.transform(&image).unwrap();
        assert_eq!(out.as_raw().as_slice(), image.data());
    }

    #[test]
    fn test_histogram_stretches_range() {
        let image = gradient(40, 10);
        let out = Preprocessing::Histogram.transform(&image).unwrap();
        assert_eq!(out.dimensions(), (40, 10));

        let min = *out.as_raw().iter().min().unwrap();
        let max = *out.as_raw().iter().max().unwrap();
        assert!(max - min > 200, "range {min}..{max} not stretched");
    }

    #[test]
    fn test_otsu_is_binary() {
        let mut data = vec![50u8; 50];
        data.extend(vec![200u8; 50]);
        let image = SourceImage::new(data, 10, 10, ColorSpace::Gray).unwrap();

        let out = Preprocessing::Otsu.transform(&image).unwrap();
        assert!(out.as_raw().iter().all(|&v| v == 0 || v == 255));
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(0, 9).0[0], 255);
    }

    #[test]
    fn test_every_method_keeps_dimensions() {
        let image = SourceImage::new(vec![90; 7 * 3 * 4], 7, 3, ColorSpace::Bgra).unwrap();
        for method in [Preprocessing::Original, Preprocessing::Histogram, Preprocessing::Otsu] {
            let out = method.transform(&image).unwrap();
            assert_eq!(out.dimensions(), (7, 3), "{method}");
        }
    }
}
