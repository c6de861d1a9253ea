use image::GrayImage;
use log::debug;
use rqrr::PreparedImage;

use super::{Decoder, RawCode};
use crate::error::DecodeError;
use crate::models::{BlockOptions, Point, Quad};

/// Symbology name reported for every rqrr result, spelled like rxing's `QR_CODE`
pub const QR_SYMBOLOGY: &str = "QR_CODE";

/// Side of the smallest QR symbol (version 1), in modules
pub const MIN_SIDE: u32 = 21;

/// QR-only backend built on `rqrr`
///
/// Grids that are located but fail to decode are skipped rather than
/// failing the whole call. Takes no options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl Decoder for RqrrDecoder {
    fn decode(&self, image: &GrayImage, _options: &BlockOptions) -> Result<Vec<RawCode>, DecodeError> {
        if image.width() < MIN_SIDE || image.height() < MIN_SIDE {
            debug!("rqrr: {}x{} image cannot hold a symbol", image.width(), image.height());
            return Ok(Vec::new());
        }
        let (width, height) = (image.width() as usize, image.height() as usize);
        let pixels = image.as_raw();

        let mut prepared = PreparedImage::prepare_from_greyscale(width, height, |x, y| pixels[y * width + x]);
        let grids = prepared.detect_grids();

        let mut codes = Vec::with_capacity(grids.len());
        for (idx, grid) in grids.iter().enumerate() {
            match grid.decode() {
                Ok((_, content)) => {
                    // bounds run clockwise from the top-left finder
                    let corners = grid.bounds.map(|p| Point::new(p.x as f32, p.y as f32));
                    codes.push(RawCode {
                        symbology: QR_SYMBOLOGY.to_string(),
                        payload: content,
                        corners: Quad::from_clockwise(corners),
                    });
                }
                Err(err) => debug!("rqrr: grid {idx} located but not decoded: {err}"),
            }
        }

        Ok(codes)
    }
}
