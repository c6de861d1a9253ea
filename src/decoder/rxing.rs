use image::GrayImage;
use log::trace;
use rxing::{BarcodeFormat, DecodeHintType, DecodeHintValue, DecodingHintDictionary, Exceptions, RXingResult};

use super::{bool_option, Decoder, RawCode};
use crate::error::DecodeError;
use crate::models::{BlockOptions, Point, Quad};

/// Option key enabling the slower, more thorough search.
pub const TRY_HARDER: &str = "tryHarder";

/// Images with a side below this hold no symbol; some rxing detectors
/// underflow on them.
pub const MIN_SIDE: u32 = 6;

/// Multi-format backend built on `rxing`.
///
/// Options:
/// - `tryHarder` (bool, default `false`)
///
/// QR results keep their orientation: the quad is spanned by the three
/// finder pattern centers. Other formats report the axis-aligned box around
/// their result points, since 1D formats only expose the two ends of a scan
/// line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RxingDecoder;

impl Decoder for RxingDecoder {
    fn decode(&self, image: &GrayImage, options: &BlockOptions) -> Result<Vec<RawCode>, DecodeError> {
        let try_harder = bool_option(options, TRY_HARDER, false)?;
        if image.width() < MIN_SIDE || image.height() < MIN_SIDE {
            trace!("rxing: {}x{} image too small, skipped", image.width(), image.height());
            return Ok(Vec::new());
        }

        // the helper turns try-harder on unless told otherwise
        let mut hints = DecodingHintDictionary::new();
        hints.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(try_harder));

        let results = match rxing::helpers::detect_multiple_in_luma_with_hints(
            image.as_raw().clone(),
            image.width(),
            image.height(),
            &mut hints,
        ) {
            Ok(results) => results,
            Err(Exceptions::NotFoundException(_)) => return Ok(Vec::new()),
            Err(err) => return Err(DecodeError::Backend(format!("rxing: {err}"))),
        };

        Ok(results.iter().filter_map(to_raw_code).collect())
    }
}

fn to_raw_code(result: &RXingResult) -> Option<RawCode> {
    let points: Vec<Point> = result.getPoints().iter().map(|p| Point::new(p.x, p.y)).collect();

    let corners = match (result.getBarcodeFormat(), points.as_slice()) {
        // bottom-left, top-left, top-right finders, optional alignment pattern
        (BarcodeFormat::QR_CODE, [bottom_left, top_left, top_right, ..]) => {
            finder_quad(*bottom_left, *top_left, *top_right)
        }
        _ => match Quad::bounding(&points) {
            Some(quad) => quad,
            None => {
                trace!("rxing: dropping result without points ({})", result.getText());
                return None;
            }
        },
    };

    Some(RawCode {
        symbology: format!("{:?}", result.getBarcodeFormat()),
        payload: result.getText().to_string(),
        corners,
    })
}

/// Parallelogram through three finder centers, completed at the bottom-right.
pub(crate) fn finder_quad(bottom_left: Point, top_left: Point, top_right: Point) -> Quad {
    let bottom_right = Point::new(
        top_right.x + bottom_left.x - top_left.x,
        top_right.y + bottom_left.y - top_left.y,
    );
    Quad::from_clockwise([top_left, top_right, bottom_right, bottom_left])
}
