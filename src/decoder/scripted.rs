use image::GrayImage;
use serde::Deserialize;

use super::{Decoder, RawCode};
use crate::error::DecodeError;
use crate::models::{BlockOptions, Point, Quad};

/// Option key holding the detections to report
pub const DETECTIONS: &str = "detections";
/// Option key making every call fail with the given message
pub const FAIL: &str = "fail";

/// Deterministic backend that reports whatever its options describe
///
/// Options:
/// - `detections`: list of `{"format", "text", "corners"}` where `corners`
///   holds four `[x, y]` pixel pairs in `[c1, c2, c3, c4]` order
/// - `fail`: error message; when present the call fails
///
/// Used to exercise the executor and merge logic without real images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedDecoder;

#[derive(Debug, Deserialize)]
struct ScriptedCode {
    format: String,
    text: String,
    corners: [[f32; 2]; 4],
}

impl Decoder for ScriptedDecoder {
    fn decode(&self, _image: &GrayImage, options: &BlockOptions) -> Result<Vec<RawCode>, DecodeError> {
        if let Some(message) = options.get(FAIL) {
            let message = message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string());
            return Err(DecodeError::Backend(message));
        }

        let Some(value) = options.get(DETECTIONS) else {
            return Ok(Vec::new());
        };
        let codes: Vec<ScriptedCode> =
            serde_json::from_value(value.clone()).map_err(|err| DecodeError::InvalidOption {
                key: DETECTIONS.to_string(),
                reason: err.to_string(),
            })?;

        Ok(codes
            .into_iter()
            .map(|code| RawCode {
                symbology: code.format,
                payload: code.text,
                corners: Quad::from_corners(code.corners.map(|[x, y]| Point::new(x, y))),
            })
            .collect())
    }
}
