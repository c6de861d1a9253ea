//! Source images and their ingestion from caller-supplied bytes.

use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::InputError;

/// Largest accepted width or height
pub const MAX_IMAGE_DIMENSION: u32 = 32768;

/// Largest accepted raw pixel buffer (500 MiB)
pub const MAX_BUFFER_SIZE: usize = 500 * 1024 * 1024;

/// Channel layout of an interleaved 8-bit pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Single luminance channel
    Gray,
    /// Luminance plus alpha, only produced by encoded inputs
    GrayAlpha,
    /// Red, green, blue
    Rgb,
    /// Blue, green, red
    Bgr,
    /// Red, green, blue, alpha
    Rgba,
    /// Blue, green, red, alpha
    Bgra,
}

impl ColorSpace {
    /// Bytes per pixel
    pub fn channels(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::GrayAlpha => 2,
            ColorSpace::Rgb | ColorSpace::Bgr => 3,
            ColorSpace::Rgba | ColorSpace::Bgra => 4,
        }
    }

    /// Default layout for a bare channel count
    pub fn from_channels(channels: usize) -> Result<Self, InputError> {
        match channels {
            1 => Ok(ColorSpace::Gray),
            3 => Ok(ColorSpace::Rgb),
            4 => Ok(ColorSpace::Rgba),
            other => Err(InputError::UnsupportedChannels(other)),
        }
    }

    /// Name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ColorSpace::Gray => "GRAY",
            ColorSpace::GrayAlpha => "GRAYA",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Bgr => "BGR",
            ColorSpace::Rgba => "RGBA",
            ColorSpace::Bgra => "BGRA",
        }
    }
}

impl FromStr for ColorSpace {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GRAY" => Ok(ColorSpace::Gray),
            "RGB" => Ok(ColorSpace::Rgb),
            "BGR" => Ok(ColorSpace::Bgr),
            "RGBA" => Ok(ColorSpace::Rgba),
            "BGRA" => Ok(ColorSpace::Bgra),
            _ => Err(InputError::UnsupportedColorSpace(s.to_string())),
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uncompressed pixels described by the caller
///
/// The layout is resolved in priority order: `color_space`, then
/// `channels`, then inferred from the buffer length.
#[derive(Debug, Clone, Default)]
pub struct RawImage {
    /// Interleaved pixel bytes
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
    /// Element type, only `uint8` is accepted
    pub dtype: Option<String>,
    /// Layout name: GRAY, RGB, BGR, RGBA or BGRA
    pub color_space: Option<String>,
    /// Channel count: 1, 3 or 4
    pub channels: Option<usize>,
}

/// Everything a caller can hand to the scanner
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Compressed file contents (PNG, JPEG, ...)
    Encoded(Vec<u8>),
    /// Uncompressed pixels
    Raw(RawImage),
}

/// Validated 8-bit image owned by one scan invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    color: ColorSpace,
}

impl SourceImage {
    /// Wrap an interleaved buffer, checking dimensions and length
    pub fn new(data: Vec<u8>, width: u32, height: u32, color: ColorSpace) -> Result<Self, InputError> {
        check_dimensions(width as i64, height as i64)?;
        let channels = color.channels();
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(InputError::LengthMismatch {
                expected,
                actual: data.len(),
                width,
                height,
                channels,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            color,
        })
    }

    /// Ingest any supported input
    pub fn from_input(input: &ImageInput) -> Result<Self, InputError> {
        match input {
            ImageInput::Encoded(bytes) => Self::from_encoded(bytes),
            ImageInput::Raw(raw) => Self::from_raw(raw),
        }
    }

    /// Decode a compressed image
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, InputError> {
        let decoded = image::load_from_memory(bytes)?;
        Self::from_dynamic(decoded)
    }

    /// Take ownership of an already decoded image
    ///
    /// Deeper formats are reduced to 8 bits per channel.
    pub fn from_dynamic(decoded: DynamicImage) -> Result<Self, InputError> {
        let (width, height) = decoded.dimensions();
        let (data, color) = match decoded {
            DynamicImage::ImageLuma8(buf) => (buf.into_raw(), ColorSpace::Gray),
            DynamicImage::ImageRgb8(buf) => (buf.into_raw(), ColorSpace::Rgb),
            DynamicImage::ImageRgba8(buf) => (buf.into_raw(), ColorSpace::Rgba),
            // alpha is dropped, decoders only see luminance
            other @ (DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_)) => {
                (other.to_luma8().into_raw(), ColorSpace::Gray)
            }
            other @ (DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_)) => {
                (other.to_rgb8().into_raw(), ColorSpace::Rgb)
            }
            other => (other.to_rgba8().into_raw(), ColorSpace::Rgba),
        };
        Self::new(data, width, height, color)
    }

    /// Validate a raw pixel description
    pub fn from_raw(raw: &RawImage) -> Result<Self, InputError> {
        let (width, height) = check_dimensions(raw.width, raw.height)?;

        if let Some(dtype) = &raw.dtype {
            if dtype != "uint8" {
                return Err(InputError::UnsupportedDtype(dtype.clone()));
            }
        }

        let pixels = width as usize * height as usize;
        let color = if let Some(name) = &raw.color_space {
            let color: ColorSpace = name.parse()?;
            let expected = pixels * color.channels();
            if expected > MAX_BUFFER_SIZE {
                return Err(InputError::BufferTooLarge {
                    bytes: expected,
                    max: MAX_BUFFER_SIZE,
                });
            }
            color
        } else if let Some(channels) = raw.channels {
            ColorSpace::from_channels(channels)?
        } else {
            if raw.data.len() % pixels != 0 {
                return Err(InputError::CannotInferChannels {
                    len: raw.data.len(),
                    pixels,
                });
            }
            ColorSpace::from_channels(raw.data.len() / pixels)?
        };

        Self::new(raw.data.clone(), width, height, color)
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel layout
    pub fn color(&self) -> ColorSpace {
        self.color
    }

    /// Interleaved pixel bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Scale both sides by `percent` (0, 100] with linear filtering
    ///
    /// Returns `None` when the percentage is out of range.
    pub fn resized(&self, percent: f32) -> Option<Self> {
        if !(percent > 0.0 && percent <= 100.0) {
            return None;
        }
        if percent >= 100.0 {
            return Some(self.clone());
        }

        let scale = percent / 100.0;
        let new_w = ((self.width as f32 * scale).round() as u32).max(1);
        let new_h = ((self.height as f32 * scale).round() as u32).max(1);
        let (w, h) = (self.width, self.height);

        let data = match self.color.channels() {
            1 => resize_buffer::<image::Luma<u8>>(&self.data, w, h, new_w, new_h),
            2 => resize_buffer::<image::LumaA<u8>>(&self.data, w, h, new_w, new_h),
            3 => resize_buffer::<image::Rgb<u8>>(&self.data, w, h, new_w, new_h),
            _ => resize_buffer::<image::Rgba<u8>>(&self.data, w, h, new_w, new_h),
        }?;

        Some(Self {
            data,
            width: new_w,
            height: new_h,
            color: self.color,
        })
    }
}

fn resize_buffer<P>(data: &[u8], w: u32, h: u32, new_w: u32, new_h: u32) -> Option<Vec<u8>>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    let buffer = image::ImageBuffer::<P, &[u8]>::from_raw(w, h, data)?;
    Some(image::imageops::resize(&buffer, new_w, new_h, FilterType::Triangle).into_raw())
}

fn check_dimensions(width: i64, height: i64) -> Result<(u32, u32), InputError> {
    if width <= 0 || height <= 0 {
        return Err(InputError::InvalidDimensions { width, height });
    }
    let max = MAX_IMAGE_DIMENSION as i64;
    if width > max || height > max {
        return Err(InputError::TooLarge {
            max: MAX_IMAGE_DIMENSION,
        });
    }
    Ok((width as u32, height as u32))
}
