use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageBuffer, RgbImage};

use crate::error::ProcessError;

/// Colour model of an uncompressed image stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorKind {
    fn components(self) -> usize {
        match self {
            ColorKind::Gray => 1,
            ColorKind::Rgb => 3,
            ColorKind::Cmyk => 4,
        }
    }
}

/// How the bytes of an embedded image are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEncoding {
    /// A complete JPEG file (`DCTDecode`).
    Jpeg,
    /// Decoded samples, row-major, rows padded to whole bytes.
    Raw { color: ColorKind, bits_per_component: u8 },
    /// Anything the decoder does not handle, such as JBIG2 or CCITT fax.
    Unsupported(String),
}

/// A raster image embedded in a PDF page.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    /// Uncompressed 8-bit grayscale image.
    pub fn gray(name: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            encoding: ImageEncoding::Raw {
                color: ColorKind::Gray,
                bits_per_component: 8,
            },
            data,
        }
    }

    pub fn decode(&self) -> Result<DynamicImage, ProcessError> {
        match &self.encoding {
            ImageEncoding::Jpeg => image::load_from_memory(&self.data).map_err(|e| {
                ProcessError::ImageProcessing(format!("Failed to decode '{}': {}", self.name, e))
            }),
            ImageEncoding::Raw {
                color,
                bits_per_component,
            } => decode_raw(self, *color, *bits_per_component),
            ImageEncoding::Unsupported(kind) => Err(ProcessError::UnsupportedImage(format!(
                "'{}' uses {}",
                self.name, kind
            ))),
        }
    }
}

fn decode_raw(
    image: &EmbeddedImage,
    color: ColorKind,
    bits_per_component: u8,
) -> Result<DynamicImage, ProcessError> {
    let (width, height) = (image.width, image.height);

    if width == 0 || height == 0 {
        return Err(ProcessError::ImageProcessing(format!(
            "'{}' has empty dimensions {}x{}",
            image.name, width, height
        )));
    }

    let too_short = |expected: usize| {
        ProcessError::ImageProcessing(format!(
            "'{}' holds {} bytes, expected {}",
            image.name,
            image.data.len(),
            expected
        ))
    };

    let oversized = || {
        ProcessError::ImageProcessing(format!(
            "'{}' is too large: {}x{}",
            image.name, width, height
        ))
    };

    match (color, bits_per_component) {
        (ColorKind::Gray, 1) => {
            let row_bytes = (width as usize).div_ceil(8);
            let expected = row_bytes
                .checked_mul(height as usize)
                .ok_or_else(oversized)?;
            if image.data.len() < expected {
                return Err(too_short(expected));
            }
            let buffer = GrayImage::from_fn(width, height, |x, y| {
                let byte = image.data[y as usize * row_bytes + x as usize / 8];
                let bit = (byte >> (7 - (x % 8))) & 1;
                image::Luma([if bit == 1 { 255 } else { 0 }])
            });
            Ok(DynamicImage::ImageLuma8(buffer))
        }
        (_, 8) => {
            let expected = (width as usize)
                .checked_mul(height as usize)
                .and_then(|pixels| pixels.checked_mul(color.components()))
                .ok_or_else(oversized)?;
            if image.data.len() < expected {
                return Err(too_short(expected));
            }
            let samples = image.data[..expected].to_vec();
            match color {
                ColorKind::Gray => GrayImage::from_raw(width, height, samples)
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| too_short(expected)),
                ColorKind::Rgb => RgbImage::from_raw(width, height, samples)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| too_short(expected)),
                ColorKind::Cmyk => {
                    let rgb: Vec<u8> = samples.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
                    ImageBuffer::from_raw(width, height, rgb)
                        .map(DynamicImage::ImageRgb8)
                        .ok_or_else(|| too_short(expected))
                }
            }
        }
        (color, bits) => Err(ProcessError::UnsupportedImage(format!(
            "'{}' uses {:?} at {} bits per component",
            image.name, color, bits
        ))),
    }
}

fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let k = 255 - cmyk[3] as u16;
    let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}

/// Halves both dimensions before recognition. Never goes below 1x1.
pub fn downscale_half(image: &DynamicImage) -> DynamicImage {
    let width = (image.width() / 2).max(1);
    let height = (image.height() / 2).max(1);
    image.resize_exact(width, height, FilterType::Lanczos3)
}
