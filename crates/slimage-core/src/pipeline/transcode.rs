//! Decode, bound, and re-encode a single image.
//!
//! [`ImageTranscoder::transcode`] is a pure function of its input bytes: no
//! I/O, no shared state, and every failure comes back as a [`TranscodeError`].

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageError, ImageReader, Limits, RgbImage};
use jpeg_encoder::{ColorType, Encoder};
use std::io::Cursor;

use crate::config::{Config, LimitsConfig, TranscodeConfig};
use crate::error::{TranscodeError, TranscodeResult};
use crate::types::{TranscodeStats, TranscodedImage};

/// Resizes images to a bounded width and re-encodes them as JPEG.
#[derive(Debug, Clone)]
pub struct ImageTranscoder {
    max_width: u32,
    quality: u8,
    max_pixels: u64,
}

impl ImageTranscoder {
    /// Create a transcoder from its settings and decoder limits.
    pub fn new(transcode: &TranscodeConfig, limits: &LimitsConfig) -> Self {
        Self {
            max_width: transcode.max_width,
            quality: transcode.quality,
            max_pixels: limits.max_image_pixels,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.transcode, &config.limits)
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Transcode raw encoded image bytes.
    ///
    /// Images wider than `max_width` are scaled with Lanczos3 to exactly
    /// `max_width` wide; narrower images keep their dimensions. The result is
    /// always an opaque RGB JPEG.
    pub fn transcode(&self, raw: &[u8]) -> TranscodeResult<TranscodedImage> {
        let image = self.decode(raw)?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TranscodeError::Resize {
                message: format!("source has zero dimension ({}x{})", width, height),
            });
        }

        let (out_width, out_height) = target_dimensions(width, height, self.max_width);
        let resized = if (out_width, out_height) == (width, height) {
            image
        } else {
            image.resize_exact(out_width, out_height, FilterType::Lanczos3)
        };

        // Alpha is dropped, palettes expanded, grayscale promoted.
        let rgb = resized.to_rgb8();
        let bytes = encode_jpeg(&rgb, self.quality)?;

        let stats = TranscodeStats {
            original_size: raw.len() as u64,
            new_size: bytes.len() as u64,
            source_dimensions: (width, height),
            output_dimensions: (rgb.width(), rgb.height()),
        };
        tracing::trace!(
            "Transcoded {}x{} -> {}x{} ({} -> {} bytes)",
            width,
            height,
            stats.output_dimensions.0,
            stats.output_dimensions.1,
            stats.original_size,
            stats.new_size
        );

        Ok(TranscodedImage { bytes, stats })
    }

    fn decode(&self, raw: &[u8]) -> TranscodeResult<DynamicImage> {
        if raw.is_empty() {
            return Err(TranscodeError::Decode {
                message: "empty image payload".to_string(),
            });
        }

        // Only the header is read here; the pixel area is checked before any allocation.
        let (width, height) = reader(raw)?.into_dimensions().map_err(decode_failure)?;
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.max_pixels {
            return Err(TranscodeError::ImageTooLarge {
                message: format!(
                    "{}x{} is {} pixels, limit is {}",
                    width, height, pixels, self.max_pixels
                ),
            });
        }

        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_pixels.saturating_mul(MAX_BYTES_PER_PIXEL));
        let mut reader = reader(raw)?;
        reader.limits(limits);
        reader.decode().map_err(decode_failure)
    }
}

/// Widest decoded pixel layout (RGBA of f32).
const MAX_BYTES_PER_PIXEL: u64 = 16;

fn reader(raw: &[u8]) -> TranscodeResult<ImageReader<Cursor<&[u8]>>> {
    let reader = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| TranscodeError::Decode {
            message: format!("Cannot detect image format: {}", e),
        })?;
    if reader.format().is_none() {
        return Err(TranscodeError::UnsupportedFormat);
    }
    Ok(reader)
}

fn decode_failure(error: ImageError) -> TranscodeError {
    match error {
        ImageError::Limits(limit) => TranscodeError::ImageTooLarge {
            message: limit.to_string(),
        },
        other => TranscodeError::Decode {
            message: other.to_string(),
        },
    }
}

/// Output dimensions for a source of `width` x `height`.
///
/// Wider than `max_width`: `(max_width, round(max_width * height / width))`,
/// rounding half up and never below one pixel. Otherwise unchanged.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let (w, h, max) = (width as u64, height as u64, max_width as u64);
    let scaled = (2 * max * h + w) / (2 * w);
    (max_width, scaled.max(1) as u32)
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> TranscodeResult<Vec<u8>> {
    let too_wide = |_| TranscodeError::Encode {
        message: format!(
            "{}x{} exceeds the JPEG dimension limit of 65535",
            rgb.width(),
            rgb.height()
        ),
    };
    let width = u16::try_from(rgb.width()).map_err(too_wide)?;
    let height = u16::try_from(rgb.height()).map_err(too_wide)?;

    let mut buffer = Vec::new();
    // The encoder's quality floor is 1.
    let mut encoder = Encoder::new(&mut buffer, quality.clamp(1, 100));
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| TranscodeError::Encode {
            message: e.to_string(),
        })?;

    Ok(buffer)
}
