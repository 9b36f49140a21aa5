//! Pure Rust codec backed by the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` |
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` + `to_luma8` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 95) |
//! | Encode → PNG, TIFF, BMP | `DynamicImage::write_to` |

use super::buffer::PixelBuffer;
use super::codec::{CodecError, Dimensions, ImageCodec, OutputFormat};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

/// JPEG output quality. Denoised output is compared against references, so
/// keep compression artifacts low.
const JPEG_QUALITY: u8 = 95;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has a decodable extension (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// `image`-crate codec. See the [module docs](self) for the mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn into_pixel_buffer(img: DynamicImage) -> Result<PixelBuffer, CodecError> {
    let gray = img.into_luma8();
    let (width, height) = gray.dimensions();
    Ok(PixelBuffer::new(width, height, gray.into_raw())?)
}

fn to_gray_image(buffer: &PixelBuffer) -> Result<GrayImage, CodecError> {
    GrayImage::from_raw(buffer.width(), buffer.height(), buffer.samples().to_vec())
        .ok_or_else(|| CodecError::Encode("Buffer does not fit its dimensions".into()))
}

impl ImageCodec for RustCodec {
    fn identify(&self, path: &Path) -> Result<Dimensions, CodecError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            CodecError::Decode(format!("Failed to read dimensions of {}: {e}", path.display()))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode_file(&self, path: &Path) -> Result<PixelBuffer, CodecError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| CodecError::Decode(format!("Failed to decode {}: {e}", path.display())))?;
        into_pixel_buffer(img)
    }

    fn decode_bytes(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        into_pixel_buffer(img)
    }

    fn encode_bytes(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
    ) -> Result<Vec<u8>, CodecError> {
        let gray = to_gray_image(buffer)?;
        let mut out = Cursor::new(Vec::new());
        let written = match format {
            OutputFormat::Jpeg => {
                let encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
                gray.write_with_encoder(encoder)
            }
            OutputFormat::Png => gray.write_to(&mut out, ImageFormat::Png),
            OutputFormat::Tiff => gray.write_to(&mut out, ImageFormat::Tiff),
            OutputFormat::Bmp => gray.write_to(&mut out, ImageFormat::Bmp),
        };
        written.map_err(|e| {
            CodecError::Encode(format!("{} encode failed: {e}", format.extension()))
        })?;
        Ok(out.into_inner())
    }
}
