//! Image container codec trait and shared types.
//!
//! Filtering never sees compressed bytes. The [`ImageCodec`] trait is the
//! boundary to the decode/encode layer: it turns a file or byte stream into a
//! single-channel [`PixelBuffer`] and serializes a buffer back out.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec), built on the `image` crate.

use super::buffer::PixelBuffer;
use super::error::ImagingError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Container formats a buffer can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

impl OutputFormat {
    /// Pick a format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, CodecError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "bmp" => Ok(OutputFormat::Bmp),
            other => Err(CodecError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Tiff => "tif",
            OutputFormat::Bmp => "bmp",
        }
    }
}

/// Trait for decode/encode backends.
///
/// Decoding always yields grayscale: colour inputs are reduced to luma.
pub trait ImageCodec: Sync {
    /// Read image dimensions without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, CodecError>;

    /// Decode a file into a grayscale buffer.
    fn decode_file(&self, path: &Path) -> Result<PixelBuffer, CodecError>;

    /// Decode an in-memory container into a grayscale buffer.
    fn decode_bytes(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError>;

    /// Serialize a buffer in the given container format.
    fn encode_bytes(&self, buffer: &PixelBuffer, format: OutputFormat)
    -> Result<Vec<u8>, CodecError>;

    /// Write a buffer to `path`, choosing the format from its extension.
    fn encode_file(&self, buffer: &PixelBuffer, path: &Path) -> Result<(), CodecError> {
        let format = OutputFormat::from_path(path)?;
        let bytes = self.encode_bytes(buffer, format)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
