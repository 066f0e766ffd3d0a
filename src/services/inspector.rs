//! Byte-signature inspection of uploaded content.
//!
//! Inspectors never trust the declared MIME type or extension alone: they peek
//! at the leading bytes and compare the detected format with what was declared.

use image::ImageFormat;
use std::io::{self, Read, Seek, SeekFrom};
use tracing::{debug, warn};

use crate::models::{normalize_mime_type, FileCategory};

/// Number of leading bytes any inspector looks at.
pub const SIGNATURE_PEEK_LEN: usize = 32;

const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Seekable byte stream handed to inspectors.
pub trait ContentSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> ContentSource for T {}

pub trait FileContentInspector: Send + Sync {
    fn category(&self) -> FileCategory;

    /// True when the leading bytes of `content` match `declared_mime`.
    ///
    /// The stream position is restored before returning.
    fn is_valid_content(&self, content: &mut dyn ContentSource, declared_mime: &str) -> bool;
}

/// Read up to `len` bytes from the current position, then seek back to it.
pub fn peek_prefix(content: &mut dyn ContentSource, len: usize) -> io::Result<Vec<u8>> {
    let start = content.stream_position()?;
    let mut prefix = Vec::with_capacity(len);
    let read = (&mut *content).take(len as u64).read_to_end(&mut prefix);
    content.seek(SeekFrom::Start(start))?;
    read?;
    Ok(prefix)
}

fn read_signature(content: &mut dyn ContentSource) -> Option<Vec<u8>> {
    match peek_prefix(content, SIGNATURE_PEEK_LEN) {
        Ok(prefix) => Some(prefix),
        Err(e) => {
            warn!(error = %e, "Failed to read content signature");
            None
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageContentInspector;

impl ImageContentInspector {
    pub fn new() -> Self {
        Self
    }

    /// MIME type of the image format identified by `prefix`, if any.
    pub fn detect_mime(prefix: &[u8]) -> Option<&'static str> {
        let format = image::guess_format(prefix).ok()?;
        match format {
            ImageFormat::Png => Some("image/png"),
            ImageFormat::Jpeg => Some("image/jpeg"),
            ImageFormat::Gif => Some("image/gif"),
            ImageFormat::WebP => Some("image/webp"),
            ImageFormat::Bmp => Some("image/bmp"),
            ImageFormat::Tiff => Some("image/tiff"),
            ImageFormat::Ico => Some("image/x-icon"),
            ImageFormat::Avif => Some("image/avif"),
            _ => None,
        }
    }

    fn canonical_mime(declared: &str) -> String {
        let mime = normalize_mime_type(declared);
        match mime.as_str() {
            "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
            "image/vnd.microsoft.icon" => "image/x-icon".to_string(),
            _ => mime,
        }
    }
}

impl FileContentInspector for ImageContentInspector {
    fn category(&self) -> FileCategory {
        FileCategory::Image
    }

    fn is_valid_content(&self, content: &mut dyn ContentSource, declared_mime: &str) -> bool {
        let Some(prefix) = read_signature(content) else {
            return false;
        };

        let declared = Self::canonical_mime(declared_mime);
        match Self::detect_mime(&prefix) {
            Some(detected) if detected == declared => true,
            Some(detected) => {
                debug!(declared = %declared, detected = detected, "Image signature does not match declared type");
                false
            }
            None => {
                debug!(declared = %declared, "No known image signature");
                false
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfContentInspector;

impl PdfContentInspector {
    pub fn new() -> Self {
        Self
    }
}

impl FileContentInspector for PdfContentInspector {
    fn category(&self) -> FileCategory {
        FileCategory::Pdf
    }

    fn is_valid_content(&self, content: &mut dyn ContentSource, declared_mime: &str) -> bool {
        if normalize_mime_type(declared_mime) != "application/pdf" {
            return false;
        }

        match read_signature(content) {
            Some(prefix) => prefix.starts_with(PDF_SIGNATURE),
            None => false,
        }
    }
}
