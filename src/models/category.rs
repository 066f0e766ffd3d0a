use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions that identify an image when the declared MIME type does not.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif", "ico", "avif"];

/// File categories with a registered validator/inspector pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Pdf,
}

impl FileCategory {
    pub const ALL: [FileCategory; 2] = [FileCategory::Image, FileCategory::Pdf];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Pdf => "pdf",
        }
    }

    /// Resolve the declared category of an upload.
    ///
    /// The MIME type wins when it is recognizable; otherwise the extension decides.
    pub fn resolve(content_type: &str, file_name: &str) -> Option<Self> {
        let mime = normalize_mime_type(content_type);
        if mime.starts_with("image/") {
            return Some(FileCategory::Image);
        }
        if mime == "application/pdf" {
            return Some(FileCategory::Pdf);
        }

        let extension = normalize_extension(file_name);
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(FileCategory::Image)
        } else if extension == "pdf" {
            Some(FileCategory::Pdf)
        } else {
            None
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased MIME type without parameters ("Image/PNG; q=1" -> "image/png").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Lowercased extension after the last dot of the file name, or empty.
pub fn normalize_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.trim().to_lowercase(),
        None => String::new(),
    }
}
