//! Upload validation and naming for user-supplied image files.
//!
//! The browser file picker filters by MIME type, but that filter is
//! trivially bypassed, so every file is re-checked here before it is
//! relayed: the declared type must be on the accept list and the leading
//! bytes must agree with it.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of files accepted in one upload action.
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// Default per-file size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default storage category (bucket prefix) for public images.
pub const DEFAULT_UPLOAD_CATEGORY: &str = "myPublicImages";

/// Default number of uploads allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 2;

/// How many leading bytes of an SVG are inspected for the root element.
const SVG_SNIFF_LEN: usize = 512;

// ---------------------------------------------------------------------------
// ImageMime
// ---------------------------------------------------------------------------

/// Image types accepted by the upload relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageMime {
    #[serde(rename = "image/svg+xml")]
    Svg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/gif")]
    Gif,
}

impl ImageMime {
    pub const ALL: [ImageMime; 4] = [Self::Svg, Self::Png, Self::Jpeg, Self::Gif];

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        // Drop parameters such as `; charset=utf-8`.
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/svg+xml" => Some(Self::Svg),
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }

    /// Detect the type from the file's leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
        const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

        if bytes.starts_with(PNG_MAGIC) {
            return Some(Self::Png);
        }
        if bytes.starts_with(JPEG_MAGIC) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        let head = &bytes[..bytes.len().min(SVG_SNIFF_LEN)];
        let head = String::from_utf8_lossy(head);
        let trimmed = head.trim_start_matches('\u{feff}').trim_start();
        if (trimmed.starts_with("<?xml") || trimmed.starts_with("<svg")) && head.contains("<svg") {
            return Some(Self::Svg);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate one file before it is relayed to storage.
///
/// Returns the confirmed [`ImageMime`]. Rules:
/// - the file must not be empty nor exceed `max_bytes`;
/// - the declared content type must be one of the accepted image types;
/// - the leading bytes must match the declared type.
pub fn validate_image_upload(
    file_name: &str,
    declared_content_type: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<ImageMime, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Validation(format!("File '{file_name}' is empty")));
    }
    if bytes.len() > max_bytes {
        return Err(CoreError::Validation(format!(
            "File '{file_name}' is {} bytes, maximum is {max_bytes}",
            bytes.len()
        )));
    }

    let declared = ImageMime::from_content_type(declared_content_type).ok_or_else(|| {
        CoreError::UnsupportedMediaType(format!(
            "File '{file_name}' has type '{declared_content_type}'. Accepted: svg, png, jpeg, gif"
        ))
    })?;

    match ImageMime::sniff(bytes) {
        Some(actual) if actual == declared => Ok(declared),
        Some(actual) => Err(CoreError::UnsupportedMediaType(format!(
            "File '{file_name}' declared as {} but contains {}",
            declared.content_type(),
            actual.content_type()
        ))),
        None => Err(CoreError::UnsupportedMediaType(format!(
            "File '{file_name}' content is not a recognised image"
        ))),
    }
}

/// Validate how many files arrived in one upload action.
pub fn validate_file_count(count: usize) -> Result<(), CoreError> {
    if count == 0 {
        return Err(CoreError::Validation("No files received".into()));
    }
    if count > MAX_FILES_PER_UPLOAD {
        return Err(CoreError::Validation(format!(
            "Received {count} files, maximum is {MAX_FILES_PER_UPLOAD}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Build the storage object key: `{category}/{uuid}-{sanitized stem}.{ext}`.
pub fn object_key(category: &str, file_name: &str, mime: ImageMime) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    let stem = if stem.is_empty() { "image".to_string() } else { stem };

    format!(
        "{}/{}-{stem}.{}",
        category.trim_matches('/'),
        uuid::Uuid::new_v4(),
        mime.extension()
    )
}

// ---------------------------------------------------------------------------
// UploadedFile
// ---------------------------------------------------------------------------

/// A user file that has been relayed to storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: ImageMime,
    pub size_bytes: usize,
    /// Publicly reachable URL returned by the storage service.
    pub url: String,
    pub uploaded_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
