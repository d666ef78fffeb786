// Image payload encoding
//
// Reads the craft photo, determines its MIME type and turns it into the
// base64 inline payload the Gemini API accepts. The cancellation token is
// checked around every suspension point so an aborted request stops here
// instead of continuing to encode.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::{AIError, AIResult};
use crate::models::content::ImageSource;

/// Maximum accepted upload size (10MB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Base64 image ready to be sent inline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 (standard alphabet, padded)
    pub data: String,
}

/// Identify common image formats by their leading bytes
fn sniff_magic(data: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
    ];

    for (signature, mime) in SIGNATURES {
        if data.starts_with(signature) {
            return Some(mime);
        }
    }

    // RIFF....WEBP
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    // ISO-BMFF: ....ftypheic / ftypheix / ftypmif1 / ftypavif
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        match &data[8..12] {
            b"heic" | b"heix" | b"mif1" => return Some("image/heic"),
            b"avif" => return Some("image/avif"),
            _ => {}
        }
    }

    None
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" | "heif" => Some("image/heic"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

/// Resolve the MIME type: declared type first, then magic bytes, then file extension
pub fn detect_mime_type(declared: Option<&str>, data: &[u8], path: Option<&Path>) -> Option<String> {
    declared
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| m.to_ascii_lowercase())
        .or_else(|| sniff_magic(data).map(String::from))
        .or_else(|| path.and_then(mime_from_extension).map(String::from))
}

fn ensure_not_cancelled(cancel: Option<&CancellationToken>) -> AIResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(AIError::Cancelled),
        _ => Ok(()),
    }
}

/// Read and encode an image source into an inline payload
pub async fn encode_image(
    source: &ImageSource,
    cancel: Option<&CancellationToken>,
) -> AIResult<InlineImage> {
    ensure_not_cancelled(cancel)?;

    let (data, declared, path) = match source {
        ImageSource::Path(path) => {
            let read = tokio::fs::read(path);
            let data = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(AIError::Cancelled),
                    data = read => data,
                },
                None => read.await,
            }
            .map_err(|e| AIError::IoError(format!("Failed to read image {}: {}", path.display(), e)))?;
            (std::borrow::Cow::Owned(data), None, Some(path.as_path()))
        }
        ImageSource::Bytes { data, mime_type, .. } => {
            (std::borrow::Cow::Borrowed(data.as_slice()), mime_type.as_deref(), None)
        }
    };

    ensure_not_cancelled(cancel)?;

    if data.is_empty() {
        return Err(AIError::Validation("The craft image is empty.".to_string()));
    }
    if data.len() > MAX_IMAGE_BYTES {
        return Err(AIError::Validation(format!(
            "The craft image is too large ({} bytes). Maximum size: 10MB.",
            data.len()
        )));
    }

    let mime_type = detect_mime_type(declared, &data, path).ok_or_else(|| {
        AIError::Validation("Could not determine the image type. Please upload an image file.".to_string())
    })?;
    if !mime_type.starts_with("image/") {
        return Err(AIError::Validation(format!(
            "Please upload an image file (got {}).",
            mime_type
        )));
    }

    let encoded = STANDARD.encode(&data);
    ensure_not_cancelled(cancel)?;

    log::debug!("Encoded {} image ({} bytes)", mime_type, data.len());

    Ok(InlineImage {
        mime_type,
        data: encoded,
    })
}
