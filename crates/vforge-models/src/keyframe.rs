//! Keyframes: inlined seed images handed into generation calls.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// A seed image anchoring the visual content of a generation call.
///
/// Always carries the raw bytes inline. Remote URLs are deliberately not
/// representable here: an upstream link could expire between extraction and
/// the next submit, so the pipeline normalizes every image into this form
/// before handing it downstream.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Raw encoded image bytes (JPEG or PNG).
    pub bytes: Vec<u8>,

    /// Content type of `bytes`.
    pub content_type: String,
}

impl Keyframe {
    /// Wrap raw image bytes, sniffing the content type from magic numbers.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let content_type = sniff_content_type(&bytes).to_string();
        Self { bytes, content_type }
    }

    /// Wrap raw image bytes with an explicit content type.
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Render as a `data:` URL for APIs that take inline images.
    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.content_type, encoded)
    }

    /// Size of the inlined image in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the image is empty (never valid as a seed).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Keyframes can be megabytes; keep Debug output bounded.
impl std::fmt::Debug for Keyframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyframe")
            .field("content_type", &self.content_type)
            .field("bytes", &format!("{} bytes", self.bytes.len()))
            .finish()
    }
}

fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()) {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}
