//! Placeholder "video" payloads.
//!
//! A payload is a `data:` URL whose body is base64-encoded JSON:
//!
//! ```text
//! data:video/mp4;base64,<b64({"type":"gradient","colors":[c0,c1],"text":"..."})>
//! ```
//!
//! Displays render it as a two-stop linear gradient with the text on top.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::SoraError;
use crate::models::VideoRecord;

/// Media type stamped on every generated payload.
pub const MEDIA_TYPE: &str = "video/mp4";

/// Descriptor kind for gradient placeholders.
pub const GRADIENT_KIND: &str = "gradient";

/// Color pairs a generation picks from, uniformly.
pub const PALETTE: [[&str; 2]; 5] = [
    ["#667eea", "#764ba2"],
    ["#f093fb", "#f5576c"],
    ["#4facfe", "#00f2fe"],
    ["#43e97b", "#38f9d7"],
    ["#fa709a", "#fee140"],
];

/// Colors used when a payload can't be decoded.
pub const FALLBACK_COLORS: [&str; 2] = PALETTE[0];

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Decoded form of a gradient payload. Fields serialize in declaration
/// order: `type`, `colors`, `text`. A body without `type` is a gradient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientDescriptor {
    #[serde(rename = "type", default = "gradient_kind")]
    pub kind: String,
    pub colors: [String; 2],
    pub text: String,
}

fn gradient_kind() -> String {
    GRADIENT_KIND.to_string()
}

impl GradientDescriptor {
    pub fn new(colors: [&str; 2], prompt: &str, max_chars: usize) -> Self {
        Self {
            kind: GRADIENT_KIND.to_string(),
            colors: [colors[0].to_string(), colors[1].to_string()],
            text: excerpt(prompt, max_chars),
        }
    }

    /// Wrap the descriptor in a `data:video/mp4;base64,` URL.
    pub fn to_data_url(&self) -> String {
        let body = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize gradient descriptor: {}", e);
            String::new()
        });
        format!("data:{};base64,{}", MEDIA_TYPE, STANDARD.encode(body))
    }

    pub fn decode(url: &str) -> Result<Self, SoraError> {
        let data = DataUrl::parse(url)?;
        Ok(serde_json::from_slice(&data.bytes)?)
    }

    /// Descriptor for display. Undecodable payloads fall back to the first
    /// palette pair and the record's full prompt.
    pub fn for_record(record: &VideoRecord) -> Self {
        match Self::decode(&record.payload) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::debug!("Payload of video {} not decodable ({}), using fallback", record.id, e);
                Self {
                    kind: gradient_kind(),
                    colors: [FALLBACK_COLORS[0].to_string(), FALLBACK_COLORS[1].to_string()],
                    text: record.prompt.clone(),
                }
            }
        }
    }

    /// CSS background for a card showing this payload.
    pub fn css_background(&self) -> String {
        format!(
            "linear-gradient(135deg, {} 0%, {} 100%)",
            self.colors[0], self.colors[1]
        )
    }
}

/// A parsed base64 `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<Self, SoraError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| SoraError::Payload("missing data: scheme".to_string()))?;
        let (header, body) = rest
            .split_once(',')
            .ok_or_else(|| SoraError::Payload("missing ',' separator".to_string()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| SoraError::Payload("only base64 data URLs are supported".to_string()))?;
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| SoraError::Payload(format!("bad base64 body: {}", e)))?;

        Ok(Self {
            media_type: media_type.to_string(),
            bytes,
        })
    }

    /// File extension for the media type, e.g. `mp4` for `video/mp4`.
    pub fn extension(&self) -> &str {
        match self.media_type.as_str() {
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            "application/json" => "json",
            other => other
                .split_once('/')
                .map(|(_, sub)| sub)
                .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or("bin"),
        }
    }
}
