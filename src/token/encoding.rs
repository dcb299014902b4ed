//! Binary-to-text encodings for token payloads

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Turns token bytes into URL-safe text and back
pub trait TokenEncoder: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> String;

    /// `None` when the text is not valid for this encoding
    fn decode(&self, text: &str) -> Option<Vec<u8>>;
}

/// URL-safe base64 without padding. Padded input is accepted on decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64UrlEncoder;

impl TokenEncoder for Base64UrlEncoder {
    fn encode(&self, bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn decode(&self, text: &str) -> Option<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(text.trim().trim_end_matches('='))
            .ok()
    }
}
