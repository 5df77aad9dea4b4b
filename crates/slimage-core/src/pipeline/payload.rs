//! Text-safe codec for images embedded inline in a record field.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::TranscodeError;

/// Decode a base64 field into raw image bytes.
///
/// ASCII whitespace (line wrapping from other tools) is ignored. Bytes
/// outside the base64 alphabet, including non-UTF-8 ones, are an error.
pub fn decode_inline(payload: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    let result = if payload.iter().any(u8::is_ascii_whitespace) {
        let compact: Vec<u8> = payload
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        BASE64.decode(compact)
    } else {
        BASE64.decode(payload)
    };
    result.map_err(|e| TranscodeError::Payload {
        message: e.to_string(),
    })
}

/// Encode raw image bytes for storage in a record field.
pub fn encode_inline(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}
