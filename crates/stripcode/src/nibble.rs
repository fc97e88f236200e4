//! Split-byte transcoding between text and 4-bit nibbles.
//!
//! Every character is one byte (code points up to U+00FF) and becomes two nibbles,
//! high nibble first.

use crate::error::{Result, StripError};

/// Largest code point that fits one byte.
const MAX_CODE_POINT: u32 = 0xFF;

/// Transcode text into nibbles, high nibble of each character first.
pub fn nibbles_from_text(text: &str) -> Result<Vec<u8>> {
    let mut nibbles = Vec::with_capacity(text.len() * 2);
    for (position, ch) in text.chars().enumerate() {
        let code = ch as u32;
        if code > MAX_CODE_POINT {
            return Err(StripError::UnsupportedCharacter { ch, position });
        }
        let byte = code as u8;
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    Ok(nibbles)
}

/// Recombine nibble pairs into text. A trailing unpaired nibble is dropped.
pub fn text_from_nibbles(nibbles: &[u8]) -> String {
    nibbles
        .chunks_exact(2)
        .map(|pair| char::from(((pair[0] & 0x0F) << 4) | (pair[1] & 0x0F)))
        .collect()
}

/// Number of payload nibbles a text transcodes to, without validating it.
pub fn nibble_count(text: &str) -> usize {
    text.chars().count() * 2
}
