//! Base64 and RFC 2047 Q-encoding byte decoders.

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::Engine;
use mail_parser::decoders::quoted_printable::quoted_printable_decode_char;

/// Base64 engine that tolerates missing padding and stray trailing bits,
/// both common in real-world mail.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64 text, ignoring whitespace and any characters outside the alphabet.
///
/// Returns an empty buffer if the remaining input still cannot be decoded.
pub fn decode_base64(input: &str) -> Vec<u8> {
    let cleaned: Vec<u8> = input
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/'))
        .collect();
    // A single dangling sextet carries no whole byte.
    let usable = if cleaned.len() % 4 == 1 {
        &cleaned[..cleaned.len() - 1]
    } else {
        &cleaned[..]
    };
    LENIENT_BASE64.decode(usable).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Undecodable base64 payload");
        Vec::new()
    })
}

/// Decode RFC 2047 Q-encoding: underscores become spaces, `=XX` becomes a byte.
///
/// Malformed escapes are kept literally.
pub fn decode_q_encoding(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = match &bytes[i..] {
            [b'=', hi, lo, ..] => quoted_printable_decode_char(*hi, *lo),
            _ => None,
        };
        match escaped {
            Some(byte) => {
                result.push(byte);
                i += 3;
            }
            None => {
                result.push(if bytes[i] == b'_' { b' ' } else { bytes[i] });
                i += 1;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_with_line_breaks() {
        assert_eq!(decode_base64("aHR0cDovL2V4\r\nYW1wbGUuY29t\r\n"), b"http://example.com");
    }

    #[test]
    fn test_base64_missing_padding() {
        assert_eq!(decode_base64("SG9sYQ"), b"Hola");
    }

    #[test]
    fn test_q_encoding() {
        assert_eq!(decode_q_encoding("caf=E9_au_lait"), b"caf\xE9 au lait");
        assert_eq!(decode_q_encoding("caf=e9"), b"caf\xE9");
    }

    #[test]
    fn test_q_encoding_malformed_escape() {
        assert_eq!(decode_q_encoding("50=ZZ_off="), b"50=ZZ off=");
    }
}
