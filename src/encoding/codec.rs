//! Encoding label resolution and strict decoding.
//!
//! Most labels resolve through `encoding_rs`. A few encodings need
//! different semantics than the WHATWG mapping provides: `ISO-8859-1` is
//! true Latin-1 rather than windows-1252, `ASCII` rejects 8-bit bytes,
//! `UTF-16` sniffs a BOM, and the DOS code pages live in [`super::oem`].

use std::borrow::Cow;

use encoding_rs::Encoding;

use super::oem;

/// Byte order for UTF-16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// A resolved character encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// Strict 7-bit US-ASCII.
    Ascii,
    /// UTF-16. `None` means the byte order comes from a BOM, little-endian otherwise.
    Utf16(Option<Endian>),
    /// A DOS code page decoded through a lookup table.
    Oem(&'static [char; 128]),
    /// Any other encoding known to `encoding_rs`.
    Whatwg(&'static Encoding),
}

impl Codec {
    /// Resolve an encoding label (case-insensitive, `_` and `-` interchangeable).
    ///
    /// Returns `None` for labels that name no known encoding.
    pub fn for_label(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        let codec = match normalized.as_str() {
            "" => return None,
            "utf-8" | "utf8" | "u8" => Self::Utf8,
            "latin-1" | "latin1" | "l1" | "iso-8859-1" | "iso8859-1" | "iso88591"
            | "iso-ir-100" | "cp819" | "8859" => Self::Latin1,
            "ascii" | "us-ascii" | "ansi-x3.4-1968" | "646" => Self::Ascii,
            "utf-16" | "utf16" => Self::Utf16(None),
            "utf-16le" | "utf16le" => Self::Utf16(Some(Endian::Little)),
            "utf-16be" | "utf16be" => Self::Utf16(Some(Endian::Big)),
            "cp437" | "ibm437" | "437" => Self::Oem(&oem::CP437),
            "cp720" | "ibm720" | "720" => Self::Oem(&oem::CP720),
            other => Self::Whatwg(Encoding::for_label(other.as_bytes())?),
        };
        Some(codec)
    }

    /// Decode `bytes` strictly. Returns `None` if the input is malformed
    /// for this encoding.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match *self {
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Self::Latin1 => Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
            Self::Ascii => {
                if bytes.is_ascii() {
                    std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
                } else {
                    None
                }
            }
            Self::Utf16(order) => {
                let (encoding, rest) = utf16_layout(order, bytes);
                encoding.decode_without_bom_handling_and_without_replacement(rest)
            }
            Self::Oem(table) => Some(Cow::Owned(oem::decode(table, bytes))),
            Self::Whatwg(encoding) => {
                encoding.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }

    /// Decode `bytes`, substituting U+FFFD for malformed sequences.
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match *self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
            Self::Utf16(order) => {
                let (encoding, rest) = utf16_layout(order, bytes);
                encoding.decode_without_bom_handling(rest).0.into_owned()
            }
            Self::Whatwg(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
            Self::Latin1 | Self::Oem(_) => self.decode(bytes).unwrap_or_default().into_owned(),
        }
    }

    /// Encode `text`. Returns `None` if a character cannot be represented.
    ///
    /// Unspecified-order UTF-16 is written little-endian with a BOM.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match *self {
            Self::Utf8 => Some(text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            Self::Ascii => text.is_ascii().then(|| text.as_bytes().to_vec()),
            Self::Utf16(order) => {
                let mut out = Vec::with_capacity(text.len() * 2 + 2);
                let big = order == Some(Endian::Big);
                if order.is_none() {
                    out.extend_from_slice(&[0xFF, 0xFE]);
                }
                for unit in text.encode_utf16() {
                    if big {
                        out.extend_from_slice(&unit.to_be_bytes());
                    } else {
                        out.extend_from_slice(&unit.to_le_bytes());
                    }
                }
                Some(out)
            }
            Self::Oem(table) => oem::encode(table, text),
            Self::Whatwg(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                (!had_errors).then(|| bytes.into_owned())
            }
        }
    }
}

/// Pick the UTF-16 variant and strip a BOM when the order is not fixed.
fn utf16_layout(order: Option<Endian>, bytes: &[u8]) -> (&'static Encoding, &[u8]) {
    match order {
        Some(Endian::Little) => (encoding_rs::UTF_16LE, bytes),
        Some(Endian::Big) => (encoding_rs::UTF_16BE, bytes),
        None => match bytes {
            [0xFE, 0xFF, rest @ ..] => (encoding_rs::UTF_16BE, rest),
            [0xFF, 0xFE, rest @ ..] => (encoding_rs::UTF_16LE, rest),
            _ => (encoding_rs::UTF_16LE, bytes),
        },
    }
}

/// Lowercase, trim, and treat `_` as `-`.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_ascii_lowercase().replace('_', "-")
}

/// Whether two labels name the same entry once case and separators are ignored.
///
/// `UTF-8` and `utf8` match; `LATIN-1` and `ISO-8859-1` do not.
pub fn labels_match(a: &str, b: &str) -> bool {
    let strip = |s: &str| normalize_label(s).replace('-', "");
    strip(a) == strip(b)
}
