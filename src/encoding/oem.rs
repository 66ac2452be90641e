//! DOS/OEM code pages that `encoding_rs` does not cover.
//!
//! The lower half of every table is ASCII; only bytes `0x80..=0xFF` are
//! looked up. Both pages assign a character to every byte, so decoding
//! never fails.

/// IBM PC code page 437, bytes `0x80..=0xFF`.
pub static CP437: [char; 128] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    // 0xF0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

/// Arabic DOS code page 720, bytes `0x80..=0xFF`.
///
/// Unassigned positions map to the C1 control with the same value.
pub static CP720: [char; 128] = [
    // 0x80
    '\u{80}', '\u{81}', 'é', 'â', '\u{84}', 'à', '\u{86}', 'ç', 'ê', 'ë', 'è', 'ï', 'î',
    '\u{8D}', '\u{8E}', '\u{8F}',
    // 0x90
    '\u{90}', '\u{651}', '\u{652}', 'ô', '¤', '\u{640}', 'û', 'ù', '\u{621}', '\u{622}',
    '\u{623}', '\u{624}', '£', '\u{625}', '\u{626}', '\u{627}',
    // 0xA0
    '\u{628}', '\u{629}', '\u{62A}', '\u{62B}', '\u{62C}', '\u{62D}', '\u{62E}', '\u{62F}',
    '\u{630}', '\u{631}', '\u{632}', '\u{633}', '\u{634}', '\u{635}', '«', '»',
    // 0xB0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0
    '\u{636}', '\u{637}', '\u{638}', '\u{639}', '\u{63A}', '\u{641}', 'µ', '\u{642}',
    '\u{643}', '\u{644}', '\u{645}', '\u{646}', '\u{647}', '\u{648}', '\u{649}', '\u{64A}',
    // 0xF0
    '≡', '\u{64B}', '\u{64C}', '\u{64D}', '\u{64E}', '\u{64F}', '\u{650}', '≈', '°', '∙',
    '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

/// Decode `bytes` through a 128-entry upper-half table.
pub fn decode(table: &[char; 128], bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                table[(b - 0x80) as usize]
            }
        })
        .collect()
}

/// Encode `text` through a table, returning `None` on the first unmappable character.
pub fn encode(table: &[char; 128], text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| {
            if c.is_ascii() {
                Some(c as u8)
            } else {
                table
                    .iter()
                    .position(|&t| t == c)
                    .map(|idx| 0x80 + idx as u8)
            }
        })
        .collect()
}
