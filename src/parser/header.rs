//! RFC 5322 header helpers: folding, MIME parameters, encoded-words
//! (RFC 2047), and date parsing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::encoding::Codec;
use crate::parser::transfer;

/// Unfold a raw header value: continuation lines are joined with a single
/// space and surrounding whitespace is dropped.
pub fn unfold(raw: &str) -> String {
    raw.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `name` is a valid field name: printable ASCII without spaces or colons.
pub fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (0x21..=0x7E).contains(&b) && b != b':')
}

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type, lowercase (`text`, `multipart`, …).
    pub main: String,
    /// Subtype, lowercase (`plain`, `mixed`, …).
    pub sub: String,
    /// Parameters with lowercase names and unquoted values.
    pub params: Vec<(String, String)>,
}

impl ContentType {
    /// Parse a header value like `text/plain; charset="utf-8"`.
    ///
    /// Returns `None` if the value has no `type/subtype`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut segments = split_params(value).into_iter();
        let mime = segments.next()?;
        let (main, sub) = mime.trim().split_once('/')?;
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() || main.contains(char::is_whitespace) {
            return None;
        }

        let params = segments
            .filter_map(|seg| {
                let (name, value) = seg.split_once('=')?;
                let name = name.trim().to_ascii_lowercase();
                (!name.is_empty()).then(|| (name, unquote(value.trim())))
            })
            .collect();

        Some(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            params,
        })
    }

    /// A bare `main/sub` type without parameters.
    pub fn simple(mime: &str) -> Self {
        let (main, sub) = mime.split_once('/').unwrap_or((mime, ""));
        Self {
            main: main.to_string(),
            sub: sub.to_string(),
            params: Vec::new(),
        }
    }

    /// First parameter with this name (case-insensitive).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn is_multipart(&self) -> bool {
        self.main == "multipart"
    }

    pub fn is_text(&self) -> bool {
        self.main == "text"
    }

    pub fn is_rfc822(&self) -> bool {
        self.main == "message" && self.sub == "rfc822"
    }
}

/// Split on `;` outside double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                result.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    result.push(&value[start..]);
    result
}

/// Strip surrounding double quotes and resolve backslash escapes.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// If decoding fails for any token, the original text is preserved.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two adjacent encoded words is dropped (RFC 2047 §6.2)
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];
        match try_decode_one_word(after_start) {
            Some((text, consumed)) => {
                result.push_str(&text);
                remaining = &after_start[consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    result
}

/// Decode `charset?encoding?text?=`, returning the text and bytes consumed.
fn try_decode_one_word(s: &str) -> Option<(String, usize)> {
    let (charset, rest) = s.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded_text = &rest[..end];
    if charset.contains(char::is_whitespace) || encoded_text.contains(' ') {
        return None;
    }
    let consumed = charset.len() + 1 + encoding.len() + 1 + end + 2;

    let bytes = match encoding {
        "B" | "b" => transfer::decode_base64(encoded_text),
        "Q" | "q" => transfer::decode_q_encoding(encoded_text),
        _ => return None,
    };

    // RFC 2231 language suffix: "utf-8*en"
    let charset = charset.split('*').next().unwrap_or(charset);
    let text = match Codec::for_label(charset) {
        Some(codec) => codec.decode_lossy(&bytes),
        None => {
            warn!(charset, "Unknown charset in encoded-word, falling back to UTF-8");
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };
    Some((text, consumed))
}

/// Parse an email date string in the common formats.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // Drop a leading day-of-week: "Thu, " or "Thu "
    let no_dow = match trimmed.split_once(|c: char| c == ',' || c == ' ') {
        Some((dow, rest)) if dow.len() == 3 && dow.chars().all(char::is_alphabetic) => {
            rest.trim_start()
        }
        _ => trimmed,
    };

    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(no_dow, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(no_dow, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    mail_parser_date(trimmed)
}

/// Attempt to parse a date using `mail-parser`'s lenient parser.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    use mail_parser::MessageParser;

    // Wrap input in a minimal RFC 5322 message so mail-parser can parse it
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let dt = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&dt)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
