//! MIME structure parsing over already-decoded text.
//!
//! `mail-parser` finds the header fields and part boundaries. Each node keeps
//! the matching slice of the input untouched, so transfer and charset
//! decoding happen later, per node.

use std::borrow::Cow;

use mail_parser::{Message, MessageParser, MessagePart, PartType};
use tracing::{debug, warn};

use crate::model::message::{Header, StructuredMessage};
use crate::parser::header::{self, ContentType};

/// Maximum nesting depth for multipart descent (adversarial input guard).
/// Deeper entities are kept as unparsed text leaves.
pub const MAX_DEPTH: usize = 10;

/// Parse decoded text as an email-style message.
///
/// Never fails: text without headers becomes a single `text/plain` leaf,
/// and malformed multipart bodies degrade to text leaves.
pub fn parse_message(text: &str) -> StructuredMessage {
    let text = skip_envelope(text);
    match MessageParser::default().parse(text.as_bytes()) {
        Some(parsed) => build_message(&parsed, "text/plain", 0),
        None => {
            debug!("No header fields found, keeping input as a single text part");
            StructuredMessage::text(Vec::new(), text)
        }
    }
}

/// Skip a UTF-8 BOM and a leading mbox `From ` separator line.
fn skip_envelope(text: &str) -> &str {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    if text.starts_with("From ") {
        return match text.find('\n') {
            Some(pos) => &text[pos + 1..],
            None => "",
        };
    }
    text
}

/// Build the tree rooted at the first part of `message`.
fn build_message(
    message: &Message<'_>,
    default_type: &'static str,
    depth: usize,
) -> StructuredMessage {
    match message.parts.first() {
        Some(root) => build_part(message, root, default_type, depth),
        None => StructuredMessage::text(Vec::new(), "").with_default_type(default_type),
    }
}

/// Offsets of `part` index into `message.raw_message`, which for a nested
/// message is either the outer input or its transfer-decoded body.
fn build_part(
    message: &Message<'_>,
    part: &MessagePart<'_>,
    default_type: &'static str,
    depth: usize,
) -> StructuredMessage {
    let raw = message.raw_message.as_ref();
    let headers = header_fields(raw, part);
    let body = || slice(raw, part.offset_body, part.offset_end).into_owned();

    let nested = matches!(part.body, PartType::Multipart(_) | PartType::Message(_));
    if nested && depth >= MAX_DEPTH {
        warn!(depth, "Maximum MIME depth reached, keeping part as text");
        return StructuredMessage::text(headers, body()).with_default_type(default_type);
    }

    match &part.body {
        PartType::Multipart(ids) => {
            let is_digest = headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("Content-Type"))
                .and_then(|h| ContentType::parse(&h.value))
                .is_some_and(|ct| ct.is_multipart() && ct.sub == "digest");
            let child_default = if is_digest {
                "message/rfc822"
            } else {
                "text/plain"
            };
            let parts = ids
                .iter()
                .filter_map(|&id| message.parts.get(id))
                .map(|child| build_part(message, child, child_default, depth + 1))
                .collect();
            StructuredMessage::multipart(headers, parts).with_default_type(default_type)
        }
        PartType::Message(inner) => {
            let child = build_message(inner, "text/plain", depth + 1);
            StructuredMessage::multipart(headers, vec![child]).with_default_type(default_type)
        }
        PartType::Text(_) | PartType::Html(_) | PartType::Binary(_) | PartType::InlineBinary(_) => {
            StructuredMessage::text(headers, body()).with_default_type(default_type)
        }
    }
}

/// Header fields of `part` as written in the input, unfolded.
///
/// Lines `mail-parser` took for fields but whose name is not a valid field
/// name (such as `see also http:`) are dropped.
fn header_fields(raw: &[u8], part: &MessagePart<'_>) -> Vec<Header> {
    part.headers
        .iter()
        .filter_map(|field| {
            let name = slice(raw, field.offset_field, field.offset_start);
            let name = name.trim_end().strip_suffix(':')?.trim_end();
            if !header::is_field_name(name) {
                debug!(name, "Dropping line that is not a header field");
                return None;
            }
            Some(Header {
                name: name.to_string(),
                value: header::unfold(&slice(raw, field.offset_start, field.offset_end)),
            })
        })
        .collect()
}

/// `raw[start..end]` as text, clamped to the input.
fn slice(raw: &[u8], start: usize, end: usize) -> Cow<'_, str> {
    let end = end.min(raw.len());
    match raw.get(start..end) {
        Some(bytes) => String::from_utf8_lossy(bytes),
        None => Cow::Borrowed(""),
    }
}
