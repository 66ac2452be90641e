//! The parsed message tree handed to URL extraction.

use std::borrow::Cow;

use mail_parser::decoders::quoted_printable::quoted_printable_decode;
use thiserror::Error;

use crate::encoding::Codec;
use crate::parser::header::{decode_encoded_words, ContentType};
use crate::parser::transfer;

/// A single header field. The name keeps its original case; the value is
/// unfolded but not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// The body of a message node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Undecoded body text (transfer encoding still applied).
    Text(String),
    /// Child parts of a `multipart/*` or `message/rfc822` node.
    Parts(Vec<StructuredMessage>),
}

/// A charset could not be attached to a node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CharsetError {
    /// Leaf parts that are not text carry no charset.
    #[error("'{content_type}' part cannot carry a charset")]
    NotText { content_type: String },
}

/// A parsed email or plain-text document.
///
/// Every node has headers (possibly none), a [`Payload`], and a charset
/// that stays `None` until [`crate::input::charset::propagate`] runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMessage {
    headers: Vec<Header>,
    payload: Payload,
    charset: Option<String>,
    /// Codec of the nearest ancestor, used when `charset` is not a
    /// registered label.
    inherited: Option<Codec>,
    /// Type assumed when there is no `Content-Type` header
    /// (`message/rfc822` inside `multipart/digest`).
    default_type: &'static str,
}

impl StructuredMessage {
    /// A leaf node holding body text.
    pub fn text(headers: Vec<Header>, body: impl Into<String>) -> Self {
        Self {
            headers,
            payload: Payload::Text(body.into()),
            charset: None,
            inherited: None,
            default_type: "text/plain",
        }
    }

    /// A container node holding child parts.
    pub fn multipart(headers: Vec<Header>, parts: Vec<StructuredMessage>) -> Self {
        Self {
            headers,
            payload: Payload::Parts(parts),
            charset: None,
            inherited: None,
            default_type: "text/plain",
        }
    }

    pub(crate) fn with_default_type(mut self, default_type: &'static str) -> Self {
        self.default_type = default_type;
        self
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// First value of a header (case-insensitive name match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Header value with RFC 2047 encoded-words decoded.
    pub fn header_decoded(&self, name: &str) -> Option<String> {
        self.header(name).map(decode_encoded_words)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The charset assigned to this node, if any.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Codec that decodes this node's text: the one named by its charset, or
    /// the inherited one when that label is not registered.
    pub fn codec(&self) -> Option<Codec> {
        self.charset
            .as_deref()
            .and_then(Codec::for_label)
            .or(self.inherited)
    }

    /// The parsed `Content-Type`, falling back to the node's default type
    /// when the header is missing or unparsable.
    pub fn content_type(&self) -> ContentType {
        self.header("Content-Type")
            .and_then(ContentType::parse)
            .unwrap_or_else(|| ContentType::simple(self.default_type))
    }

    /// The `charset` parameter of this node's own `Content-Type`.
    pub fn declared_charset(&self) -> Option<String> {
        let ct = self.header("Content-Type").and_then(ContentType::parse)?;
        let charset = ct.param("charset")?.trim();
        (!charset.is_empty()).then(|| charset.to_string())
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.payload, Payload::Parts(_))
    }

    /// Child parts; empty for leaves.
    pub fn parts(&self) -> &[StructuredMessage] {
        match &self.payload {
            Payload::Parts(parts) => parts,
            Payload::Text(_) => &[],
        }
    }

    pub fn parts_mut(&mut self) -> &mut [StructuredMessage] {
        match &mut self.payload {
            Payload::Parts(parts) => parts,
            Payload::Text(_) => &mut [],
        }
    }

    /// Attach a charset to this node.
    ///
    /// Containers and text leaves keep any label, registered or not;
    /// `inherited` is the codec used for an unregistered one. Non-text
    /// leaves (images, archives, …) have no text to annotate and are
    /// rejected. Returns the codec in effect for this node.
    pub fn set_charset(&mut self, label: &str, inherited: Codec) -> Result<Codec, CharsetError> {
        if let Payload::Text(_) = self.payload {
            let ct = self.content_type();
            if !ct.is_text() {
                return Err(CharsetError::NotText {
                    content_type: ct.mime_type(),
                });
            }
        }
        self.charset = Some(label.to_string());
        self.inherited = Some(inherited);
        Ok(Codec::for_label(label).unwrap_or(inherited))
    }

    /// Displayable text of a leaf.
    ///
    /// `base64` and `quoted-printable` bodies are decoded to bytes and then
    /// to text with the node's codec (UTF-8 if none is assigned). Bytes
    /// under an unregistered charset that the inherited codec rejects are
    /// read as Latin-1, so no byte is replaced. Other transfer encodings
    /// return the payload unchanged. Containers return `None`.
    pub fn body_text(&self) -> Option<String> {
        let Payload::Text(raw) = &self.payload else {
            return None;
        };
        let transfer_encoding = self
            .header("Content-Transfer-Encoding")
            .map(|v| v.trim().to_ascii_lowercase());
        let bytes = match transfer_encoding.as_deref() {
            Some("base64") => transfer::decode_base64(raw),
            Some("quoted-printable") => quoted_printable_decode(raw.as_bytes())
                .unwrap_or_else(|| raw.as_bytes().to_vec()),
            _ => return Some(raw.clone()),
        };

        let registered = self.charset.as_deref().map(Codec::for_label);
        let text = match registered {
            Some(None) => {
                let inherited = self.inherited.unwrap_or(Codec::Utf8);
                inherited
                    .decode(&bytes)
                    .map(Cow::into_owned)
                    .unwrap_or_else(|| Codec::Latin1.decode_lossy(&bytes))
            }
            Some(Some(codec)) => codec.decode_lossy(&bytes),
            None => Codec::Utf8.decode_lossy(&bytes),
        };
        Some(text)
    }

    /// Depth-first, pre-order iterator over this node and all descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Leaves whose content type is `text/*`, in document order.
    pub fn text_leaves(&self) -> impl Iterator<Item = &StructuredMessage> {
        self.walk()
            .filter(|node| !node.is_multipart() && node.content_type().is_text())
    }
}

/// Iterator returned by [`StructuredMessage::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a StructuredMessage>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a StructuredMessage;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.parts().iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> Header {
        Header {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let msg = StructuredMessage::text(vec![header("Subject", "hi")], "");
        assert_eq!(msg.header("subject"), Some("hi"));
        assert_eq!(msg.header("From"), None);
    }

    #[test]
    fn test_default_content_type() {
        let msg = StructuredMessage::text(vec![], "body");
        assert_eq!(msg.content_type().mime_type(), "text/plain");
        let digest_child = StructuredMessage::text(vec![], "").with_default_type("message/rfc822");
        assert!(digest_child.content_type().is_rfc822());
    }

    #[test]
    fn test_declared_charset() {
        let msg = StructuredMessage::text(
            vec![header("Content-Type", "text/plain; charset=\"ISO-8859-2\"")],
            "",
        );
        assert_eq!(msg.declared_charset().as_deref(), Some("ISO-8859-2"));
        let empty = StructuredMessage::text(vec![header("Content-Type", "text/plain; charset=")], "");
        assert_eq!(empty.declared_charset(), None);
    }

    #[test]
    fn test_set_charset_rejects_non_text_leaf() {
        let mut msg = StructuredMessage::text(vec![header("Content-Type", "image/png")], "iVBO");
        assert_eq!(
            msg.set_charset("UTF-8", Codec::Utf8),
            Err(CharsetError::NotText {
                content_type: "image/png".into()
            })
        );
        assert_eq!(msg.charset(), None);
    }

    #[test]
    fn test_set_charset_keeps_unregistered_label() {
        let mut msg = StructuredMessage::text(vec![], "");
        assert_eq!(msg.set_charset("unknown-8bit", Codec::Latin1), Ok(Codec::Latin1));
        assert_eq!(msg.charset(), Some("unknown-8bit"));
        assert_eq!(msg.codec(), Some(Codec::Latin1));

        assert_eq!(msg.set_charset("UTF-8", Codec::Latin1), Ok(Codec::Utf8));
        assert_eq!(msg.codec(), Some(Codec::Utf8));
    }

    #[test]
    fn test_body_text_base64_with_charset() {
        let mut msg = StructuredMessage::text(
            vec![
                header("Content-Type", "text/plain"),
                header("Content-Transfer-Encoding", "base64"),
            ],
            "Y2Fm6Q==\n",
        );
        msg.set_charset("ISO-8859-1", Codec::Utf8).unwrap();
        assert_eq!(msg.body_text().as_deref(), Some("café"));
    }

    #[test]
    fn test_body_text_quoted_printable_defaults_to_utf8() {
        let msg = StructuredMessage::text(
            vec![header("Content-Transfer-Encoding", "Quoted-Printable")],
            "caf=C3=A9",
        );
        assert_eq!(msg.body_text().as_deref(), Some("café"));
    }

    #[test]
    fn test_body_text_malformed_quoted_printable_is_kept() {
        let msg = StructuredMessage::text(
            vec![header("Content-Transfer-Encoding", "quoted-printable")],
            "50=ZZ off",
        );
        assert_eq!(msg.body_text().as_deref(), Some("50=ZZ off"));
    }

    #[test]
    fn test_body_text_unregistered_charset_keeps_bytes() {
        let mut msg = StructuredMessage::text(
            vec![
                header("Content-Type", "text/plain; charset=unknown-8bit"),
                header("Content-Transfer-Encoding", "quoted-printable"),
            ],
            "caf=E9 http://example.com/r=E9sum=E9",
        );
        msg.set_charset("unknown-8bit", Codec::Utf8).unwrap();
        assert_eq!(
            msg.body_text().as_deref(),
            Some("café http://example.com/résumé")
        );
    }

    #[test]
    fn test_body_text_unregistered_charset_uses_inherited_codec() {
        let mut msg = StructuredMessage::text(
            vec![header("Content-Transfer-Encoding", "quoted-printable")],
            "=B3=F3d=BC",
        );
        msg.set_charset("x-legacy", Codec::for_label("ISO-8859-2").unwrap())
            .unwrap();
        assert_eq!(msg.body_text().as_deref(), Some("łódź"));
    }

    #[test]
    fn test_walk_order() {
        let tree = StructuredMessage::multipart(
            vec![header("Subject", "root")],
            vec![
                StructuredMessage::multipart(
                    vec![header("Subject", "a")],
                    vec![StructuredMessage::text(vec![header("Subject", "a1")], "")],
                ),
                StructuredMessage::text(vec![header("Subject", "b")], ""),
            ],
        );
        let order: Vec<&str> = tree.walk().filter_map(|n| n.header("Subject")).collect();
        assert_eq!(order, ["root", "a", "a1", "b"]);
        assert_eq!(tree.text_leaves().count(), 2);
    }
}
