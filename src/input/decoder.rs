//! Decode raw bytes of unknown encoding into a [`StructuredMessage`].
//!
//! Candidates are tried in order and the first encoding that decodes the
//! bytes without error wins. The decoded text is then parsed; text that
//! does not look like email gets a leading blank line so the parser keeps
//! its first line as body text.

use thiserror::Error;
use tracing::{debug, info};

use crate::encoding::{Codec, EncodingCandidateList};
use crate::error::{Result, ScanError};
use crate::model::message::StructuredMessage;
use crate::parser::parse_message;

/// A successfully decoded and parsed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub message: StructuredMessage,
    /// The candidate label that decoded the bytes.
    pub encoding: String,
    /// Whether the input was re-parsed as plain text.
    pub plain_text_fix: bool,
}

/// Why a single candidate was rejected. Never fatal on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrialFailure {
    #[error("unknown encoding label")]
    UnknownLabel,
    #[error("input is not valid in this encoding")]
    Malformed,
}

/// Try each candidate in order until one decodes `bytes`.
///
/// Fails with [`ScanError::DecodingExhausted`] when every candidate is rejected.
pub fn decode(bytes: &[u8], candidates: &EncodingCandidateList) -> Result<DecodedMessage> {
    for label in candidates.iter() {
        match try_candidate(bytes, label) {
            Ok(decoded) => {
                info!(
                    encoding = %decoded.encoding,
                    plain_text_fix = decoded.plain_text_fix,
                    "Decoded input"
                );
                return Ok(decoded);
            }
            Err(failure) => debug!(encoding = label, reason = %failure, "Candidate rejected"),
        }
    }

    Err(ScanError::DecodingExhausted {
        tried: candidates.as_slice().to_vec(),
    })
}

/// Parse text that is already decoded, skipping the candidate loop.
pub fn decode_text(text: &str, encoding: &str) -> DecodedMessage {
    let (message, plain_text_fix) = parse_with_heuristic(text);
    DecodedMessage {
        message,
        encoding: encoding.to_string(),
        plain_text_fix,
    }
}

fn try_candidate(bytes: &[u8], label: &str) -> std::result::Result<DecodedMessage, TrialFailure> {
    let codec = Codec::for_label(label).ok_or(TrialFailure::UnknownLabel)?;
    let text = codec.decode(bytes).ok_or(TrialFailure::Malformed)?;
    Ok(decode_text(&text, label))
}

/// Parse `text`, re-parsing with a leading blank line when it has neither
/// a `From` nor a `Date` header.
///
/// Without the blank line, a first line such as `http://host/path` reads as
/// a header named `http` and drops out of the body.
pub fn parse_with_heuristic(text: &str) -> (StructuredMessage, bool) {
    let message = parse_message(text);
    if looks_like_email(&message) {
        return (message, false);
    }
    debug!("No From or Date header, re-parsing as plain text");
    let fixed = format!("\n{text}");
    (parse_message(&fixed), true)
}

/// The non-email heuristic: email has a `From` or a `Date` header.
pub fn looks_like_email(message: &StructuredMessage) -> bool {
    message.header("From").is_some() || message.header("Date").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Payload;

    #[test]
    fn test_first_success_wins() {
        let candidates = EncodingCandidateList::from_labels(["UTF-8", "LATIN-1"]);
        let decoded = decode("From: a@b.c\n\ncafé".as_bytes(), &candidates).unwrap();
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(!decoded.plain_text_fix);
    }

    #[test]
    fn test_falls_through_to_latin1() {
        let candidates = EncodingCandidateList::base();
        let decoded = decode(b"Date: today\n\ncaf\xE9", &candidates).unwrap();
        assert_eq!(decoded.encoding, "LATIN-1");
        assert_eq!(decoded.message.payload(), &Payload::Text("café".into()));
    }

    #[test]
    fn test_unknown_labels_are_skipped() {
        let candidates = EncodingCandidateList::from_labels(["x-not-real", "UTF-8"]);
        let decoded = decode(b"hello", &candidates).unwrap();
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn test_exhausted() {
        let candidates = EncodingCandidateList::from_labels(["UTF-8", "ASCII"]);
        let err = decode(b"\xFF\xFE\xFD", &candidates).unwrap_err();
        match err {
            ScanError::DecodingExhausted { tried } => assert_eq!(tried, ["UTF-8", "ASCII"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_candidate_list_is_exhausted() {
        let candidates = EncodingCandidateList::from_labels(Vec::<String>::new());
        assert!(matches!(
            decode(b"x", &candidates),
            Err(ScanError::DecodingExhausted { .. })
        ));
    }

    #[test]
    fn test_email_is_not_fixed() {
        let (msg, fixed) = parse_with_heuristic("From: a@b.c\nSubject: s\n\nbody\n");
        assert!(!fixed);
        assert_eq!(msg.header("Subject"), Some("s"));
    }

    #[test]
    fn test_date_alone_counts_as_email() {
        let (_, fixed) = parse_with_heuristic("Date: Thu, 1 Feb 2024 10:00:00 +0000\n\nbody\n");
        assert!(!fixed);
    }

    #[test]
    fn test_url_first_line_kept() {
        let text = "http://example.com/a\nsee also http://example.com/b\n";
        let (msg, fixed) = parse_with_heuristic(text);
        assert!(fixed);
        assert!(msg.headers().is_empty());
        assert_eq!(msg.payload(), &Payload::Text(text.into()));
    }

    #[test]
    fn test_header_like_plain_text_is_all_body() {
        let text = "Subject: notes\nvisit https://example.org\n";
        let (msg, fixed) = parse_with_heuristic(text);
        assert!(fixed);
        assert_eq!(msg.header("Subject"), None);
        assert_eq!(msg.payload(), &Payload::Text(text.into()));
    }
}
