//! End-to-end input normalization and the hand-off to URL extraction.
//!
//! Order matters: the input is captured completely, decoded, then standard
//! input is rebound to the terminal (interactive runs only), and finally
//! the charset of every part is resolved.

use crate::config::DecodingConfig;
use crate::encoding::{Codec, EncodingCandidateList, LocaleSnapshot};
use crate::error::{Result, ScanError};
use crate::input::charset::{self, PropagationReport};
use crate::input::decoder;
use crate::input::{ByteSource, TerminalGuard};
use crate::model::message::StructuredMessage;

/// A decoded, charset-annotated message ready for URL extraction.
#[derive(Debug, Clone)]
pub struct PreparedMessage {
    pub message: StructuredMessage,
    /// Encoding that decoded the top-level bytes.
    pub encoding: String,
    /// Whether the input was treated as plain text.
    pub plain_text_fix: bool,
    pub report: PropagationReport,
    /// Where the bytes came from.
    pub origin: String,
}

/// Receives the prepared message: URL extraction, the picker, or a report.
pub trait MessageConsumer {
    fn consume(&mut self, prepared: &PreparedMessage) -> anyhow::Result<()>;
}

/// Build the candidate list from an explicit override, the config, and the locale.
///
/// An override (CLI first, then config) becomes the only candidate and must
/// name a known encoding. Otherwise the locale-seeded list is extended with
/// the configured extras.
pub fn build_candidates(
    locale: &LocaleSnapshot,
    decoding: &DecodingConfig,
    cli_encoding: Option<&str>,
) -> Result<EncodingCandidateList> {
    if let Some(label) = cli_encoding.or(decoding.encoding.as_deref()) {
        if Codec::for_label(label).is_none() {
            return Err(ScanError::UnsupportedEncoding(label.to_string()));
        }
        return Ok(EncodingCandidateList::from_labels([label]));
    }

    let mut candidates = EncodingCandidateList::resolve(locale);
    candidates.extend(decoding.extra_encodings.iter().cloned());
    Ok(candidates)
}

/// Capture, decode, optionally rebind the terminal, and annotate charsets.
///
/// `terminal` is `None` for non-interactive runs.
pub fn prepare(
    source: ByteSource,
    candidates: &EncodingCandidateList,
    terminal: Option<TerminalGuard>,
) -> Result<PreparedMessage> {
    let (captured, token) = source.capture()?;
    let decoded = decoder::decode(captured.bytes(), candidates)?;

    if let Some(guard) = terminal {
        guard.ensure_terminal(token)?;
    }

    let mut message = decoded.message;
    let report = charset::propagate(&mut message, &decoded.encoding);

    Ok(PreparedMessage {
        message,
        encoding: decoded.encoding,
        plain_text_fix: decoded.plain_text_fix,
        report,
        origin: captured.origin().to_string(),
    })
}

/// [`prepare`] and hand the result to `consumer`.
pub fn run(
    source: ByteSource,
    candidates: &EncodingCandidateList,
    terminal: Option<TerminalGuard>,
    consumer: &mut dyn MessageConsumer,
) -> anyhow::Result<()> {
    let prepared = prepare(source, candidates, terminal)?;
    consumer.consume(&prepared)
}
