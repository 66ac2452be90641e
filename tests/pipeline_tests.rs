//! Integration tests for input decoding, charset propagation and terminal rebinding.

#![cfg(unix)]

use std::io::Read;
use std::os::fd::AsRawFd;
use std::path::Path;

use assert_fs::prelude::*;
use predicates::prelude::*;

use urlscan::encoding::candidates::BASE_ENCODINGS;
use urlscan::encoding::{Codec, EncodingCandidateList};
use urlscan::error::{ScanError, EXIT_DECODING_EXHAUSTED, EXIT_NO_TERMINAL};
use urlscan::input::charset::propagate;
use urlscan::input::decoder;
use urlscan::input::{ByteSource, Rebind, TerminalGuard};
use urlscan::model::Payload;
use urlscan::pipeline;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn body(payload: &Payload) -> &str {
    match payload {
        Payload::Text(text) => text,
        Payload::Parts(_) => panic!("expected a text payload"),
    }
}

// ─── Decoding ───────────────────────────────────────────────────────

#[test]
fn test_every_base_encoding_round_trips() {
    let text = "See http://example.com/caf\u{e9} for the menu\n";
    for label in BASE_ENCODINGS {
        let codec = Codec::for_label(label).unwrap();
        let bytes = codec.encode(text).unwrap();

        let candidates = EncodingCandidateList::from_labels([label]);
        let decoded = decoder::decode(&bytes, &candidates).unwrap();
        assert_eq!(decoded.encoding, label);

        let payload = body(decoded.message.payload());
        assert_eq!(payload, text, "payload mismatch for {label}");
        assert_eq!(codec.encode(payload).unwrap(), bytes, "bytes mismatch for {label}");
    }
}

#[test]
fn test_undecodable_input_is_exhausted() {
    let candidates = EncodingCandidateList::from_labels(["UTF-8", "US-ASCII", "UTF-16"]);
    // Invalid UTF-8, non-ASCII, odd length for UTF-16
    let err = decoder::decode(b"\xC3\x28\xA0", &candidates).unwrap_err();
    assert!(matches!(err, ScanError::DecodingExhausted { .. }));
    assert_eq!(err.exit_code(), EXIT_DECODING_EXHAUSTED);
}

#[test]
fn test_plain_text_first_line_url_survives() {
    let (captured, _) = ByteSource::File(fixture("plain_urls.txt")).capture().unwrap();
    let decoded = decoder::decode(captured.bytes(), &EncodingCandidateList::base()).unwrap();

    assert!(decoded.plain_text_fix);
    assert_eq!(decoded.encoding, "UTF-8");
    let text = body(decoded.message.payload());
    assert!(text.starts_with("http://example.com/a\n"));
    assert!(text.contains("http://example.com/b"));
}

#[test]
fn test_latin1_email_falls_back() {
    let prepared = pipeline::prepare(
        ByteSource::File(fixture("latin1.eml")),
        &EncodingCandidateList::base(),
        None,
    )
    .unwrap();
    assert_eq!(prepared.encoding, "LATIN-1");
    assert!(!prepared.plain_text_fix);
    assert_eq!(prepared.message.header("Subject"), Some("Caf\u{e9}"));
    assert!(body(prepared.message.payload()).contains("r\u{e9}sum\u{e9}"));
    assert_eq!(prepared.message.charset(), Some("LATIN-1"));
}

// ─── Charset propagation ────────────────────────────────────────────

#[test]
fn test_multipart_leaves_inherit_utf8() {
    let prepared = pipeline::prepare(
        ByteSource::File(fixture("multipart.eml")),
        &EncodingCandidateList::base(),
        None,
    )
    .unwrap();
    let msg = &prepared.message;
    assert_eq!(prepared.encoding, "UTF-8");
    assert_eq!(msg.charset(), Some("UTF-8"));

    let alternative = &msg.parts()[0];
    assert_eq!(alternative.charset(), Some("UTF-8"));
    assert_eq!(alternative.parts()[0].charset(), Some("UTF-8"));
    // Declares its own
    assert_eq!(alternative.parts()[1].charset(), Some("iso-8859-1"));
    // image/png takes no charset
    assert_eq!(msg.parts()[1].charset(), None);
    assert_eq!(msg.parts()[2].charset(), Some("UTF-8"));

    assert_eq!(prepared.report.skipped, 1);
    assert_eq!(prepared.report.assigned, 5);
}

#[test]
fn test_text_leaves_are_ready_for_extraction() {
    let prepared = pipeline::prepare(
        ByteSource::File(fixture("multipart.eml")),
        &EncodingCandidateList::base(),
        None,
    )
    .unwrap();
    let texts: Vec<String> = prepared
        .message
        .text_leaves()
        .filter_map(|leaf| leaf.body_text())
        .collect();
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], "Menu: http://example.com/caf\u{e9}/menu");
    assert!(texts[1].contains("http://example.com/html"));
    assert!(texts[2].contains("https://example.org/docs"));
    assert_eq!(
        prepared.message.header_decoded("Subject").as_deref(),
        Some("Links for caf\u{e9}")
    );
}

#[test]
fn test_failing_part_does_not_stop_siblings() {
    let text = "From: a@example.com\n\
Content-Type: multipart/mixed; boundary=b\n\n\
--b\nContent-Type: text/plain\n\nfirst\n\
--b\nContent-Type: application/octet-stream\n\nAAAA\n\
--b\nContent-Type: text/plain; charset=x-unassignable\n\nodd\n\
--b\nContent-Type: text/plain\n\nlast\n\
--b--\n";
    let mut decoded = decoder::decode_text(text, "UTF-8");
    let report = propagate(&mut decoded.message, &decoded.encoding);

    let charsets: Vec<Option<&str>> = decoded.message.parts().iter().map(|p| p.charset()).collect();
    assert_eq!(
        charsets,
        [Some("UTF-8"), None, Some("x-unassignable"), Some("UTF-8")]
    );
    assert_eq!(report.skipped, 1);
    assert_eq!(report.assigned, 4);
}

#[test]
fn test_unregistered_charset_part_keeps_its_urls() {
    let text = "From: a@example.com\n\
Content-Type: multipart/mixed; boundary=b\n\n\
--b\nContent-Type: text/plain\n\nintro\n\
--b\nContent-Type: text/plain; charset=unknown-8bit\n\
Content-Transfer-Encoding: quoted-printable\n\n\
caf=E9 http://example.com/r=E9sum=E9\n\
--b--\n";
    let prepared = pipeline::prepare(
        ByteSource::Memory(text.as_bytes().to_vec()),
        &EncodingCandidateList::base(),
        None,
    )
    .unwrap();
    assert_eq!(prepared.message.charset(), Some("UTF-8"));

    let leaf = &prepared.message.parts()[1];
    assert_eq!(leaf.charset(), Some("unknown-8bit"));
    assert_eq!(leaf.codec(), Some(Codec::Utf8));
    assert_eq!(
        leaf.body_text().as_deref(),
        Some("caf\u{e9} http://example.com/r\u{e9}sum\u{e9}")
    );
    assert_eq!(prepared.report.skipped, 0);
}

// ─── Terminal rebinding ─────────────────────────────────────────────

#[test]
fn test_pipeline_rebinds_piped_input_to_terminal() {
    let dir = assert_fs::TempDir::new().unwrap();
    let device = dir.child("tty");
    device.write_str("q\n").unwrap();
    let mut piped = tempfile::tempfile().unwrap();

    let guard = TerminalGuard::new(device.path()).with_target(piped.as_raw_fd());
    let prepared = pipeline::prepare(
        ByteSource::Memory(b"http://example.com\n".to_vec()),
        &EncodingCandidateList::base(),
        Some(guard),
    )
    .unwrap();
    assert!(prepared.plain_text_fix);

    let mut keys = String::new();
    piped.read_to_string(&mut keys).unwrap();
    assert_eq!(keys, "q\n");
    device.assert(predicate::str::contains("q"));
}

#[test]
fn test_missing_terminal_is_fatal_with_distinct_code() {
    let dir = assert_fs::TempDir::new().unwrap();
    let missing = dir.child("no-such-tty");
    missing.assert(predicate::path::missing());
    let piped = tempfile::tempfile().unwrap();

    let guard = TerminalGuard::new(missing.path()).with_target(piped.as_raw_fd());
    let err = pipeline::prepare(
        ByteSource::Memory(b"text\n".to_vec()),
        &EncodingCandidateList::base(),
        Some(guard),
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::NoControllingTerminal { .. }));
    assert_eq!(err.exit_code(), EXIT_NO_TERMINAL);
}

#[test]
fn test_decoding_failure_precedes_terminal_rebind() {
    let dir = assert_fs::TempDir::new().unwrap();
    let piped = tempfile::tempfile().unwrap();
    let guard = TerminalGuard::new(dir.child("no-such-tty").path()).with_target(piped.as_raw_fd());

    let err = pipeline::prepare(
        ByteSource::Memory(b"\xFF".to_vec()),
        &EncodingCandidateList::from_labels(["UTF-8"]),
        Some(guard),
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::DecodingExhausted { .. }));
}

#[test]
fn test_guard_reports_rebind() {
    let dir = assert_fs::TempDir::new().unwrap();
    let device = dir.child("tty");
    device.touch().unwrap();
    let piped = tempfile::tempfile().unwrap();
    let (_, token) = ByteSource::Memory(Vec::new()).capture().unwrap();

    let outcome = TerminalGuard::new(device.path())
        .with_target(piped.as_raw_fd())
        .ensure_terminal(token)
        .unwrap();
    assert_eq!(outcome, Rebind::Rebound);
}
