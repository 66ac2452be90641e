//! `urlscan` — extract URLs from email messages or plain text.
//!
//! This crate provides the input normalization pipeline: it takes bytes of
//! unknown encoding and structure and produces a decoded, charset-annotated
//! message tree for URL extraction.

pub mod config;
pub mod encoding;
pub mod error;
pub mod i18n;
pub mod input;
pub mod model;
pub mod parser;
pub mod pipeline;
