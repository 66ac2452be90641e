//! Centralized error types for urlscan.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status when no candidate encoding could decode the input.
pub const EXIT_DECODING_EXHAUSTED: u8 = 65;

/// Exit status when standard input cannot be rebound to a terminal.
pub const EXIT_NO_TERMINAL: u8 = 69;

/// Exit status for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// All errors produced by the urlscan library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified input file does not exist.
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    /// Every candidate encoding failed to decode the input.
    #[error("Encoding not detected. Please pass encoding value manually")]
    DecodingExhausted {
        /// The labels that were tried, in order.
        tried: Vec<String>,
    },

    /// An explicitly requested encoding label is not known.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Standard input had to be rebound but no terminal device could be opened.
    #[error("No controlling terminal available at '{device}': {source}")]
    NoControllingTerminal {
        device: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, ScanError>`.
pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DecodingExhausted { .. } => EXIT_DECODING_EXHAUSTED,
            Self::NoControllingTerminal { .. } => EXIT_NO_TERMINAL,
            _ => EXIT_FAILURE,
        }
    }
}
