//! Where the raw message bytes come from.

use std::io::Read;
use std::path::PathBuf;

use crate::error::{Result, ScanError};

/// An input not yet read. Capturing consumes it, so it is read exactly once.
#[derive(Debug)]
pub enum ByteSource {
    /// A file on disk.
    File(PathBuf),
    /// Standard input, read to end of stream on capture.
    Stdin,
    /// Bytes already in memory.
    Memory(Vec<u8>),
}

/// The immutable bytes of a captured source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedBytes {
    bytes: Vec<u8>,
    origin: String,
}

impl CapturedBytes {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Human-readable origin (`<stdin>`, `<memory>`, or the file path).
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Proof that the input has been read completely.
///
/// Only [`ByteSource::capture`] creates one; the terminal guard requires it,
/// so standard input cannot be rebound while piped bytes are still unread.
#[derive(Debug)]
pub struct InputCaptured {
    _private: (),
}

impl ByteSource {
    /// Read the whole source.
    pub fn capture(self) -> Result<(CapturedBytes, InputCaptured)> {
        let (bytes, origin) = match self {
            Self::File(path) => {
                let bytes = std::fs::read(&path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        ScanError::FileNotFound(path.clone())
                    } else {
                        ScanError::io(&path, e)
                    }
                })?;
                (bytes, path.display().to_string())
            }
            Self::Stdin => {
                let mut bytes = Vec::new();
                std::io::stdin()
                    .lock()
                    .read_to_end(&mut bytes)
                    .map_err(|e| ScanError::io("<stdin>", e))?;
                (bytes, "<stdin>".to_string())
            }
            Self::Memory(bytes) => (bytes, "<memory>".to_string()),
        };

        tracing::debug!(origin = %origin, size = bytes.len(), "Captured input");
        Ok((CapturedBytes { bytes, origin }, InputCaptured { _private: () }))
    }
}
