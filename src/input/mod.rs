//! Input normalization: capture, decoding, terminal rebinding, and charset
//! annotation.

pub mod charset;
pub mod decoder;
pub mod source;
pub mod terminal;

pub use decoder::DecodedMessage;
pub use source::{ByteSource, CapturedBytes, InputCaptured};
pub use terminal::{Rebind, TerminalGuard};
