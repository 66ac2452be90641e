//! Message parsing over decoded text: header blocks, MIME structure, and
//! transfer-encoding decoders.

pub mod header;
pub mod mime;
pub mod transfer;

pub use mime::parse_message;
