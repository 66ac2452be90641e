//! Core data model: the structured message tree.

pub mod message;

pub use message::{CharsetError, Header, Payload, StructuredMessage};
