//! Character encodings: candidate ordering, label resolution and DOS code pages.

pub mod candidates;
pub mod codec;
pub mod oem;

pub use candidates::{EncodingCandidateList, LocaleSnapshot};
pub use codec::Codec;
