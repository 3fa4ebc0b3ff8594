//! Value types shared by the mosaic crates.

mod span;

pub use span::{ByteSpan, SpanParseError};
