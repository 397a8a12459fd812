//! Sentence segmentation and bounded chunking for topic classification.
//!
//! Everything here is pure: no DOM, no model calls.

pub mod chunker;
pub mod segmenter;

pub use chunker::{batch_by_budget, chunk, TextChunker, DEFAULT_LOOKAHEAD};
pub use segmenter::{normalize_whitespace, segment, SentenceSegmenter};
