//! Bounded-size chunking that prefers sentence boundaries.

use hush_core::{Chunk, HideConfig};
use std::ops::Range;

/// How far past the size budget to look for a sentence end.
pub const DEFAULT_LOOKAHEAD: usize = 200;

const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Chunk with the default lookahead.
pub fn chunk(text: &str, max_chars: usize) -> Vec<Chunk> {
    TextChunker::new(max_chars, DEFAULT_LOOKAHEAD).chunk(text)
}

/// Splits text into chunks of at most `max_chars` bytes, stretched by up to
/// `lookahead` bytes to end on a sentence terminator followed by whitespace.
#[derive(Debug, Clone)]
pub struct TextChunker {
    pub max_chars: usize,
    pub lookahead: usize,
}

impl TextChunker {
    pub fn new(max_chars: usize, lookahead: usize) -> Self {
        Self { max_chars: max_chars.max(1), lookahead }
    }

    pub fn from_config(config: &HideConfig) -> Self {
        Self::new(config.max_chunk_chars, config.chunk_lookahead)
    }

    /// Chunks cover `text` exactly once, in order. Blank input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if text.len() <= self.max_chars {
            return vec![Chunk::new(text, 0)];
        }

        let mut chunks = Vec::new();
        let mut cursor = 0;
        while cursor < text.len() {
            if text.len() - cursor <= self.max_chars {
                chunks.push(Chunk::new(&text[cursor..], cursor));
                break;
            }
            let mut naive = floor_char_boundary(text, cursor + self.max_chars);
            if naive <= cursor {
                naive = ceil_char_boundary(text, cursor + 1);
            }
            let end = self.sentence_break(text, cursor, naive).unwrap_or(naive);
            chunks.push(Chunk::new(&text[cursor..end], cursor));
            cursor = end;
        }
        tracing::trace!(chunks = chunks.len(), len = text.len(), "chunked text");
        chunks
    }

    /// Chunk the concatenation of several node texts.
    pub fn chunk_nodes(&self, texts: &[&str]) -> Vec<Chunk> {
        self.chunk(&texts.concat())
    }

    /// First cut point in `(from, from + lookahead]` that sits right after a
    /// terminator and one whitespace character.
    fn sentence_break(&self, text: &str, cursor: usize, from: usize) -> Option<usize> {
        let limit = (from + self.lookahead).min(text.len());
        // Start one char early so a terminator just before `from` counts.
        let scan_start = if from > cursor {
            floor_char_boundary(text, from - 1)
        } else {
            from
        };
        let mut chars = text[scan_start..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let term_end = scan_start + i + c.len_utf8();
            if term_end > limit {
                return None;
            }
            if !TERMINATORS.contains(&c) {
                continue;
            }
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    let cut = term_end + next.len_utf8();
                    if cut > from && cut <= limit {
                        return Some(cut);
                    }
                }
            }
        }
        None
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(4000, DEFAULT_LOOKAHEAD)
    }
}

/// Group consecutive items so each group's summed length stays within
/// `max_chars`. An item longer than the budget gets a group of its own.
pub fn batch_by_budget<T>(items: &[T], len: impl Fn(&T) -> usize, max_chars: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut used = 0;
    for (i, item) in items.iter().enumerate() {
        let l = len(item);
        if i > start && used + l > max_chars {
            batches.push(start..i);
            start = i;
            used = 0;
        }
        used += l;
    }
    if start < items.len() {
        batches.push(start..items.len());
    }
    batches
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i.min(text.len())
}
