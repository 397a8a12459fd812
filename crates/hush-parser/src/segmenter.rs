//! Sentence segmenter with neighbour context.
//!
//! Two flavours share the same boundary rules:
//! - [`SentenceSegmenter::segment`] reports spans over the whitespace-normalized text,
//!   which is what the model sees.
//! - [`SentenceSegmenter::segment_raw`] reports spans over the raw text and covers it
//!   exactly, which is what redaction slices.

use crate::chunker::TextChunker;
use hush_core::{HideConfig, SegmenterKind, SentenceContext, TextSpan};
use regex::Regex;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

static RE_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]*[.!?]+\s*|[^.!?]+").unwrap());

/// Collapse whitespace runs to one space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Segment normalized text with the default (Unicode) rules.
pub fn segment(text: &str, context_window: usize) -> Vec<SentenceContext> {
    SentenceSegmenter::new(SegmenterKind::Unicode, context_window).segment(text)
}

#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    pub kind: SegmenterKind,
    pub context_window: usize,
}

impl SentenceSegmenter {
    pub fn new(kind: SegmenterKind, context_window: usize) -> Self {
        Self { kind, context_window }
    }

    pub fn from_config(config: &HideConfig) -> Self {
        Self::new(config.segmenter, config.context_window)
    }

    /// Spans over `normalize_whitespace(text)`, without the separating space.
    pub fn segment(&self, text: &str) -> Vec<SentenceContext> {
        let normalized = normalize_whitespace(text);
        let spans = self
            .pieces(&normalized)
            .into_iter()
            .map(|(start, piece)| {
                let trimmed = piece.trim_end();
                TextSpan::new(trimmed, start, start + trimmed.len())
            })
            .collect();
        self.attach_context(spans)
    }

    /// Spans over the raw text. Consecutive spans are contiguous and
    /// their texts concatenate to `text`.
    pub fn segment_raw(&self, text: &str) -> Vec<SentenceContext> {
        let spans = self
            .pieces(text)
            .into_iter()
            .map(|(start, piece)| TextSpan::new(piece, start, start + piece.len()))
            .collect();
        self.attach_context(spans)
    }

    /// Like [`segment_raw`](Self::segment_raw), but long text is first cut into
    /// bounded chunks so no boundary search runs over the whole input.
    pub fn segment_raw_chunked(&self, text: &str, chunker: &TextChunker) -> Vec<SentenceContext> {
        let chunks = chunker.chunk(text);
        if chunks.len() <= 1 {
            return self.segment_raw(text);
        }
        let mut spans: Vec<TextSpan> = Vec::new();
        for c in &chunks {
            let pieces = self.pieces(&c.text);
            if pieces.is_empty() {
                // Whitespace-only chunk; kept so the spans still cover `text`.
                spans.push(TextSpan::new(c.text.as_str(), c.start_index, c.end_index()));
                continue;
            }
            for (start, piece) in pieces {
                let start = c.start_index + start;
                spans.push(TextSpan::new(piece, start, start + piece.len()));
            }
        }
        // Blank spans (whitespace-only chunks, or a chunk opening with
        // whitespace) are folded into a neighbouring sentence.
        let spans = merge_blank_spans(spans);
        self.attach_context(spans)
    }

    /// Contiguous pieces covering `text`; whitespace-only pieces are folded
    /// into a neighbour. Empty for blank input.
    fn pieces<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        // Boundaries are found on a copy where every whitespace char is a
        // space of the same byte width, so line breaks in markup do not end
        // sentences and offsets still index `text`.
        let flat = flatten_whitespace(text);
        let bounds: Vec<(usize, usize)> = match self.kind {
            SegmenterKind::Unicode => flat
                .split_sentence_bound_indices()
                .map(|(i, s)| (i, i + s.len()))
                .collect(),
            SegmenterKind::Regex => regex_pieces(&flat)
                .into_iter()
                .map(|(i, s)| (i, i + s.len()))
                .collect(),
        };
        let raw: Vec<(usize, &str)> = if bounds.is_empty() {
            vec![(0, text)]
        } else {
            bounds.into_iter().map(|(s, e)| (s, &text[s..e])).collect()
        };
        fold_blank_pieces(text, raw)
    }

    fn attach_context(&self, spans: Vec<TextSpan>) -> Vec<SentenceContext> {
        let texts: Vec<String> = spans.iter().map(|s| normalize_whitespace(&s.text)).collect();
        let w = self.context_window;
        spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                let lo = i.saturating_sub(w);
                let hi = (i + w + 1).min(texts.len());
                let context = texts[lo..hi]
                    .iter()
                    .filter(|t| !t.is_empty())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                SentenceContext { span, context }
            })
            .collect()
    }
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new(SegmenterKind::Unicode, 1)
    }
}

fn flatten_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        } else {
            out.push(c);
        }
    }
    out
}

/// Terminator-rule pieces, with any unmatched gap kept as its own piece.
fn regex_pieces(text: &str) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut cursor = 0;
    for m in RE_SENTENCE.find_iter(text) {
        if m.start() > cursor {
            pieces.push((cursor, &text[cursor..m.start()]));
        }
        pieces.push((m.start(), m.as_str()));
        cursor = m.end();
    }
    if cursor < text.len() {
        pieces.push((cursor, &text[cursor..]));
    }
    pieces
}

/// Fold whitespace-only pieces into the previous piece, or the next one
/// when there is no previous piece.
fn fold_blank_pieces<'a>(text: &'a str, raw: Vec<(usize, &'a str)>) -> Vec<(usize, &'a str)> {
    let mut out: Vec<(usize, usize)> = Vec::with_capacity(raw.len());
    let mut pending_start: Option<usize> = None;
    for (start, piece) in raw {
        let end = start + piece.len();
        if piece.trim().is_empty() {
            match out.last_mut() {
                Some(last) => last.1 = end,
                None => {
                    pending_start.get_or_insert(start);
                }
            }
            continue;
        }
        let start = pending_start.take().unwrap_or(start);
        out.push((start, end));
    }
    out.into_iter().map(|(s, e)| (s, &text[s..e])).collect()
}

fn merge_blank_spans(spans: Vec<TextSpan>) -> Vec<TextSpan> {
    let mut out: Vec<TextSpan> = Vec::with_capacity(spans.len());
    let mut pending: Option<TextSpan> = None;
    for span in spans {
        if span.text.trim().is_empty() {
            match out.last_mut() {
                Some(last) => {
                    last.text.push_str(&span.text);
                    last.end = span.end;
                }
                None => {
                    pending = Some(match pending.take() {
                        Some(p) => TextSpan::new(p.text + &span.text, p.start, span.end),
                        None => span,
                    })
                }
            }
            continue;
        }
        match pending.take() {
            Some(p) => out.push(TextSpan::new(p.text + &span.text, p.start, span.end)),
            None => out.push(span),
        }
    }
    if let Some(p) = pending {
        out.push(p);
    }
    out
}
