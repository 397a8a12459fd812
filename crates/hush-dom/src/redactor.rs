//! Sentence-level redaction of a single text node.

use crate::document::{Document, NodeId};
use hush_core::{HideConfig, MarkerStyle, Result, SentenceContext};

/// What happened to a node handed to [`Redactor::redact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedactOutcome {
    /// The node was no longer in the tree.
    Detached,
    /// Nothing to hide, or the spans did not describe the node's text.
    Unchanged,
    /// The node was replaced; `nodes` are the replacements in order.
    Redacted { markers: usize, nodes: Vec<NodeId> },
}

#[derive(Debug, Clone)]
pub struct Redactor {
    pub marker_class: String,
    pub original_attr: String,
    pub style: MarkerStyle,
}

enum Piece<'a> {
    Plain(String),
    Hidden(&'a str),
}

impl Redactor {
    pub fn from_config(config: &HideConfig) -> Self {
        Self {
            marker_class: config.marker_class.clone(),
            original_attr: config.original_attr.clone(),
            style: config.marker_style,
        }
    }

    /// Replace `node` with plain text and marker nodes, one per run.
    ///
    /// `spans` must be raw spans over the node's current value, covering it
    /// exactly; otherwise the node is left alone. `hide(i)` decides span `i`.
    /// Whitespace around a hidden sentence stays plain text.
    pub fn redact(
        &self,
        doc: &mut Document,
        node: NodeId,
        spans: &[SentenceContext],
        hide: impl Fn(usize) -> bool,
    ) -> Result<RedactOutcome> {
        if doc.parent(node).is_none() {
            return Ok(RedactOutcome::Detached);
        }
        let Some(value) = doc.text(node) else {
            tracing::warn!(?node, "redact called on a non-text node");
            return Ok(RedactOutcome::Unchanged);
        };
        let covered: String = spans.iter().map(|s| s.text()).collect();
        if covered != value {
            tracing::warn!(?node, "sentence spans do not match node text, leaving it visible");
            return Ok(RedactOutcome::Unchanged);
        }

        let pieces = split_pieces(spans, hide);
        let markers = pieces.iter().filter(|p| matches!(p, Piece::Hidden(_))).count();
        if markers == 0 {
            return Ok(RedactOutcome::Unchanged);
        }

        let nodes: Vec<NodeId> = pieces
            .into_iter()
            .map(|piece| match piece {
                Piece::Plain(text) => doc.create_text(&text),
                Piece::Hidden(text) => self.build_marker(doc, text),
            })
            .collect();
        doc.replace_with(node, &nodes)?;
        tracing::debug!(?node, markers, "redacted text node");
        Ok(RedactOutcome::Redacted { markers, nodes })
    }

    /// A detached marker element holding `original`.
    pub fn build_marker(&self, doc: &mut Document, original: &str) -> NodeId {
        let marker = doc.create_element("span");
        if let Some(el) = doc.element_mut(marker) {
            el.add_class(&self.marker_class);
            el.set_attr(self.original_attr.clone(), original);
        }
        let rendered = match self.style {
            MarkerStyle::Blackout => original.to_string(),
            MarkerStyle::Mask(mask) => original
                .chars()
                .map(|c| if c.is_whitespace() { c } else { mask })
                .collect(),
        };
        let text = doc.create_text(&rendered);
        doc.append_child(marker, text);
        marker
    }
}

/// Runs of plain text and hidden sentence cores, adjacent plain runs merged.
fn split_pieces<'a>(spans: &'a [SentenceContext], hide: impl Fn(usize) -> bool) -> Vec<Piece<'a>> {
    let mut pieces: Vec<Piece<'a>> = Vec::new();

    for (i, span) in spans.iter().enumerate() {
        let text = span.text();
        let core = text.trim();
        if !hide(i) || core.is_empty() {
            push_plain(&mut pieces, text);
            continue;
        }
        let lead = text.len() - text.trim_start().len();
        push_plain(&mut pieces, &text[..lead]);
        pieces.push(Piece::Hidden(core));
        push_plain(&mut pieces, &text[lead + core.len()..]);
    }
    pieces
}

fn push_plain(pieces: &mut Vec<Piece<'_>>, text: &str) {
    if text.is_empty() {
        return;
    }
    match pieces.last_mut() {
        Some(Piece::Plain(buf)) => buf.push_str(text),
        _ => pieces.push(Piece::Plain(text.to_string())),
    }
}
