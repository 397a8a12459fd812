//! Text node collection.

use crate::document::{Document, NodeData, NodeId};
use hush_core::HideConfig;

/// Eligible text nodes under `root`, in document order.
///
/// Skips subtrees rooted at ignored tags (script, style, form inputs, ...),
/// the status overlay, and existing redaction markers. Text nodes that are
/// blank after trimming are skipped too. The result is a snapshot: nodes may
/// be detached afterwards and callers must re-check before mutating.
pub fn collect_text_nodes(doc: &Document, root: NodeId, config: &HideConfig) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(root).iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        match doc.data(id) {
            NodeData::Text(text) => {
                if !text.trim().is_empty() {
                    nodes.push(id);
                }
            }
            NodeData::Element(el) => {
                if config.is_ignored_tag(&el.name)
                    || el.id() == Some(config.overlay_id.as_str())
                    || el.has_class(&config.marker_class)
                {
                    continue;
                }
                stack.extend(doc.children(id).iter().rev().copied());
            }
            NodeData::Document => stack.extend(doc.children(id).iter().rev().copied()),
            NodeData::Comment(_) => {}
        }
    }

    tracing::debug!(count = nodes.len(), "collected text nodes");
    nodes
}
