//! Undo for [`crate::redactor`].

use crate::document::{Document, NodeId};
use hush_core::HideConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Markers without a stored original, or already detached.
    pub skipped: usize,
}

/// Replace every marker under `root` with its stored original text, then
/// merge the text nodes the redaction split apart. Safe to call repeatedly.
pub fn restore_all(doc: &mut Document, root: NodeId, config: &HideConfig) -> RestoreReport {
    let mut report = RestoreReport::default();
    let markers = doc.elements_by_class(root, &config.marker_class);
    if markers.is_empty() {
        return report;
    }

    for marker in markers {
        let Some(original) = doc.attribute(marker, &config.original_attr).map(str::to_string) else {
            tracing::warn!(?marker, "marker has no stored original, skipping");
            report.skipped += 1;
            continue;
        };
        let text = doc.create_text(&original);
        match doc.replace_with(marker, &[text]) {
            Ok(()) => report.restored += 1,
            Err(e) => {
                tracing::warn!(?marker, error = %e, "could not restore marker");
                report.skipped += 1;
            }
        }
    }

    doc.normalize(root);
    tracing::debug!(restored = report.restored, skipped = report.skipped, "restored hidden content");
    report
}

/// Whether any marker is present under `root`.
pub fn has_hidden_content(doc: &Document, root: NodeId, config: &HideConfig) -> bool {
    !doc.elements_by_class(root, &config.marker_class).is_empty()
}
