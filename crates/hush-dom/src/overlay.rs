//! The status overlay shown while content is being hidden.

use crate::document::{Document, NodeId};
use hush_core::HideConfig;

const LOGO_TEXT: &str = " hide ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Animated logo while a hide operation runs.
    Hiding,
    /// Offers to hide content after a keyword match.
    KeywordsDetected,
}

/// What an overlay button does, carried in its `data-action` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Hide,
    CloseTab,
    Reveal,
}

impl OverlayAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::CloseTab => "close-tab",
            Self::Reveal => "reveal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hide" => Some(Self::Hide),
            "close-tab" => Some(Self::CloseTab),
            "reveal" => Some(Self::Reveal),
            _ => None,
        }
    }
}

/// Show (or rebuild) the overlay under `<body>`.
pub fn show_overlay(doc: &mut Document, config: &HideConfig, kind: OverlayKind) -> NodeId {
    let overlay = match doc.get_element_by_id(&config.overlay_id) {
        Some(existing) => {
            for child in doc.children(existing).to_vec() {
                doc.remove(child);
            }
            existing
        }
        None => {
            let overlay = doc.create_element("div");
            doc.set_attribute(overlay, "id", &config.overlay_id);
            doc.set_attribute(overlay, "class", "hide-overlay");
            let body = doc.body();
            doc.append_child(body, overlay);
            overlay
        }
    };

    let logo = doc.create_element("div");
    let logo_class = match kind {
        OverlayKind::Hiding => "hide-loading animate",
        OverlayKind::KeywordsDetected => "hide-loading",
    };
    doc.set_attribute(logo, "class", logo_class);
    for ch in LOGO_TEXT.chars() {
        let span = doc.create_element("span");
        doc.set_attribute(span, "class", "hide-loading-char");
        let text = doc.create_text(&ch.to_string());
        doc.append_child(span, text);
        doc.append_child(logo, span);
    }
    doc.append_child(overlay, logo);

    let buttons = doc.create_element("div");
    doc.set_attribute(buttons, "class", "hide-body");
    if kind == OverlayKind::KeywordsDetected {
        add_button(doc, buttons, "Hide Content", OverlayAction::Hide);
    }
    add_button(doc, buttons, "Close Tab", OverlayAction::CloseTab);
    add_button(doc, buttons, "Reveal Page", OverlayAction::Reveal);
    doc.append_child(overlay, buttons);
    overlay
}

/// Remove the overlay; returns whether one was present.
pub fn remove_overlay(doc: &mut Document, config: &HideConfig) -> bool {
    match doc.get_element_by_id(&config.overlay_id) {
        Some(overlay) => {
            doc.remove(overlay);
            true
        }
        None => false,
    }
}

pub fn overlay_present(doc: &Document, config: &HideConfig) -> bool {
    doc.get_element_by_id(&config.overlay_id).is_some()
}

/// Actions of the overlay's buttons, in display order. Empty when no overlay
/// is shown.
pub fn overlay_actions(doc: &Document, config: &HideConfig) -> Vec<OverlayAction> {
    let Some(overlay) = doc.get_element_by_id(&config.overlay_id) else {
        return Vec::new();
    };
    doc.descendants(overlay)
        .into_iter()
        .filter_map(|id| doc.attribute(id, "data-action"))
        .filter_map(OverlayAction::parse)
        .collect()
}

fn add_button(doc: &mut Document, parent: NodeId, label: &str, action: OverlayAction) {
    let button = doc.create_element("button");
    doc.set_attribute(button, "data-action", action.as_str());
    let text = doc.create_text(label);
    doc.append_child(button, text);
    doc.append_child(parent, button);
}
