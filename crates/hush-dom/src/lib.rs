//! In-memory document tree and the reversible redaction passes over it.
//!
//! - [`collector`] finds the text nodes worth classifying.
//! - [`redactor`] swaps sentences of a text node for marker elements.
//! - [`restorer`] puts the original text back.
//! - [`overlay`] manages the status overlay the collector must ignore.

pub mod collector;
pub mod document;
pub mod overlay;
pub mod redactor;
pub mod restorer;

pub use collector::collect_text_nodes;
pub use document::{Document, Element, NodeData, NodeId};
pub use overlay::{overlay_actions, overlay_present, remove_overlay, show_overlay, OverlayAction, OverlayKind};
pub use redactor::{RedactOutcome, Redactor};
pub use restorer::{has_hidden_content, restore_all, RestoreReport};
