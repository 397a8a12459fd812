//! Hide-topic orchestration.
//!
//! [`PageController`] owns one document and runs the collect, segment,
//! classify and redact pipeline over it. [`Background`] keeps the user's topic
//! and the derived keywords. Both speak the JSON messages in [`messages`].

pub mod background;
pub mod controller;
pub mod messages;
pub mod tracker;

pub use background::Background;
pub use controller::{HideReport, PageController};
pub use messages::{BackgroundMessage, ContentMessage, ContentResponse, PageState};
pub use tracker::{OperationTracker, Ticket};
