//! Shared types, configuration and errors for the hush topic-hiding pipeline.

pub mod config;
pub mod error;
pub mod types;

pub use config::{HideConfig, MarkerStyle, SegmenterKind};
pub use error::{HushError, Result};
pub use types::*;
