use hush_core::Result;
use serde::{Deserialize, Serialize};

/// Requests handled by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentMessage {
    HideTopic { topic: String },
    Undo,
    KeywordsDetected { keywords: Vec<String> },
    QueryState,
}

impl ContentMessage {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Requests a page sends up to the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BackgroundMessage {
    CloseTab,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub has_hidden_content: bool,
    pub overlay_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentResponse {
    Ack { success: bool },
    State(PageState),
}

impl ContentResponse {
    pub fn ok() -> Self {
        Self::Ack { success: true }
    }
}
