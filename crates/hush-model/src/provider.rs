use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether the on-device model can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Unavailable,
    Downloadable,
    Downloading,
    Available,
}

impl Availability {
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Factory for model sessions.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn availability(&self) -> Availability;

    /// Create a session; may wait for a model download.
    async fn create_session(&self) -> anyhow::Result<Box<dyn ModelSession>>;
}

/// A stateful model session. Not safe for concurrent prompts.
#[async_trait]
pub trait ModelSession: Send + Sync {
    /// Prompt with a JSON-schema response constraint; returns the raw JSON text.
    async fn prompt(&self, prompt: &str, schema: &Value) -> anyhow::Result<String>;

    /// Release the session's resources.
    fn destroy(&mut self) {}
}
