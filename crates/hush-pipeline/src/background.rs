use crate::messages::ContentMessage;
use hush_core::{HideConfig, Result, Topic};
use hush_model::{check_keywords, extract_keywords, LanguageModel, SessionManager, TopicStore};
use std::sync::Arc;

/// Topic bookkeeping shared by every page.
pub struct Background {
    sessions: SessionManager,
    store: Arc<dyn TopicStore>,
}

impl Background {
    pub fn new(model: Arc<dyn LanguageModel>, store: Arc<dyn TopicStore>, config: &HideConfig) -> Self {
        Self { sessions: SessionManager::new(model, config.prompt_timeout()), store }
    }

    /// Save `raw` as the current topic and derive keywords for it.
    pub async fn store_topic(&self, raw: &str) -> Result<Vec<String>> {
        let topic = Topic::parse(raw)?;
        self.store.set_topic(topic.clone());
        let keywords = extract_keywords(&self.sessions, &topic).await;
        self.sessions.teardown().await;
        self.store.set_keywords(keywords.clone());
        tracing::info!(topic = %topic, keywords = keywords.len(), "stored topic");
        Ok(keywords)
    }

    /// The message to send a tab whose title or URL mentions a stored keyword.
    pub fn on_tab_changed(&self, title: &str, url: &str) -> Option<ContentMessage> {
        let matched = check_keywords(&self.store.keywords(), title, url);
        if matched.is_empty() {
            return None;
        }
        tracing::info!(url, matched = matched.len(), "keywords detected in tab");
        Some(ContentMessage::KeywordsDetected { keywords: matched })
    }
}
