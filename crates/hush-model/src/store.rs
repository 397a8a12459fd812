use hush_core::Topic;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Persisted topic record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTopic {
    pub topic: Option<Topic>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

pub trait TopicStore: Send + Sync {
    fn topic(&self) -> Option<Topic>;
    fn set_topic(&self, topic: Topic);
    fn keywords(&self) -> Vec<String>;
    fn set_keywords(&self, keywords: Vec<String>);
}

#[derive(Debug, Default)]
pub struct MemoryTopicStore {
    inner: RwLock<StoredTopic>,
}

impl MemoryTopicStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: StoredTopic) -> Self {
        Self { inner: RwLock::new(record) }
    }

    pub fn snapshot(&self) -> StoredTopic {
        self.inner.read().clone()
    }
}

impl TopicStore for MemoryTopicStore {
    fn topic(&self) -> Option<Topic> {
        self.inner.read().topic.clone()
    }

    fn set_topic(&self, topic: Topic) {
        self.inner.write().topic = Some(topic);
    }

    fn keywords(&self) -> Vec<String> {
        self.inner.read().keywords.clone()
    }

    fn set_keywords(&self, keywords: Vec<String>) {
        self.inner.write().keywords = keywords;
    }
}
