//! Language-model side of the pipeline: the external service contract, a
//! serialized session manager, and the prompts built on top of it.

pub mod classifier;
pub mod keywords;
pub mod provider;
pub mod scripted;
pub mod session;
pub mod store;

pub use classifier::Classifier;
pub use keywords::{check_keywords, extract_keywords};
pub use provider::{Availability, LanguageModel, ModelSession};
pub use scripted::{Reply, ScriptedModel};
pub use session::SessionManager;
pub use store::{MemoryTopicStore, StoredTopic, TopicStore};
