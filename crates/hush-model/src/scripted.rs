//! A deterministic in-process model for tests and offline runs.

use crate::provider::{Availability, LanguageModel, ModelSession};
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub enum Reply {
    /// Raw JSON text returned as the model output.
    Json(String),
    /// The call throws.
    Fail(String),
    /// The call never completes.
    Hang,
}

type Responder = Box<dyn Fn(&str, &Value) -> Reply + Send + Sync>;

struct Shared {
    availability: Mutex<Availability>,
    queue: Mutex<VecDeque<Reply>>,
    responder: Responder,
    prompts: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    fail_create: AtomicBool,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

/// Queued replies are served first; after that the responder answers.
#[derive(Clone)]
pub struct ScriptedModel {
    shared: Arc<Shared>,
}

impl ScriptedModel {
    pub fn new(responder: impl Fn(&str, &Value) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                availability: Mutex::new(Availability::Available),
                queue: Mutex::new(VecDeque::new()),
                responder: Box::new(responder),
                prompts: Mutex::new(Vec::new()),
                gate: Mutex::new(None),
                fail_create: AtomicBool::new(false),
                created: AtomicUsize::new(0),
                destroyed: AtomicUsize::new(0),
            }),
        }
    }

    /// Always reply with the same outcome.
    pub fn always(reply: Reply) -> Self {
        Self::new(move |_, _| reply.clone())
    }

    /// Flags every sentence whose text mentions `word`, and answers keyword
    /// prompts with `word` itself.
    pub fn matching(word: &str) -> Self {
        let word = word.to_lowercase();
        Self::new(move |prompt, schema| {
            if schema.get("type").and_then(Value::as_str) == Some("object") {
                return Reply::Json(json!({ "keywords": [word] }).to_string());
            }
            let mut current = None;
            let mut hits = Vec::new();
            for line in prompt.lines() {
                if let Some(rest) = line.strip_prefix("Sentence ") {
                    current = rest.trim_end_matches(':').parse::<usize>().ok();
                } else if let Some(text) = line.strip_prefix("Text: ") {
                    if let Some(i) = current {
                        if text.to_lowercase().contains(&word) {
                            hits.push(i);
                        }
                    }
                }
            }
            Reply::Json(json!(hits).to_string())
        })
    }

    pub fn push_reply(&self, reply: Reply) {
        self.shared.queue.lock().push_back(reply);
    }

    pub fn set_availability(&self, availability: Availability) {
        *self.shared.availability.lock() = availability;
    }

    pub fn fail_session_creation(&self, fail: bool) {
        self.shared.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Hold every prompt until the returned handle is notified.
    pub fn gate(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.shared.gate.lock() = Some(Arc::clone(&notify));
        notify
    }

    pub fn prompts(&self) -> Vec<String> {
        self.shared.prompts.lock().clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.shared.prompts.lock().len()
    }

    pub fn sessions_created(&self) -> usize {
        self.shared.created.load(Ordering::SeqCst)
    }

    pub fn sessions_destroyed(&self) -> usize {
        self.shared.destroyed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn availability(&self) -> Availability {
        *self.shared.availability.lock()
    }

    async fn create_session(&self) -> anyhow::Result<Box<dyn ModelSession>> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow!("session creation refused"));
        }
        self.shared.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession { shared: Arc::clone(&self.shared), destroyed: false }))
    }
}

struct ScriptedSession {
    shared: Arc<Shared>,
    destroyed: bool,
}

#[async_trait]
impl ModelSession for ScriptedSession {
    async fn prompt(&self, prompt: &str, schema: &Value) -> anyhow::Result<String> {
        if self.destroyed {
            return Err(anyhow!("session destroyed"));
        }
        self.shared.prompts.lock().push(prompt.to_string());

        let gate = self.shared.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let queued = self.shared.queue.lock().pop_front();
        let reply = match queued {
            Some(reply) => reply,
            None => (self.shared.responder)(prompt, schema),
        };
        match reply {
            Reply::Json(text) => Ok(text),
            Reply::Fail(message) => Err(anyhow!(message)),
            Reply::Hang => std::future::pending().await,
        }
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.shared.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
