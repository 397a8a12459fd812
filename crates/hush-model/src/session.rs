//! Single-slot session manager.
//!
//! At most one session exists at a time and at most one prompt runs on it:
//! the slot is a `tokio::sync::Mutex`, so concurrent callers queue. Any
//! failure destroys the session; the next call creates a fresh one.

use crate::provider::{LanguageModel, ModelSession};
use hush_core::{HushError, Result};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type Slot = Option<Box<dyn ModelSession>>;

pub struct SessionManager {
    model: Arc<dyn LanguageModel>,
    slot: Mutex<Slot>,
    timeout: Option<Duration>,
    discard_requested: AtomicBool,
    created: AtomicUsize,
}

impl SessionManager {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Option<Duration>) -> Self {
        Self {
            model,
            slot: Mutex::new(None),
            timeout,
            discard_requested: AtomicBool::new(false),
            created: AtomicUsize::new(0),
        }
    }

    /// Run one prompt and parse the reply as JSON.
    pub async fn run_prompt(&self, prompt: &str, schema: &Value) -> Result<Value> {
        let availability = self.model.availability().await;
        if !availability.is_usable() {
            return Err(HushError::ServiceUnavailable(format!("model is {availability:?}")));
        }

        let mut slot = self.slot.lock().await;
        if self.discard_requested.swap(false, Ordering::SeqCst) {
            destroy(&mut slot);
        }
        let result = self.prompt_locked(&mut slot, prompt, schema).await;
        if result.is_err() || self.discard_requested.swap(false, Ordering::SeqCst) {
            destroy(&mut slot);
        }
        if let Err(e) = &result {
            tracing::warn!(error = %e, "model prompt failed, session discarded");
        }
        result
    }

    async fn prompt_locked(&self, slot: &mut Slot, prompt: &str, schema: &Value) -> Result<Value> {
        if slot.is_none() {
            let session = self
                .model
                .create_session()
                .await
                .map_err(|e| HushError::ServiceUnavailable(e.to_string()))?;
            self.created.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("created model session");
            *slot = Some(session);
        }
        let Some(session) = slot.as_ref() else {
            return Err(HushError::ServiceUnavailable("no session".into()));
        };

        let call = session.prompt(prompt, schema);
        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| HushError::Timeout(limit.as_millis() as u64))?,
            None => call.await,
        }
        .map_err(|e| HushError::ServiceCall(e.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| HushError::MalformedResponse(e.to_string()))
    }

    /// Destroy the session, waiting for an in-flight prompt to finish first.
    pub async fn teardown(&self) {
        let mut slot = self.slot.lock().await;
        self.discard_requested.store(false, Ordering::SeqCst);
        destroy(&mut slot);
    }

    /// Destroy the session without waiting. If a prompt is in flight the
    /// session is destroyed as soon as it returns.
    pub fn discard(&self) {
        match self.slot.try_lock() {
            Ok(mut slot) => destroy(&mut slot),
            Err(_) => self.discard_requested.store(true, Ordering::SeqCst),
        }
    }

    /// Whether a session is currently held. `false` while a prompt runs.
    pub fn has_session(&self) -> bool {
        self.slot.try_lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Sessions created so far.
    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

fn destroy(slot: &mut Slot) {
    if let Some(mut session) = slot.take() {
        session.destroy();
        tracing::debug!("destroyed model session");
    }
}
