//! Topic classification over a batch of sentences.
//!
//! The model is asked for the indices of the sentences that discuss the topic.
//! Anything other than an array of in-range integer indices rejects the whole
//! batch, and [`Classifier::classify`] turns every failure into "hide nothing".

use crate::session::SessionManager;
use hush_core::{ClassificationResult, HushError, Result, SentenceContext, Topic};
use hush_parser::normalize_whitespace;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::Arc;

/// Per-sentence prompt framing, with room for a four-digit index.
const SENTENCE_FRAMING: usize = "\nSentence 0000:\nText: \nContext: \n".len();

pub struct Classifier {
    sessions: Arc<SessionManager>,
}

impl Classifier {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn build_prompt(topic: &Topic, sentences: &[SentenceContext]) -> String {
        let mut prompt = format!(
            "You decide which sentences of a web page discuss the topic \"{topic}\".\n\
             Judge each sentence by its own text. Use its context only to disambiguate.\n\
             Return a JSON array holding the indices of the sentences that discuss the topic, \
             or [] if none do.\n"
        );
        for (i, sentence) in sentences.iter().enumerate() {
            let _ = write!(
                prompt,
                "\nSentence {i}:\nText: {}\nContext: {}\n",
                normalize_whitespace(sentence.text()),
                sentence.context
            );
        }
        prompt
    }

    /// Bytes `sentence` adds to a prompt: its text, its context and the
    /// framing. The fixed header is not included.
    pub fn prompt_cost(sentence: &SentenceContext) -> usize {
        SENTENCE_FRAMING + sentence.text().len() + sentence.context.len()
    }

    /// Output schema for a batch of `len` sentences.
    pub fn response_schema(len: usize) -> Value {
        json!({
            "type": "array",
            "items": {
                "type": "integer",
                "minimum": 0,
                "maximum": len.saturating_sub(1),
            },
            "uniqueItems": true,
            "description": "Indices of sentences that discuss the topic.",
        })
    }

    /// Validate a reply against the index-array shape.
    pub fn parse_response(value: &Value, len: usize) -> Result<ClassificationResult> {
        let entries = value
            .as_array()
            .ok_or_else(|| HushError::MalformedResponse(format!("expected an array, got {value}")))?;

        let mut indices = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.as_u64() {
                Some(i) if (i as usize) < len => indices.push(i as usize),
                _ => {
                    return Err(HushError::MalformedResponse(format!(
                        "invalid sentence index {entry} for {len} sentences"
                    )))
                }
            }
        }
        Ok(ClassificationResult::from_indices(len, indices))
    }

    pub async fn try_classify(
        &self,
        topic: &Topic,
        sentences: &[SentenceContext],
    ) -> Result<ClassificationResult> {
        if sentences.is_empty() {
            return Err(HushError::EmptyInput);
        }
        let prompt = Self::build_prompt(topic, sentences);
        let schema = Self::response_schema(sentences.len());
        let reply = self.sessions.run_prompt(&prompt, &schema).await?;
        let result = Self::parse_response(&reply, sentences.len())?;
        tracing::debug!(
            topic = %topic,
            sentences = sentences.len(),
            hidden = result.hidden_count(),
            "classified batch"
        );
        Ok(result)
    }

    /// Classify, hiding nothing on any failure.
    pub async fn classify(&self, topic: &Topic, sentences: &[SentenceContext]) -> ClassificationResult {
        match self.try_classify(topic, sentences).await {
            Ok(result) => result,
            Err(HushError::EmptyInput) => ClassificationResult::none(0),
            Err(e) => {
                tracing::warn!(error = %e, sentences = sentences.len(), "classification failed, leaving batch visible");
                ClassificationResult::none(sentences.len())
            }
        }
    }
}
