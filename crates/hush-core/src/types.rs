use crate::error::{HushError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A slice of a source string, by byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self { text: text.into(), start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A sentence plus the text of its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceContext {
    #[serde(flatten)]
    pub span: TextSpan,
    pub context: String,
}

impl SentenceContext {
    pub fn text(&self) -> &str {
        &self.span.text
    }
}

/// A bounded slice of a larger text submitted to the model in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub text: String,
    pub start_index: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, start_index: usize) -> Self {
        Self { text: text.into(), start_index }
    }

    pub fn end_index(&self) -> usize {
        self.start_index + self.text.len()
    }
}

/// Per-sentence "discusses topic" decisions.
///
/// Indices not present are not hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    hidden: BTreeSet<usize>,
    len: usize,
}

impl ClassificationResult {
    /// Nothing matches.
    pub fn none(len: usize) -> Self {
        Self { hidden: BTreeSet::new(), len }
    }

    /// Build from indices; anything outside `0..len` is dropped.
    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let hidden = indices.into_iter().filter(|&i| i < len).collect();
        Self { hidden, len }
    }

    pub fn from_flags(flags: &[bool]) -> Self {
        Self::from_indices(
            flags.len(),
            flags.iter().enumerate().filter(|(_, &f)| f).map(|(i, _)| i),
        )
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden.contains(&index)
    }

    pub fn hidden_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.hidden.iter().copied()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append another result whose indices start at `self.len()`.
    pub fn extend(&mut self, other: ClassificationResult) {
        let offset = self.len;
        self.hidden.extend(other.hidden.into_iter().map(|i| i + offset));
        self.len += other.len;
    }
}

/// A trimmed, non-empty topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HushError::InvalidTopic(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = HushError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phase of a hide operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HideState {
    #[default]
    Idle,
    Collecting,
    Classifying,
    Redacting,
    Cancelled,
}

impl HideState {
    /// Whether a hide operation is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Collecting | Self::Classifying | Self::Redacting)
    }

    /// Allowed transitions of the hide state machine.
    pub fn can_transition_to(&self, next: HideState) -> bool {
        use HideState::*;
        matches!(
            (self, next),
            (Idle, Collecting)
                | (Cancelled, Collecting)
                | (Collecting, Classifying)
                | (Collecting, Idle)
                | (Classifying, Redacting)
                | (Classifying, Idle)
                | (Redacting, Classifying)
                | (Redacting, Idle)
                | (Collecting, Cancelled)
                | (Classifying, Cancelled)
                | (Redacting, Cancelled)
                | (Cancelled, Idle)
        )
    }
}

impl fmt::Display for HideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HideState::Idle => write!(f, "idle"),
            HideState::Collecting => write!(f, "collecting"),
            HideState::Classifying => write!(f, "classifying"),
            HideState::Redacting => write!(f, "redacting"),
            HideState::Cancelled => write!(f, "cancelled"),
        }
    }
}
