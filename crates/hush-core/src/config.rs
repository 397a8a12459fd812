use crate::error::{HushError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which sentence boundary rules to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmenterKind {
    /// Unicode sentence boundaries (UAX #29).
    #[default]
    Unicode,
    /// Terminator regex: runs of text ending in `.`, `!` or `?`.
    Regex,
}

/// How a hidden sentence is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "char")]
pub enum MarkerStyle {
    /// Keep the text; the marker class paints it out.
    #[default]
    Blackout,
    /// Replace every non-whitespace character with the given mask.
    Mask(char),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HideConfig {
    pub context_window: usize,
    /// Byte budget for the sentence blocks of one prompt (text, context and
    /// framing; the fixed header comes on top). Long nodes are also cut into
    /// chunks of this size before segmentation.
    pub max_chunk_chars: usize,
    pub chunk_lookahead: usize,
    pub segmenter: SegmenterKind,
    pub prompt_timeout_ms: Option<u64>,
    pub marker_class: String,
    pub original_attr: String,
    pub overlay_id: String,
    pub ignored_tags: Vec<String>,
    pub marker_style: MarkerStyle,
    /// Hide with the stored topic as soon as keywords are detected.
    pub auto_hide_on_keywords: bool,
}

impl HideConfig {
    /// Parse a (possibly partial) JSON config over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_chars == 0 {
            return Err(HushError::InvalidConfig("max_chunk_chars must be > 0".into()));
        }
        if self.marker_class.trim().is_empty() || self.original_attr.trim().is_empty() {
            return Err(HushError::InvalidConfig("marker class and attribute must be named".into()));
        }
        Ok(())
    }

    pub fn prompt_timeout(&self) -> Option<Duration> {
        self.prompt_timeout_ms.map(Duration::from_millis)
    }

    /// Whether text under an element with this tag name is skipped.
    pub fn is_ignored_tag(&self, tag: &str) -> bool {
        self.ignored_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl Default for HideConfig {
    fn default() -> Self {
        Self {
            context_window: 1,
            max_chunk_chars: 4000,
            chunk_lookahead: 200,
            segmenter: SegmenterKind::Unicode,
            prompt_timeout_ms: Some(60_000),
            marker_class: "hide-extension-blackout".into(),
            original_attr: "hide-data-original".into(),
            overlay_id: "hide-overlay".into(),
            ignored_tags: ["script", "style", "noscript", "textarea", "input"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            marker_style: MarkerStyle::Blackout,
            auto_hide_on_keywords: false,
        }
    }
}
