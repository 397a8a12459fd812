use crate::session::SessionManager;
use hush_core::Topic;
use serde_json::{json, Value};

pub fn keyword_prompt(topic: &Topic) -> String {
    format!(
        "List short keywords and phrases that a web page title or address would contain \
         if the page discussed \"{topic}\". Include the topic itself, common synonyms and \
         closely related names. Return a JSON object with a \"keywords\" array."
    )
}

pub fn keyword_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "keywords": {
                "type": "array",
                "items": { "type": "string" },
            },
        },
        "required": ["keywords"],
    })
}

/// Ask the model for keywords related to `topic`. Empty on any failure.
pub async fn extract_keywords(sessions: &SessionManager, topic: &Topic) -> Vec<String> {
    let reply = match sessions.run_prompt(&keyword_prompt(topic), &keyword_schema()).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, topic = %topic, "keyword extraction failed");
            return Vec::new();
        }
    };

    let Some(entries) = reply.get("keywords").and_then(Value::as_array) else {
        tracing::warn!(topic = %topic, "keyword reply has no keywords array");
        return Vec::new();
    };

    let mut keywords: Vec<String> = Vec::new();
    for keyword in entries.iter().filter_map(Value::as_str).map(str::trim) {
        if !keyword.is_empty() && !keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            keywords.push(keyword.to_string());
        }
    }
    tracing::info!(topic = %topic, count = keywords.len(), "extracted keywords");
    keywords
}

/// Keywords found in a tab's title or URL, case-insensitively.
pub fn check_keywords(keywords: &[String], title: &str, url: &str) -> Vec<String> {
    let title = title.to_lowercase();
    let url = url.to_lowercase();
    keywords
        .iter()
        .filter(|k| {
            let needle = k.trim().to_lowercase();
            !needle.is_empty() && (title.contains(&needle) || url.contains(&needle))
        })
        .cloned()
        .collect()
}
