//! The page-side hide pipeline.
//!
//! A hide operation collects visible text nodes, cuts each into raw sentence
//! spans, batches sentences under the character budget and classifies one
//! batch at a time. A node is redacted as soon as all of its sentences have a
//! decision, in document order. A failed batch hides nothing. Cancellation is
//! checked before each batch, after each model call and before each node.

use crate::messages::{BackgroundMessage, ContentMessage, ContentResponse, PageState};
use crate::tracker::{OperationTracker, Ticket};
use hush_core::{ClassificationResult, HideConfig, HideState, Result, SentenceContext, Topic};
use hush_dom::{
    collect_text_nodes, has_hidden_content, overlay_present, remove_overlay, restore_all, show_overlay,
    Document, NodeId, OverlayAction, OverlayKind, RedactOutcome, Redactor, RestoreReport,
};
use hush_model::{Classifier, LanguageModel, SessionManager, TopicStore};
use hush_parser::{batch_by_budget, SentenceSegmenter, TextChunker};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::sync::Arc;

/// Summary of one hide operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HideReport {
    pub nodes: usize,
    pub sentences: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub redacted_nodes: usize,
    pub markers: usize,
    pub cancelled: bool,
}

struct NodePlan {
    node: NodeId,
    sentences: Vec<SentenceContext>,
}

pub struct PageController {
    document: Mutex<Document>,
    config: HideConfig,
    segmenter: SentenceSegmenter,
    chunker: TextChunker,
    redactor: Redactor,
    classifier: Classifier,
    tracker: OperationTracker,
    store: Arc<dyn TopicStore>,
}

impl PageController {
    pub fn new(
        document: Document,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn TopicStore>,
        config: HideConfig,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(model, config.prompt_timeout()));
        Self {
            document: Mutex::new(document),
            segmenter: SentenceSegmenter::from_config(&config),
            chunker: TextChunker::from_config(&config),
            redactor: Redactor::from_config(&config),
            classifier: Classifier::new(sessions),
            tracker: OperationTracker::new(),
            store,
            config,
        }
    }

    pub fn config(&self) -> &HideConfig {
        &self.config
    }

    /// Lock the document. Do not hold across an await.
    pub fn document(&self) -> MutexGuard<'_, Document> {
        self.document.lock()
    }

    pub fn state(&self) -> HideState {
        self.tracker.state()
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        self.classifier.sessions()
    }

    /// Hide every sentence under `<body>` that discusses `raw_topic`.
    pub async fn hide_topic(&self, raw_topic: &str) -> Result<HideReport> {
        let topic = Topic::parse(raw_topic)?;
        let ticket = self.tracker.begin();
        tracing::info!(topic = %topic, "hide started");

        let report = self.run_hide(&topic, ticket).await;

        if self.tracker.finish(ticket) {
            if !report.cancelled {
                let mut doc = self.document.lock();
                remove_overlay(&mut doc, &self.config);
            }
            self.sessions().teardown().await;
        }
        tracing::info!(
            topic = %topic,
            sentences = report.sentences,
            batches = report.batches,
            failed = report.failed_batches,
            markers = report.markers,
            cancelled = report.cancelled,
            "hide finished"
        );
        Ok(report)
    }

    async fn run_hide(&self, topic: &Topic, ticket: Ticket) -> HideReport {
        let mut report = HideReport::default();

        let plans = {
            let mut doc = self.document.lock();
            let body = doc.body();
            let nodes = collect_text_nodes(&doc, body, &self.config);
            report.nodes = nodes.len();
            if nodes.is_empty() {
                tracing::warn!("no text nodes to classify");
                return report;
            }
            show_overlay(&mut doc, &self.config, OverlayKind::Hiding);
            self.plan_nodes(&doc, nodes)
        };

        // Sentences of all nodes in document order, as (plan, sentence).
        let mut flat: Vec<(usize, usize)> = Vec::new();
        let mut plan_end: Vec<usize> = Vec::with_capacity(plans.len());
        for (p, plan) in plans.iter().enumerate() {
            flat.extend((0..plan.sentences.len()).map(|s| (p, s)));
            plan_end.push(flat.len());
        }
        report.sentences = flat.len();

        let batches = batch_by_budget(
            &flat,
            |&(p, s)| Classifier::prompt_cost(&plans[p].sentences[s]),
            self.config.max_chunk_chars,
        );

        let mut decided = ClassificationResult::default();
        let mut next_plan = 0;

        'batches: for range in batches {
            if !self.tracker.advance(ticket, HideState::Classifying) {
                report.cancelled = true;
                break;
            }
            let batch: Vec<SentenceContext> =
                flat[range.clone()].iter().map(|&(p, s)| plans[p].sentences[s].clone()).collect();
            report.batches += 1;

            let result = match self.classifier.try_classify(topic, &batch).await {
                Ok(result) => result,
                Err(e) => {
                    if e.is_fail_open() {
                        tracing::warn!(error = %e, batch = report.batches, "batch left visible");
                    } else {
                        tracing::error!(error = %e, batch = report.batches, "unexpected classifier error, batch left visible");
                    }
                    report.failed_batches += 1;
                    ClassificationResult::none(batch.len())
                }
            };
            decided.extend(result);

            if !self.tracker.advance(ticket, HideState::Redacting) {
                report.cancelled = true;
                break;
            }

            {
                let mut doc = self.document.lock();
                while next_plan < plans.len() && plan_end[next_plan] <= range.end {
                    if self.tracker.is_cancelled(ticket) {
                        report.cancelled = true;
                        break 'batches;
                    }
                    let plan = &plans[next_plan];
                    let offset = plan_end[next_plan] - plan.sentences.len();
                    let outcome =
                        self.redactor.redact(&mut doc, plan.node, &plan.sentences, |i| decided.is_hidden(offset + i));
                    match outcome {
                        Ok(RedactOutcome::Redacted { markers, .. }) => {
                            report.redacted_nodes += 1;
                            report.markers += markers;
                        }
                        Ok(RedactOutcome::Detached) => {
                            tracing::debug!(node = ?plan.node, "node left the document before redaction");
                        }
                        Ok(RedactOutcome::Unchanged) => {}
                        Err(e) => tracing::warn!(error = %e, node = ?plan.node, "redaction failed, node left visible"),
                    }
                    next_plan += 1;
                }
            }
        }

        report
    }

    fn plan_nodes(&self, doc: &Document, nodes: Vec<NodeId>) -> Vec<NodePlan> {
        nodes
            .into_iter()
            .filter_map(|node| {
                let text = doc.text(node)?;
                let sentences = self.segmenter.segment_raw_chunked(text, &self.chunker);
                (!sentences.is_empty()).then_some(NodePlan { node, sentences })
            })
            .collect()
    }

    /// Cancel any running hide and restore all hidden content.
    pub fn undo(&self) -> RestoreReport {
        if self.tracker.cancel() {
            tracing::info!("running hide cancelled by undo");
        }
        self.sessions().discard();

        let mut doc = self.document.lock();
        remove_overlay(&mut doc, &self.config);
        let body = doc.body();
        let report = restore_all(&mut doc, body, &self.config);
        // A hide that began after the cancel may already hold node ids.
        if !self.tracker.state().is_active() {
            let freed = doc.compact();
            tracing::debug!(freed, remaining = doc.len(), "document compacted");
        }
        tracing::info!(restored = report.restored, skipped = report.skipped, "undo finished");
        report
    }

    pub fn query_state(&self) -> PageState {
        let doc = self.document.lock();
        PageState {
            has_hidden_content: has_hidden_content(&doc, doc.body(), &self.config),
            overlay_present: overlay_present(&doc, &self.config),
        }
    }

    /// Show the keyword overlay. Returns the stored topic to hide when
    /// auto-hide is on.
    pub fn keywords_detected(&self, keywords: &[String]) -> Option<Topic> {
        tracing::info!(keywords = ?keywords, "keywords detected");
        {
            let mut doc = self.document.lock();
            show_overlay(&mut doc, &self.config, OverlayKind::KeywordsDetected);
        }
        if !self.config.auto_hide_on_keywords {
            return None;
        }
        let topic = self.store.topic();
        if topic.is_none() {
            tracing::debug!("auto-hide is on but no topic is stored");
        }
        topic
    }

    /// Run an overlay button. Returns the message to forward to the
    /// background, if any.
    pub fn overlay_action(self: &Arc<Self>, action: OverlayAction) -> Option<BackgroundMessage> {
        tracing::info!(action = action.as_str(), "overlay button pressed");
        match action {
            OverlayAction::Hide => {
                match self.store.topic() {
                    Some(topic) => self.spawn_hide(topic.to_string()),
                    None => tracing::warn!("no stored topic to hide"),
                }
                None
            }
            OverlayAction::Reveal => {
                self.undo();
                None
            }
            OverlayAction::CloseTab => {
                self.undo();
                Some(BackgroundMessage::CloseTab)
            }
        }
    }

    /// Dispatch one message. Hides run in the background; the reply is sent
    /// as soon as the hide starts.
    pub fn handle(self: &Arc<Self>, message: ContentMessage) -> Option<ContentResponse> {
        match message {
            ContentMessage::HideTopic { topic } => {
                if let Err(e) = Topic::parse(&topic) {
                    tracing::warn!(error = %e, "ignoring hide request");
                    return Some(ContentResponse::Ack { success: false });
                }
                self.spawn_hide(topic);
                Some(ContentResponse::ok())
            }
            ContentMessage::Undo => {
                self.undo();
                Some(ContentResponse::ok())
            }
            ContentMessage::KeywordsDetected { keywords } => {
                if let Some(topic) = self.keywords_detected(&keywords) {
                    self.spawn_hide(topic.to_string());
                }
                None
            }
            ContentMessage::QueryState => Some(ContentResponse::State(self.query_state())),
        }
    }

    /// [`Self::handle`] over JSON. Unknown messages get no reply.
    pub fn handle_json(self: &Arc<Self>, raw: &str) -> Option<String> {
        let message = match ContentMessage::from_json(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "unknown message");
                return None;
            }
        };
        let response = self.handle(message)?;
        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::warn!(error = %e, "could not encode reply");
                None
            }
        }
    }

    fn spawn_hide(self: &Arc<Self>, topic: String) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.hide_topic(&topic).await {
                tracing::warn!(error = %e, "hide failed");
            }
        });
    }
}
