//! End-to-end hide / undo scenarios against a scripted model.

use hush_core::{HideConfig, HideState, HushError};
use hush_dom::{overlay_actions, Document, OverlayAction};
use hush_model::{Availability, MemoryTopicStore, Reply, ScriptedModel, TopicStore};
use hush_pipeline::{Background, BackgroundMessage, ContentMessage, PageController};
use std::sync::Arc;

const PAGE: &str = "<html><body><h1>Weekend</h1>\
    <p>I love pasta. The weather is nice.</p>\
    <p>Pasta recipes are great!</p>\
    <script>var pasta = 1;</script></body></html>";

fn controller_with(html: &str, model: &ScriptedModel, config: HideConfig) -> Arc<PageController> {
    Arc::new(PageController::new(
        Document::parse_html(html),
        Arc::new(model.clone()),
        Arc::new(MemoryTopicStore::new()),
        config,
    ))
}

fn controller(html: &str, model: &ScriptedModel) -> Arc<PageController> {
    controller_with(html, model, HideConfig::default())
}

fn body_html(controller: &PageController) -> String {
    let doc = controller.document();
    doc.to_html(doc.body())
}

fn marker_texts(controller: &PageController) -> Vec<String> {
    let doc = controller.document();
    let class = &controller.config().marker_class;
    doc.elements_by_class(doc.body(), class)
        .into_iter()
        .filter_map(|m| doc.attribute(m, &controller.config().original_attr).map(str::to_string))
        .collect()
}

async fn wait_for_prompts(model: &ScriptedModel, n: usize) {
    while model.prompt_count() < n {
        tokio::task::yield_now().await;
    }
}

// ========== Hide / Undo ==========

#[tokio::test]
async fn test_hide_matching_sentences_and_undo() {
    let model = ScriptedModel::matching("pasta");
    let page = controller(PAGE, &model);
    let before = body_html(&page);

    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.nodes, 3);
    assert_eq!(report.sentences, 4);
    assert_eq!(report.batches, 1);
    assert_eq!(report.markers, 2);
    assert_eq!(report.redacted_nodes, 2);
    assert!(!report.cancelled);
    assert_eq!(marker_texts(&page), vec!["I love pasta.", "Pasta recipes are great!"]);

    let state = page.query_state();
    assert!(state.has_hidden_content);
    assert!(!state.overlay_present);
    assert_eq!(page.state(), HideState::Idle);
    assert!(body_html(&page).contains("var pasta = 1;"));
    assert!(body_html(&page).contains("The weather is nice."));

    let restored = page.undo();
    assert_eq!(restored.restored, 2);
    assert_eq!(body_html(&page), before);
    assert!(!page.query_state().has_hidden_content);

    assert_eq!(page.undo().restored, 0);
    assert_eq!(body_html(&page), before);
}

#[tokio::test]
async fn test_repeated_hide_undo_keeps_document_size() {
    let model = ScriptedModel::matching("pasta");
    let page = controller(PAGE, &model);
    let before = body_html(&page);
    let allocated = page.document().len();

    for _ in 0..5 {
        let report = page.hide_topic("cooking").await.unwrap();
        assert_eq!(report.markers, 2);
        assert!(page.document().len() > allocated);
        page.undo();
        assert_eq!(body_html(&page), before);

        let doc = page.document();
        assert_eq!(doc.len(), allocated);
        assert_eq!(doc.descendants(doc.root()).len() + 1, doc.len());
    }
}

#[tokio::test]
async fn test_raw_whitespace_survives_roundtrip() {
    let html = "<body><p>Pasta is\n  good.   Cats sleep all day.\n</p><p>Plain text</p></body>";
    let model = ScriptedModel::matching("pasta");
    let page = controller(html, &model);
    let before = body_html(&page);

    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.markers, 1);
    assert_eq!(marker_texts(&page), vec!["Pasta is\n  good."]);
    assert!(body_html(&page).contains("Cats sleep all day.\n"));

    page.undo();
    assert_eq!(body_html(&page), before);
}

#[tokio::test]
async fn test_whitespace_run_longer_than_budget_still_hides() {
    let html = format!("<body><p>Pasta is good.{}More pasta here.</p></body>", " ".repeat(300));
    let model = ScriptedModel::matching("pasta");
    let config = HideConfig { max_chunk_chars: 100, ..HideConfig::default() };
    let page = controller_with(&html, &model, config);
    let before = body_html(&page);

    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.sentences, 2);
    assert_eq!(report.failed_batches, 0);
    assert_eq!(report.redacted_nodes, 1);
    assert_eq!(report.markers, 2);
    assert_eq!(marker_texts(&page), vec!["Pasta is good.", "More pasta here."]);

    page.undo();
    assert_eq!(body_html(&page), before);
}

#[tokio::test]
async fn test_small_budget_splits_into_batches() {
    let html = "<body><p>Pasta one. Soup two. Pasta three.</p><p>Bread four. Pasta five.</p></body>";
    let model = ScriptedModel::matching("pasta");
    let config = HideConfig { max_chunk_chars: 12, ..HideConfig::default() };
    let page = controller_with(html, &model, config);

    let report = page.hide_topic("cooking").await.unwrap();
    assert!(report.batches > 1);
    assert_eq!(model.prompt_count(), report.batches);
    assert_eq!(report.markers, 3);
    assert_eq!(marker_texts(&page), vec!["Pasta one.", "Pasta three.", "Pasta five."]);
    assert_eq!(model.sessions_created(), 1);
    assert_eq!(model.sessions_destroyed(), 1);
}

#[tokio::test]
async fn test_prompts_stay_within_budget() {
    let body: String = (0..40).map(|i| format!("<p>Pasta note {i}. Weather note {i}.</p>")).collect();
    let html = format!("<body>{body}</body>");
    let model = ScriptedModel::matching("pasta");
    let config = HideConfig { max_chunk_chars: 300, ..HideConfig::default() };
    let page = controller_with(&html, &model, config);

    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.markers, 40);
    assert!(report.batches > 1);

    let topic = hush_core::Topic::parse("cooking").unwrap();
    let header = hush_model::Classifier::build_prompt(&topic, &[]).len();
    for prompt in model.prompts() {
        assert!(prompt.len() <= header + 300, "prompt of {} bytes", prompt.len());
    }
}

#[tokio::test]
async fn test_invalid_topic_rejected() {
    let model = ScriptedModel::matching("pasta");
    let page = controller(PAGE, &model);
    let err = page.hide_topic("   ").await.unwrap_err();
    assert!(matches!(err, HushError::InvalidTopic(_)));
    assert_eq!(page.state(), HideState::Idle);
    assert_eq!(model.prompt_count(), 0);
}

#[tokio::test]
async fn test_page_without_text_skips_model() {
    let model = ScriptedModel::matching("pasta");
    let page = controller("<body><script>pasta()</script>  </body>", &model);
    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.nodes, 0);
    assert_eq!(report.batches, 0);
    assert_eq!(model.prompt_count(), 0);
    assert!(!page.query_state().overlay_present);
}

// ========== Fail Open ==========

#[tokio::test]
async fn test_service_failure_hides_nothing() {
    let model = ScriptedModel::always(Reply::Fail("model crashed".into()));
    let page = controller(PAGE, &model);
    let before = body_html(&page);

    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.markers, 0);
    assert_eq!(report.failed_batches, report.batches);
    assert_eq!(body_html(&page), before);
    assert_eq!(page.state(), HideState::Idle);
}

#[tokio::test]
async fn test_malformed_reply_hides_nothing() {
    for reply in ["{\"indices\":[0]}", "[0, 99]", "[\"0\"]", "definitely not json"] {
        let model = ScriptedModel::always(Reply::Json(reply.into()));
        let page = controller(PAGE, &model);
        let before = body_html(&page);
        let report = page.hide_topic("cooking").await.unwrap();
        assert_eq!(report.markers, 0, "{reply}");
        assert_eq!(body_html(&page), before, "{reply}");
    }
}

#[tokio::test]
async fn test_one_failed_batch_does_not_block_others() {
    let html = "<body><p>Pasta one.</p><p>Pasta two.</p></body>";
    let model = ScriptedModel::matching("pasta");
    model.push_reply(Reply::Fail("transient".into()));
    let config = HideConfig { max_chunk_chars: 10, ..HideConfig::default() };
    let page = controller_with(html, &model, config);

    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.batches, 2);
    assert_eq!(report.failed_batches, 1);
    assert_eq!(marker_texts(&page), vec!["Pasta two."]);
    assert_eq!(model.sessions_created(), 2);
}

#[tokio::test]
async fn test_unavailable_model_hides_nothing() {
    let model = ScriptedModel::matching("pasta");
    model.set_availability(Availability::Unavailable);
    let page = controller(PAGE, &model);
    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.markers, 0);
    assert_eq!(model.sessions_created(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hung_model_times_out() {
    let model = ScriptedModel::always(Reply::Hang);
    let config = HideConfig { prompt_timeout_ms: Some(1_000), ..HideConfig::default() };
    let page = controller_with(PAGE, &model, config);
    let before = body_html(&page);

    let report = page.hide_topic("cooking").await.unwrap();
    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.markers, 0);
    assert_eq!(body_html(&page), before);
}

// ========== Cancellation ==========

#[tokio::test]
async fn test_undo_while_classifying_discards_results() {
    let model = ScriptedModel::matching("pasta");
    let gate = model.gate();
    let page = controller(PAGE, &model);
    let before = body_html(&page);

    let task = tokio::spawn({
        let page = Arc::clone(&page);
        async move { page.hide_topic("cooking").await }
    });
    wait_for_prompts(&model, 1).await;
    assert_eq!(page.state(), HideState::Classifying);
    assert!(page.query_state().overlay_present);

    page.undo();
    assert_eq!(page.state(), HideState::Cancelled);
    assert!(!page.query_state().overlay_present);

    gate.notify_one();
    let report = task.await.unwrap().unwrap();
    assert!(report.cancelled);
    assert_eq!(report.markers, 0);
    assert_eq!(page.state(), HideState::Idle);
    assert_eq!(body_html(&page), before);
    assert_eq!(model.sessions_destroyed(), model.sessions_created());
}

#[tokio::test]
async fn test_new_hide_supersedes_running_one() {
    let model = ScriptedModel::matching("pasta");
    let gate = model.gate();
    let page = controller(PAGE, &model);

    let first = tokio::spawn({
        let page = Arc::clone(&page);
        async move { page.hide_topic("cooking").await }
    });
    wait_for_prompts(&model, 1).await;

    let second = tokio::spawn({
        let page = Arc::clone(&page);
        async move { page.hide_topic("food").await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(page.state(), HideState::Classifying);

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(first.cancelled);
    assert_eq!(first.markers, 0);

    wait_for_prompts(&model, 2).await;
    gate.notify_one();
    let second = second.await.unwrap().unwrap();
    assert!(!second.cancelled);
    assert_eq!(second.markers, 2);
    assert_eq!(page.state(), HideState::Idle);
    assert!(!page.query_state().overlay_present);
}

// ========== Messages ==========

#[tokio::test]
async fn test_handle_json_messages() {
    let model = ScriptedModel::matching("pasta");
    let page = controller(PAGE, &model);

    assert_eq!(
        page.handle_json(r#"{"action":"queryState"}"#).as_deref(),
        Some(r#"{"hasHiddenContent":false,"overlayPresent":false}"#)
    );
    assert_eq!(page.handle_json(r#"{"action":"selfDestruct"}"#), None);

    assert_eq!(
        page.handle_json(r#"{"action":"hideTopic","topic":"cooking"}"#).as_deref(),
        Some(r#"{"success":true}"#)
    );
    while !page.query_state().has_hidden_content || page.state() != HideState::Idle {
        tokio::task::yield_now().await;
    }
    assert_eq!(marker_texts(&page).len(), 2);

    assert_eq!(page.handle_json(r#"{"action":"undo"}"#).as_deref(), Some(r#"{"success":true}"#));
    assert!(!page.query_state().has_hidden_content);

    assert_eq!(
        page.handle_json(r#"{"action":"hideTopic","topic":""}"#).as_deref(),
        Some(r#"{"success":false}"#)
    );
}

#[tokio::test]
async fn test_keywords_detected_shows_overlay_only() {
    let model = ScriptedModel::matching("pasta");
    let page = controller(PAGE, &model);
    let reply = page.handle(ContentMessage::KeywordsDetected { keywords: vec!["pasta".into()] });
    assert!(reply.is_none());
    assert!(page.query_state().overlay_present);
    assert!(body_html(&page).contains("Hide Content"));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(model.prompt_count(), 0);
}

#[tokio::test]
async fn test_keywords_detected_auto_hides_with_stored_topic() {
    let model = ScriptedModel::matching("pasta");
    let store = Arc::new(MemoryTopicStore::new());
    store.set_topic(hush_core::Topic::parse("cooking").unwrap());
    let config = HideConfig { auto_hide_on_keywords: true, ..HideConfig::default() };
    let page = Arc::new(PageController::new(
        Document::parse_html(PAGE),
        Arc::new(model.clone()),
        store,
        config,
    ));

    page.handle(ContentMessage::KeywordsDetected { keywords: vec!["pasta".into()] });
    while !page.query_state().has_hidden_content || page.state() != HideState::Idle {
        tokio::task::yield_now().await;
    }
    assert_eq!(marker_texts(&page).len(), 2);
    assert!(!page.query_state().overlay_present);
}

#[tokio::test]
async fn test_overlay_reveal_restores_page() {
    let model = ScriptedModel::matching("pasta");
    let page = controller(PAGE, &model);
    let before = body_html(&page);
    page.hide_topic("cooking").await.unwrap();
    page.keywords_detected(&["pasta".to_string()]);
    let actions = overlay_actions(&page.document(), page.config());
    assert!(actions.contains(&OverlayAction::Reveal));

    assert_eq!(page.overlay_action(OverlayAction::Reveal), None);
    assert_eq!(body_html(&page), before);
    assert!(!page.query_state().overlay_present);
}

#[tokio::test]
async fn test_overlay_close_tab_restores_and_asks_background() {
    let model = ScriptedModel::matching("pasta");
    let page = controller(PAGE, &model);
    let before = body_html(&page);
    page.hide_topic("cooking").await.unwrap();
    page.keywords_detected(&["pasta".to_string()]);

    let forward = page.overlay_action(OverlayAction::CloseTab);
    assert_eq!(forward, Some(BackgroundMessage::CloseTab));
    assert_eq!(serde_json::to_string(&forward).unwrap(), r#"{"action":"closeTab"}"#);
    assert_eq!(body_html(&page), before);
    assert!(!page.query_state().overlay_present);
}

#[tokio::test]
async fn test_overlay_hide_uses_stored_topic() {
    let model = ScriptedModel::matching("pasta");
    let store = Arc::new(MemoryTopicStore::new());
    let page = Arc::new(PageController::new(
        Document::parse_html(PAGE),
        Arc::new(model.clone()),
        store.clone(),
        HideConfig::default(),
    ));
    page.keywords_detected(&["pasta".to_string()]);

    assert_eq!(page.overlay_action(OverlayAction::Hide), None);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(model.prompt_count(), 0);

    store.set_topic(hush_core::Topic::parse("cooking").unwrap());
    assert_eq!(page.overlay_action(OverlayAction::Hide), None);
    while !page.query_state().has_hidden_content || page.state() != HideState::Idle {
        tokio::task::yield_now().await;
    }
    assert_eq!(marker_texts(&page).len(), 2);
    assert!(!page.query_state().overlay_present);
}

#[tokio::test]
async fn test_overlay_text_is_never_classified() {
    let model = ScriptedModel::matching("close");
    let page = controller("<body><p>Nothing to see here.</p></body>", &model);
    page.keywords_detected(&["x".to_string()]);

    let report = page.hide_topic("doors").await.unwrap();
    assert_eq!(report.nodes, 1);
    assert_eq!(report.markers, 0);
    assert!(model.prompts().iter().all(|p| !p.contains("Close Tab")));
}

// ========== Background ==========

#[tokio::test]
async fn test_background_stores_topic_and_keywords() {
    let model = ScriptedModel::matching("pasta");
    let store = Arc::new(MemoryTopicStore::new());
    let background = Background::new(Arc::new(model.clone()), store.clone(), &HideConfig::default());

    let keywords = background.store_topic("  cooking ").await.unwrap();
    assert_eq!(keywords, vec!["pasta"]);
    assert_eq!(store.topic().unwrap().as_str(), "cooking");
    assert_eq!(store.keywords(), vec!["pasta"]);
    assert_eq!(model.sessions_destroyed(), 1);

    assert_eq!(
        background.on_tab_changed("Easy PASTA bakes", "https://example.com/recipes"),
        Some(ContentMessage::KeywordsDetected { keywords: vec!["pasta".into()] })
    );
    assert_eq!(background.on_tab_changed("Football scores", "https://example.com/sport"), None);
}

#[tokio::test]
async fn test_background_rejects_blank_topic() {
    let model = ScriptedModel::matching("pasta");
    let store = Arc::new(MemoryTopicStore::new());
    let background = Background::new(Arc::new(model.clone()), store.clone(), &HideConfig::default());
    assert!(matches!(background.store_topic(" ").await, Err(HushError::InvalidTopic(_))));
    assert!(store.topic().is_none());
    assert_eq!(model.prompt_count(), 0);
}

#[tokio::test]
async fn test_background_keeps_topic_when_keywords_fail() {
    let model = ScriptedModel::always(Reply::Fail("offline".into()));
    let store = Arc::new(MemoryTopicStore::new());
    let background = Background::new(Arc::new(model.clone()), store.clone(), &HideConfig::default());
    assert!(background.store_topic("cooking").await.unwrap().is_empty());
    assert_eq!(store.topic().unwrap().as_str(), "cooking");
    assert_eq!(background.on_tab_changed("cooking", "https://example.com"), None);
}
