use renderd::core::ErrorKind;
use renderd::handler::{self, RenderRequest};
use renderd::pipeline::RenderPipeline;
use renderd::storage::{LocalObjectStore, StoredObject, TemplateFetcher};
use renderd::templating::RendererCache;
use renderd::test_utils::{InMemoryObjectStore, RecordingValidator, init_test_logging};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{PROFILE_TEMPLATE, TemplateRoot};

fn in_memory_pipeline(store: InMemoryObjectStore) -> RenderPipeline<InMemoryObjectStore> {
    let fetcher = TemplateFetcher::new(store, 1024 * 1024, Duration::from_secs(2));
    RenderPipeline::new(fetcher, Arc::new(RendererCache::new(Duration::from_secs(300))))
}

/// Successful render from an on-disk store
#[tokio::test]
async fn test_renders_profile_from_local_store() {
    init_test_logging(None);
    let root = TemplateRoot::new().unwrap();
    root.write_object("template/test.hbs", PROFILE_TEMPLATE).unwrap();

    let fetcher =
        TemplateFetcher::new(LocalObjectStore::new(root.store_path()), 1024, Duration::from_secs(2));
    let pipeline =
        RenderPipeline::new(fetcher, Arc::new(RendererCache::new(Duration::from_secs(300))));

    let request = RenderRequest::new("template/test.hbs")
        .with_variables(json!({"title": "Hello", "user": {"name": "John", "role": "Admin"}}));
    let response = handler::handle_render_request(&pipeline, request).await.unwrap();

    assert!(response.html.contains("<h1>Hello</h1><p>John (Admin)</p>"));
    assert!(response.html.starts_with("<!DOCTYPE html>"));
    assert!(response.html.contains("<head></head>"));
}

/// A cached renderer is reused without consulting storage
#[tokio::test]
async fn test_cached_renderer_skips_storage() {
    let store = InMemoryObjectStore::new().with_text("template/test.hbs", PROFILE_TEMPLATE);
    let pipeline = in_memory_pipeline(store.clone());
    let vars = json!({"title": "Hello", "user": {"name": "John", "role": "Admin"}});

    let first = pipeline.render("template/test.hbs", &vars).await.unwrap();

    // A changed object is not seen until the entry expires
    store.insert("template/test.hbs", StoredObject::from_body("<p>changed</p>"));
    let second = pipeline.render("template/test.hbs", &vars).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.call_count(), 1);
    assert_eq!(store.requested_keys(), vec!["template/test.hbs".to_string()]);
}

/// A malformed key is rejected before storage is touched
#[tokio::test]
async fn test_invalid_key_never_reaches_storage() {
    let store = InMemoryObjectStore::new();
    let pipeline = in_memory_pipeline(store.clone());

    let err = handler::handle_render_request(&pipeline, RenderRequest::new("template/test.txt"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(store.call_count(), 0);
    assert!(pipeline.cache().is_empty());
}

/// The validator receives the document exactly as fetched
#[tokio::test]
async fn test_unsafe_document_reaches_validator_unmodified() {
    let raw = "<script>alert(1)</script>";
    let store = InMemoryObjectStore::new().with_text("template/unsafe.hbs", raw);
    let validator = Arc::new(RecordingValidator::new());
    let pipeline = in_memory_pipeline(store).with_validator(validator.clone());

    let err = pipeline.render("template/unsafe.hbs", &json!({})).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsafeContent);
    assert_eq!(validator.inputs(), vec![raw.to_string()]);
    assert!(pipeline.cache().is_empty());
}

#[tokio::test]
async fn test_missing_variables_render_empty() {
    let store = InMemoryObjectStore::new().with_text("template/test.hbs", PROFILE_TEMPLATE);
    let pipeline = in_memory_pipeline(store);

    let html = pipeline.render("template/test.hbs", &json!({})).await.unwrap();
    assert!(html.contains("<h1></h1><p> ()</p>"));
}

#[tokio::test]
async fn test_variables_are_escaped() {
    let store = InMemoryObjectStore::new().with_text("template/test.hbs", "<p>{{ comment }}</p>");
    let pipeline = in_memory_pipeline(store);

    let html = pipeline
        .render("template/test.hbs", &json!({"comment": "<script>alert(1)</script>"}))
        .await
        .unwrap();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_concurrent_renders_share_pipeline() {
    let store = InMemoryObjectStore::new()
        .with_text("template/a.hbs", "<p>{{ n }}</p>")
        .with_delay(Duration::from_millis(10));
    let pipeline = Arc::new(in_memory_pipeline(store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.render("template/a.hbs", &json!({"n": n})).await })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let html = handle.await.unwrap().unwrap();
        assert!(html.contains(&format!("<p>{n}</p>")));
    }

    // Concurrent misses may each fetch, but never more than once per request
    assert!((1..=8).contains(&store.call_count()));
    assert_eq!(pipeline.cache().len(), 1);
}

#[tokio::test]
async fn test_missing_template_is_unavailable() {
    let root = TemplateRoot::new().unwrap();
    let fetcher =
        TemplateFetcher::new(LocalObjectStore::new(root.store_path()), 1024, Duration::from_secs(2));
    let pipeline = RenderPipeline::new(fetcher, Arc::new(RendererCache::new(Duration::ZERO)));

    let err = pipeline.render("template/missing.hbs", &json!({})).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TemplateUnavailable);
    assert_eq!(err.to_string(), "Template not found or inaccessible: template/missing.hbs");
}
