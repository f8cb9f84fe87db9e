use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use renderd::pipeline::RenderPipeline;
use renderd::server::router;
use renderd::storage::{StoredObject, TemplateFetcher};
use renderd::templating::RendererCache;
use renderd::test_utils::InMemoryObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::common::PROFILE_TEMPLATE;

fn app(store: InMemoryObjectStore) -> axum::Router {
    let fetcher = TemplateFetcher::new(store, 1024, Duration::from_secs(1));
    let pipeline =
        RenderPipeline::new(fetcher, Arc::new(RendererCache::new(Duration::from_secs(60))));
    router(Arc::new(pipeline))
}

fn profile_store() -> InMemoryObjectStore {
    InMemoryObjectStore::new().with_text("template/test.hbs", PROFILE_TEMPLATE)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_render(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/render")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_post_render_returns_html_with_security_headers() {
    let response = app(profile_store())
        .oneshot(post_render(
            r#"{"templateKey":"template/test.hbs","variables":{"title":"Hello","user":{"name":"John","role":"Admin"}}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/html");
    assert_eq!(headers[header::CONTENT_SECURITY_POLICY], "default-src 'self'");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(body_text(response).await.contains("<h1>Hello</h1><p>John (Admin)</p>"));
}

#[tokio::test]
async fn test_post_render_with_bad_key_is_400() {
    let store = profile_store();
    let response =
        app(store.clone()).oneshot(post_render(r#"{"templateKey":"template/test.txt"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Invalid input format");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_post_render_with_garbage_body_is_400() {
    let response = app(profile_store()).oneshot(post_render("not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsafe_template_is_500() {
    let store =
        InMemoryObjectStore::new().with_text("template/xss.hbs", "<script>alert(1)</script>");
    let response =
        app(store).oneshot(post_render(r#"{"templateKey":"template/xss.hbs"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["details"], "Template contains unsafe script tags");
}

#[tokio::test]
async fn test_get_render_with_query_variables() {
    let request = Request::builder()
        .uri("/render?templateKey=template/test.hbs&variables=%7B%22title%22%3A%22Hi%22%7D")
        .body(Body::empty())
        .unwrap();
    let response = app(profile_store()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<h1>Hi</h1>"));
}

#[tokio::test]
async fn test_get_render_without_key_is_400() {
    let request = Request::builder().uri("/render").body(Body::empty()).unwrap();
    let response = app(profile_store()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_favicon_is_empty() {
    let request = Request::builder().uri("/favicon.ico").body(Body::empty()).unwrap();
    let response = app(InMemoryObjectStore::new()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/x-icon");
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_assets_pass_through_untouched() {
    let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"><script>ok()</script></svg>";
    let store = InMemoryObjectStore::new().with_object(
        "assets/img/logo.svg",
        StoredObject::from_body(svg.to_string()).with_content_type("image/svg+xml"),
    );
    let request = Request::builder().uri("/assets/img/logo.svg").body(Body::empty()).unwrap();
    let response = app(store.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(body_text(response).await, svg);
    assert_eq!(store.requested_keys(), vec!["assets/img/logo.svg".to_string()]);
}

#[tokio::test]
async fn test_missing_asset_is_500() {
    let request = Request::builder().uri("/assets/none.css").body(Body::empty()).unwrap();
    let response = app(InMemoryObjectStore::new()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_asset_paths_cannot_leave_assets_prefix() {
    let store = InMemoryObjectStore::new()
        .with_text("private-bucket/secret.txt", "secret")
        .with_text("assets/../../private-bucket/secret.txt", "secret");

    for uri in [
        "/assets/..%2F..%2Fprivate-bucket%2Fsecret.txt",
        "/assets/../../private-bucket/secret.txt",
        "/assets/css/..%5C..%5Csecret.txt",
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app(store.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Invalid input format", "{uri}");
    }
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(InMemoryObjectStore::new()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}
