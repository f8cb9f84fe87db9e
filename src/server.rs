//! HTTP surface for `renderd serve`.
//!
//! | Route | Behavior |
//! |---|---|
//! | `POST /render` | JSON [`RenderRequest`](crate::handler::RenderRequest) body |
//! | `GET /render?templateKey=..&variables=..` | same, with `variables` as JSON text |
//! | `GET /assets/{*path}` | raw object `assets/{path}`, no template processing; `400` for `..` segments |
//! | `GET /favicon.ico` | empty `204` |
//! | `GET /health` | `ok` |

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::handler::{self, AssetKey, HttpReply};
use crate::pipeline::RenderPipeline;
use crate::storage::ObjectStore;

impl IntoResponse for HttpReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) =
                (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value))
            {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderQuery {
    template_key: Option<String>,
    variables: Option<String>,
}

/// Build the router over a shared pipeline.
pub fn router<S>(pipeline: Arc<RenderPipeline<S>>) -> Router
where
    S: ObjectStore + 'static,
{
    Router::new()
        .route("/render", get(render_query::<S>).post(render_body::<S>))
        .route("/assets/{*path}", get(asset::<S>))
        .route("/favicon.ico", get(favicon))
        .route("/health", get(health))
        .with_state(pipeline)
}

/// Bind `addr` and serve until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve<S>(pipeline: Arc<RenderPipeline<S>>, addr: &str) -> Result<()>
where
    S: ObjectStore + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("renderd listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(pipeline)).await.context("HTTP server terminated")?;
    Ok(())
}

async fn render_body<S: ObjectStore + 'static>(
    State(pipeline): State<Arc<RenderPipeline<S>>>,
    body: String,
) -> HttpReply {
    handler::handle_json_body(&pipeline, &body).await
}

async fn render_query<S: ObjectStore + 'static>(
    State(pipeline): State<Arc<RenderPipeline<S>>>,
    Query(query): Query<RenderQuery>,
) -> HttpReply {
    handler::handle_query(&pipeline, query.template_key.as_deref(), query.variables.as_deref())
        .await
}

async fn asset<S: ObjectStore + 'static>(
    State(pipeline): State<Arc<RenderPipeline<S>>>,
    Path(path): Path<String>,
) -> Response {
    let key = match AssetKey::parse(&path) {
        Ok(key) => key,
        Err(err) => return HttpReply::error(&err).into_response(),
    };
    match pipeline.fetcher().fetch_asset(key.as_str()).await {
        Ok(asset) => {
            let content_type =
                asset.content_type.unwrap_or_else(|| "application/octet-stream".to_string());
            ([(CONTENT_TYPE, content_type)], asset.body).into_response()
        }
        Err(err) => HttpReply::error(&err).into_response(),
    }
}

async fn favicon() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(CONTENT_TYPE, "image/x-icon")])
}

async fn health() -> &'static str {
    "ok"
}
