//! HTTP routes for fragments.
//!
//! Every `/v1` route is scoped to the [`Owner`] named by the
//! `X-Fragments-Owner` header. Raw fragment data is served with its stored
//! `Content-Type`; appending an extension (`/v1/fragments/{id}.html`)
//! requests a converted representation.

mod owner;
mod response;

pub use owner::{Owner, OWNER_HEADER};
pub use response::{ok, ApiError};

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use fragments::{ContentKind, FragmentListing, FragmentRepository};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Shared state for web handlers
#[derive(Clone)]
pub struct WebState {
    pub repo: FragmentRepository,
    /// Largest accepted request body; larger uploads get 413.
    pub max_body_bytes: usize,
}

pub fn router(state: WebState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/", get(health))
        .route("/v1/fragments", get(list_fragments).post(create_fragment))
        .route(
            "/v1/fragments/{id}",
            get(get_fragment).put(update_fragment).delete(delete_fragment),
        )
        .route("/v1/fragments/{id}/info", get(fragment_info))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unauthenticated liveness check.
async fn health() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        ok(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    expand: Option<String>,
}

async fn list_fragments(
    State(state): State<WebState>,
    owner: Owner,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let expand = matches!(query.expand.as_deref(), Some("1" | "true"));
    let fragments = match state.repo.list_for_owner(owner.as_str(), expand).await? {
        FragmentListing::Ids(ids) => json!(ids),
        FragmentListing::Expanded(fragments) => {
            let infos: Vec<_> = fragments.iter().map(|f| f.info()).collect();
            json!(infos)
        }
    };
    Ok(ok(json!({ "fragments": fragments })).into_response())
}

async fn create_fragment(
    State(state): State<WebState>,
    owner: Owner,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let content_type = request_content_type(&headers)?;
    let fragment = state.repo.insert(owner.as_str(), content_type, body).await?;

    let path = format!("/v1/fragments/{}", fragment.id);
    let location = match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{path}"),
        None => path,
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        ok(json!({ "fragment": fragment.info() })),
    )
        .into_response())
}

async fn get_fragment(
    State(state): State<WebState>,
    owner: Owner,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let (id, target) = split_extension(&raw_id)?;
    let (fragment, data) = state.repo.read_as(owner.as_str(), id, target).await?;

    let content_type = match target {
        Some(kind) if fragment.kind() != Some(kind) => kind.mime().to_string(),
        _ => fragment.content_type.to_string(),
    };
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

async fn fragment_info(
    State(state): State<WebState>,
    owner: Owner,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let fragment = state.repo.get_by_id(owner.as_str(), &id).await?;
    Ok(ok(json!({ "fragment": fragment.info() })).into_response())
}

async fn update_fragment(
    State(state): State<WebState>,
    owner: Owner,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let content_type = request_content_type(&headers)?;
    let fragment = state
        .repo
        .replace_data(owner.as_str(), &id, content_type, body)
        .await?;
    Ok(ok(json!({ "fragment": fragment.info() })).into_response())
}

async fn delete_fragment(
    State(state): State<WebState>,
    owner: Owner,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    // 404 for ids that never existed; delete itself is idempotent
    state.repo.get_by_id(owner.as_str(), &id).await?;
    state.repo.delete(owner.as_str(), &id).await?;
    Ok(ok(json!({})).into_response())
}

fn request_content_type(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::unsupported_media_type("Content-Type header is required"))
}

/// Split `abc.html` into `("abc", Some(TextHtml))`.
fn split_extension(raw: &str) -> Result<(&str, Option<ContentKind>), ApiError> {
    match raw.rsplit_once('.') {
        Some((id, ext)) if !id.is_empty() => match ContentKind::from_extension(ext) {
            Some(kind) => Ok((id, Some(kind))),
            None => Err(ApiError::unsupported_media_type(format!(
                "extension .{ext} is not supported"
            ))),
        },
        _ => Ok((raw, None)),
    }
}
