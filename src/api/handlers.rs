//! HTTP request handlers for collection routes
//!
//! Handlers stay thin: they apply the fake load, hand the request to the
//! route's [`Resource`] on the blocking pool and render the outcome.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{debug, error, warn};

use crate::core::config::parse_duration;
use crate::core::error::ResourceError;
use crate::resource::{ListOutcome, Resource};
use crate::storage::Record;

/// Per-route handler state
#[derive(Debug, Clone)]
pub struct RouteState {
    /// Collection served by the route
    pub resource: Arc<Resource>,
    /// Default artificial delay
    pub fake_load: Duration,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// HTTP status code, repeated in the body
    pub status: u16,
    /// Human readable reason
    pub message: String,
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorBody {
            status: status.as_u16(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Sleep for the request's `sleep` parameter, or the configured fake load.
///
/// An unparseable `sleep` value means no delay.
async fn fake_load(state: &RouteState, query: &HashMap<String, String>) {
    let delay = match query.get("sleep").filter(|raw| !raw.is_empty()) {
        Some(raw) => parse_duration(raw).unwrap_or(Duration::ZERO),
        None => state.fake_load,
    };
    if !delay.is_zero() {
        debug!("Sleeping for {:?} for fake load", delay);
        tokio::time::sleep(delay).await;
    }
}

/// Run a resource operation on the blocking pool
async fn run_blocking<T, F>(state: &RouteState, op: F) -> Result<T, ResourceError>
where
    F: FnOnce(&Resource) -> Result<T, ResourceError> + Send + 'static,
    T: Send + 'static,
{
    let resource = state.resource.clone();
    tokio::task::spawn_blocking(move || op(&resource))
        .await
        .map_err(|e| ResourceError::Task(e.to_string()))?
}

fn json_bytes(bytes: Vec<u8>) -> Response {
    ([(CONTENT_TYPE, HeaderValue::from_static("application/json"))], bytes).into_response()
}

fn render_list(outcome: ListOutcome) -> Response {
    match outcome {
        ListOutcome::Raw(bytes) => json_bytes(bytes),
        ListOutcome::Body(page) => Json(page).into_response(),
        ListOutcome::Headers(page) => {
            let mut headers = HeaderMap::new();
            for (name, value) in page.header_pairs() {
                if let Ok(value) = HeaderValue::from_str(&value) {
                    headers.insert(HeaderName::from_static(name), value);
                }
            }
            (headers, Json(page.content)).into_response()
        }
    }
}

/// `GET /{route}`
pub async fn list(
    State(state): State<RouteState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ResourceError> {
    fake_load(&state, &query).await;
    let outcome = run_blocking(&state, move |resource| resource.list(&query, &headers)).await?;
    Ok(render_list(outcome))
}

/// `GET /{route}/{id}`
pub async fn get_item(
    State(state): State<RouteState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Record>, ResourceError> {
    fake_load(&state, &query).await;
    debug!("Fetching {} from {}", id, state.resource.route().path);
    run_blocking(&state, move |resource| resource.get(&id)).await.map(Json)
}

/// `POST /{route}`
pub async fn create(
    State(state): State<RouteState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<Record>, ResourceError> {
    fake_load(&state, &query).await;
    run_blocking(&state, move |resource| resource.create(&body)).await.map(Json)
}

/// `PUT /{route}`
pub async fn replace(
    State(state): State<RouteState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<Record>, ResourceError> {
    fake_load(&state, &query).await;
    run_blocking(&state, move |resource| resource.replace(&body)).await.map(Json)
}

/// `PATCH /{route}`
pub async fn patch(
    State(state): State<RouteState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<Record>, ResourceError> {
    fake_load(&state, &query).await;
    run_blocking(&state, move |resource| resource.patch(&body)).await.map(Json)
}

/// Any verb on a raw route; the file is served as-is
pub async fn raw(
    State(state): State<RouteState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ResourceError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }
    fake_load(&state, &query).await;
    let bytes = run_blocking(&state, |resource| resource.raw()).await?;
    Ok(json_bytes(bytes))
}

/// `OPTIONS` is answered without touching the collection
pub async fn options() -> StatusCode {
    StatusCode::OK
}

/// Verbs a route does not serve
pub async fn method_not_allowed() -> ResourceError {
    ResourceError::MethodNotAllowed
}

/// Paths no route is mounted at
pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            status: 404,
            message: "Not Found".to_string(),
        }),
    )
}
