//! Turns every request outcome into exactly one JSON response.
//!
//! Handlers return [`ApiResult`](rapport::ApiResult), so expected failures
//! become responses through `IntoResponse`. Panics are caught by
//! [`CatchPanicLayer`] and rendered as a generic internal error. Requests
//! that match no route, or match a path but not its method, get the
//! fallback below. In development mode the diagnostic attached to an error
//! is copied into `error.stack`.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use rapport::error::Diagnostic;
use rapport::ApiError;
use serde_json::{json, Map, Value};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// JSON request body. A request without a JSON content type or with an
/// empty body reads as `{}`; JSON that fails to parse is a `400` in the
/// regular error envelope.
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(&req) {
            return Ok(Self(Value::Object(Map::new())));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Value::Object(Map::new())));
        }

        let Json(value) = Json::<Value>::from_bytes(&bytes)
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

fn has_json_content_type(req: &Request) -> bool {
    let Some(content_type) = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

pub async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
        .into_response()
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::internal()
        .with_diagnostic(format!("handler panicked: {}", detail))
        .into_response()
}

/// Copy the response's [`Diagnostic`] into the JSON body as `error.stack`
pub async fn expose_diagnostics(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(Diagnostic(stack)) = response.extensions().get::<Diagnostic>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to buffer error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut body: Value = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    if let Some(error) = body.get_mut("error").and_then(Value::as_object_mut) {
        error.insert("stack".to_string(), Value::String(stack));
    }

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body.to_string()))
}

/// Wrap a fully routed application with the fallbacks, panic recovery,
/// request tracing and, when `development` is set, diagnostic exposure.
pub fn with_dispatch(router: Router, development: bool) -> Router {
    let router = router
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic));

    let router = if development {
        router.layer(middleware::from_fn(expose_diagnostics))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}
