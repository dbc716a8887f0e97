use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use rapport::ApiError;
use std::sync::Arc;

/// Pre-shared token protected routes are checked against
#[derive(Clone)]
pub struct TokenAuth {
    token: Arc<str>,
}

impl TokenAuth {
    pub fn new(token: &str) -> Self {
        Self {
            token: Arc::from(token),
        }
    }

    pub fn check(&self, header: Option<&str>) -> Result<(), ApiError> {
        rapport::auth::authenticate(header, &self.token)
    }
}

/// Reject requests whose `Authorization` header does not carry the token
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(auth) = request.extensions().get::<TokenAuth>().cloned() else {
        return ApiError::internal()
            .with_diagnostic("token auth layer is not installed")
            .into_response();
    };

    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth.check(header) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
