//! Shared-secret request gate.

use crate::error::{ApiError, ApiResult};
use subtle::ConstantTimeEq;

pub const MISSING_TOKEN: &str = "Authentication token is required";
pub const INVALID_TOKEN: &str = "Invalid authentication token";

/// Pull the token out of an `Authorization` header value.
///
/// The token is the second space-separated segment (`Bearer <token>`); the
/// scheme name itself is not checked.
pub fn extract_token(header: &str) -> Option<&str> {
    header.split(' ').nth(1).filter(|token| !token.is_empty())
}

/// Check an `Authorization` header against the expected token.
///
/// No header or no token yields 401; a token that does not match exactly
/// yields 403.
pub fn authenticate(header: Option<&str>, expected: &str) -> ApiResult<()> {
    let token = header
        .and_then(extract_token)
        .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))?;

    if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::forbidden(INVALID_TOKEN))
    }
}
