pub mod analysis;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod validation;

pub use error::{ApiError, ApiResult, ErrorKind};

/// Test utilities for unit and integration testing.
/// Only available with cfg(test) or feature "testing".
#[cfg(any(test, feature = "testing"))]
pub mod testing;
