//! Error types surfaced by the HTTP layer
//!
//! - `app_error`: failures of the provider proxy endpoints
//! - `auth_error`: bearer authentication failures

pub mod app_error;
pub mod auth_error;

pub use app_error::{AppError, AppResult};
pub use auth_error::{AuthError, AuthResult};
