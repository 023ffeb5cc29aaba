//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod alerts;
pub mod detection;
pub mod health;
pub mod transactions;

// Re-export all handlers for use in router
pub use alerts::*;
pub use detection::*;
pub use health::*;
pub use transactions::*;

use crate::AppError;

/// Longest accepted user identifier
const MAX_USER_ID_LEN: usize = 128;

/// User ids are opaque, but must be non-blank and bounded
pub(crate) fn validate_user_id(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::bad_request("user id must not be blank"));
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(AppError::bad_request("user id is too long"));
    }
    Ok(())
}
