//! # formbind-shared
//!
//! Types shared by every formbind crate:
//!
//! - Field errors and the ordered accumulator returned by binding
//! - The error envelope used for configuration and I/O failures
//! - The request context handed to validation hooks
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Errors are data** - Binding failures accumulate instead of short-circuiting
//! 3. **Serde-compatible** - Error types serialize for API responses

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod context;
pub mod errors;
pub mod field_errors;
pub mod validation;

pub use context::RequestContext;
pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use field_errors::{Classification, Errors, FieldError};
pub use validation::ValidateHook;

/// Result alias for operations that fail with an [`ErrorEnvelope`].
pub type Result<T> = std::result::Result<T, ErrorEnvelope>;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_types_are_available() {
        let mut errors = Errors::new();
        errors.push(FieldError::empty_content_type());
        assert!(errors.has(&Classification::ContentType));

        let envelope = ErrorEnvelope::expected(ErrorCode::new("config", "invalid"), "invalid");
        assert_eq!(envelope.kind, ErrorKind::Expected);
    }

    #[test]
    fn shared_crate_version_is_set() {
        assert!(!shared_crate_version().is_empty());
    }
}
