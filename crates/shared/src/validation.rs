//! Hook trait for record-specific validation.

use crate::context::RequestContext;
use crate::field_errors::Errors;

/// Extra validation run after declarative rules.
///
/// The hook receives the errors produced by declarative validation of the
/// same record and returns the list to keep; it may append to it, leave it
/// alone, or replace it. Binder errors are never passed in.
pub trait ValidateHook {
    /// Inspect the bound record and return the resulting error list.
    fn validate_extra(&self, context: &RequestContext, errors: Errors) -> Errors;
}
