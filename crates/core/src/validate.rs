//! Validator pass.

use crate::rules;
use crate::shape::{Access, Record, Validatable};
use formbind_shared::{Errors, RequestContext};

/// Apply every field's rules, recursing into nested records.
///
/// For each field its own rule violations come before the violations found
/// inside it. Hooks are not run here.
pub fn validate_fields<R: Record>(record: &R, errors: &mut Errors) {
    for field in R::FIELDS {
        let value = (field.value)(record);
        for rule in field.rules {
            rules::check(*rule, field.name, value, errors);
        }
        match &field.access {
            Access::Nested { get, .. } => get(record).validate_shape(errors),
            Access::Indirect { get, .. } => {
                if let Some(inner) = get(record).present() {
                    inner.validate_shape(errors);
                }
            },
            Access::Value(_) | Access::Unbound => {},
        }
    }
}

/// Validate one record and run its hook with the resulting errors.
pub fn validate_record<R: Record>(
    record: &R,
    context: &RequestContext,
    mut errors: Errors,
) -> Errors {
    validate_fields(record, &mut errors);
    match record.validation_hook() {
        Some(hook) => hook.validate_extra(context, errors),
        None => errors,
    }
}

/// Validate a record, a slice of records, or a `Vec` of records.
///
/// Sequences are validated element by element, each element's hook running
/// right after its own rules.
pub fn validate<T: Validatable + ?Sized>(target: &T, context: &RequestContext) -> Errors {
    target.validate_into(context, Errors::new())
}
