//! Binder pass and the form-style entry points.

use crate::bag::{FileValues, FormValues, InputBag};
use crate::shape::{Access, BindTarget, Record, Validatable};
use formbind_shared::{Errors, RequestContext};
use tracing::debug;

/// Populate `record` from `bag`, appending coercion errors to `errors`.
///
/// Fields are visited in declaration order. Absent keys leave fields
/// untouched; a failed coercion is recorded and the walk continues.
pub fn map_form<R: Record>(record: &mut R, bag: &InputBag<'_>, errors: &mut Errors) {
    for field in R::FIELDS {
        match &field.access {
            Access::Indirect {
                get_mut,
                embedded: true,
                ..
            } => {
                let slot = get_mut(record);
                slot.allocate().bind_shape(bag, errors);
                slot.collapse_if_zero();
            },
            Access::Nested { get_mut, .. } => get_mut(record).bind_shape(bag, errors),
            Access::Value(slot) => {
                let Some(key) = field.key else {
                    continue;
                };
                if let Some(values) = bag.values(key) {
                    slot(record).bind_values(key, values, errors);
                } else if let Some(files) = bag.files(key) {
                    slot(record).bind_files(files);
                }
            },
            Access::Indirect { .. } | Access::Unbound => {},
        }
    }
}

/// Resolve `target`, fill it, then validate it.
///
/// A structural precondition failure yields exactly that one error and
/// nothing else runs. Otherwise binder errors come first, followed by the
/// validator's.
pub(crate) fn bind_with<'a, T, F>(target: T, context: &RequestContext, fill: F) -> Errors
where
    T: BindTarget<'a>,
    F: FnOnce(&mut T::Record, &mut Errors),
{
    let record = match target.resolve() {
        Ok(record) => record,
        Err(error) => {
            debug!(
                target: "formbind::bind",
                record = std::any::type_name::<T::Record>(),
                reason = error.message(),
                "binding target rejected"
            );
            return Errors::from(error);
        },
    };

    let mut errors = Errors::new();
    fill(record, &mut errors);
    let validation = Validatable::validate_into(&*record, context, Errors::new());
    debug!(
        target: "formbind::bind",
        record = std::any::type_name::<T::Record>(),
        binder_errors = errors.len(),
        validation_errors = validation.len(),
        "bind finished"
    );
    errors.extend(validation);
    errors
}

/// Bind string values, then validate.
pub fn bind_form<'a, T: BindTarget<'a>>(
    target: T,
    values: &FormValues,
    context: &RequestContext,
) -> Errors {
    bind_with(target, context, |record, errors| {
        map_form(record, &InputBag::new(values), errors);
    })
}

/// Bind string values and uploaded files, then validate.
pub fn bind_multipart<'a, T: BindTarget<'a>>(
    target: T,
    values: &FormValues,
    files: &FileValues,
    context: &RequestContext,
) -> Errors {
    bind_with(target, context, |record, errors| {
        map_form(record, &InputBag::with_files(values, files), errors);
    })
}

/// Bind with extra errors discovered before binding started.
///
/// Used by transports that hit a recoverable decode failure and still want
/// the record bound from whatever was decoded. The `prior` errors lead the
/// result, and are dropped if the target itself is rejected.
pub fn bind_bag<'a, T: BindTarget<'a>>(
    target: T,
    bag: &InputBag<'_>,
    prior: Errors,
    context: &RequestContext,
) -> Errors {
    bind_with(target, context, |record, errors| {
        errors.extend(prior);
        map_form(record, bag, errors);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::form_values;
    use crate::coerce::FormField;
    use crate::rules::Rule;
    use crate::shape::{Constrained, Field, RecordSlot, Shape};
    use crate::validate::{validate_fields, validate_record};
    use formbind_shared::{Classification, FieldError};

    // Hand-written descriptor table, equivalent to what the derive emits.
    #[derive(Debug, Default, PartialEq)]
    struct Contact {
        name: String,
        age: u8,
    }

    fn name_value(record: &Contact) -> &dyn Constrained {
        &record.name
    }

    fn name_slot(record: &mut Contact) -> &mut dyn FormField {
        &mut record.name
    }

    fn age_value(record: &Contact) -> &dyn Constrained {
        &record.age
    }

    fn age_slot(record: &mut Contact) -> &mut dyn FormField {
        &mut record.age
    }

    impl Record for Contact {
        const FIELDS: &'static [Field<Self>] = &[
            Field {
                name: "Name",
                key: Some("name"),
                rules: &[Rule::Required],
                value: name_value,
                access: Access::Value(name_slot),
            },
            Field {
                name: "Age",
                key: Some("age"),
                rules: &[],
                value: age_value,
                access: Access::Value(age_slot),
            },
        ];
    }

    impl Shape for Contact {
        fn bind_shape(&mut self, bag: &InputBag<'_>, errors: &mut Errors) {
            map_form(self, bag, errors);
        }

        fn validate_shape(&self, errors: &mut Errors) {
            validate_fields(self, errors);
        }
    }

    impl Constrained for Contact {
        fn is_zero(&self) -> bool {
            *self == Self::default()
        }
    }

    impl Validatable for Contact {
        fn validate_into(&self, context: &RequestContext, errors: Errors) -> Errors {
            validate_record(self, context, errors)
        }
    }

    impl RecordSlot for Contact {
        type Record = Self;

        fn record_mut(&mut self) -> &mut Self {
            self
        }
    }

    #[test]
    fn binds_keyed_fields() {
        let values = form_values([("name", "Ann"), ("age", "41")]);
        let mut contact = Contact::default();
        let errors = bind_form(&mut contact, &values, &RequestContext::default());
        assert!(errors.is_empty());
        assert_eq!(contact.name, "Ann");
        assert_eq!(contact.age, 41);
    }

    #[test]
    fn binder_errors_precede_validation_errors() {
        let values = form_values([("age", "old")]);
        let mut contact = Contact::default();
        let errors = bind_form(&mut contact, &values, &RequestContext::default());

        let kinds: Vec<(&str, &str)> = errors
            .iter()
            .map(|error| {
                (
                    error.fields().first().map_or("", String::as_str),
                    error.kind().as_str(),
                )
            })
            .collect();
        assert_eq!(
            kinds,
            vec![("age", "IntegerTypeError"), ("Name", "RequiredError")]
        );
    }

    #[test]
    fn absent_keys_leave_fields_untouched() {
        let values = FormValues::new();
        let mut contact = Contact {
            name: "preset".to_string(),
            age: 9,
        };
        let errors = bind_form(&mut contact, &values, &RequestContext::default());
        assert!(errors.is_empty());
        assert_eq!(contact.age, 9);
        assert_eq!(contact.name, "preset");
    }

    #[test]
    fn empty_optional_target_is_allocated() {
        let values = form_values([("name", "Ann")]);
        let mut slot: Option<Contact> = None;
        let errors = bind_form(&mut slot, &values, &RequestContext::default());
        assert!(errors.is_empty());
        assert_eq!(slot.map(|contact| contact.name), Some("Ann".to_string()));
    }

    #[test]
    fn sequence_target_is_rejected_without_binding() {
        let values = form_values([("name", "Ann")]);
        let mut contacts = vec![Contact::default()];
        let errors = bind_form(&mut contacts, &values, &RequestContext::default());
        assert_eq!(errors.into_vec(), vec![FieldError::input_not_structure()]);
        assert_eq!(contacts, vec![Contact::default()]);
    }

    #[test]
    fn prior_errors_lead_the_result() {
        let values = form_values([("name", "Ann")]);
        let mut contact = Contact::default();
        let prior = Errors::from(FieldError::deserialization("truncated body"));
        let errors = bind_bag(
            &mut contact,
            &InputBag::new(&values),
            prior,
            &RequestContext::default(),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors.has(&Classification::Deserialization));
        assert_eq!(contact.name, "Ann");
    }
}
