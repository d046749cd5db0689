//! Static shape model walked by the binder and the validator.
//!
//! A record exposes an ordered table of [`Field`] descriptors. Each
//! descriptor carries the external key, the constraint list, and plain
//! function pointers that project the record onto the field, so both passes
//! run without any runtime reflection. `#[derive(Record)]` generates the
//! table; hand-written tables work the same way.

use crate::bag::InputBag;
use crate::coerce::FormField;
use crate::files::FileRef;
use crate::rules::Rule;
use formbind_shared::{Errors, FieldError, RequestContext, ValidateHook};
use std::borrow::Cow;
use std::fmt;

/// A bindable, validatable record with a static field table.
pub trait Record: Shape + Constrained + Validatable + Default + PartialEq + 'static {
    /// Field descriptors in declaration order.
    const FIELDS: &'static [Field<Self>];

    /// The record's custom validation hook, if it has one.
    fn validation_hook(&self) -> Option<&dyn ValidateHook> {
        None
    }

    /// Move the fields serde does not deserialize from `previous` back into
    /// a freshly decoded record, recursing into nested records.
    fn restore_unserialized(&mut self, previous: &mut Self) {
        let _ = previous;
    }
}

/// Descriptor for one declared field.
pub struct Field<R> {
    /// Field name used as the label of rule violations.
    pub name: &'static str,
    /// External key in the input bag; `None` means the field is not bound.
    pub key: Option<&'static str>,
    /// Constraints, evaluated in order.
    pub rules: &'static [Rule],
    /// Read-only projection used by the rules.
    pub value: fn(&R) -> &dyn Constrained,
    /// How the binder and validator reach into the field.
    pub access: Access<R>,
}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Field")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("rules", &self.rules)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// Field access paths.
pub enum Access<R> {
    /// Keyed value written by the coercer.
    Value(fn(&mut R) -> &mut dyn FormField),
    /// Validated only; never bound.
    Unbound,
    /// Plain nested record, recursed by both passes.
    Nested {
        /// Shared projection.
        get: fn(&R) -> &dyn Shape,
        /// Mutable projection.
        get_mut: fn(&mut R) -> &mut dyn Shape,
    },
    /// Record behind an optional indirection.
    ///
    /// Embedded indirections are allocated, bound, then collapsed back to
    /// empty when still all-zero. Named ones are only validated, and only
    /// when present.
    Indirect {
        /// Shared projection.
        get: fn(&R) -> &dyn Indirect,
        /// Mutable projection.
        get_mut: fn(&mut R) -> &mut dyn Indirect,
        /// Whether the binder recurses into it.
        embedded: bool,
    },
}

impl<R> fmt::Debug for Access<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => formatter.write_str("Value"),
            Self::Unbound => formatter.write_str("Unbound"),
            Self::Nested { .. } => formatter.write_str("Nested"),
            Self::Indirect { embedded, .. } => formatter
                .debug_struct("Indirect")
                .field("embedded", embedded)
                .finish_non_exhaustive(),
        }
    }
}

/// Object-safe view of a record used for recursion.
pub trait Shape {
    /// Run the binder pass over this record.
    fn bind_shape(&mut self, bag: &InputBag<'_>, errors: &mut Errors);

    /// Run the declarative validator pass over this record (no hook).
    fn validate_shape(&self, errors: &mut Errors);
}

impl<T: Shape + ?Sized> Shape for Box<T> {
    fn bind_shape(&mut self, bag: &InputBag<'_>, errors: &mut Errors) {
        (**self).bind_shape(bag, errors);
    }

    fn validate_shape(&self, errors: &mut Errors) {
        (**self).validate_shape(errors);
    }
}

/// Optional indirection to a record.
pub trait Indirect {
    /// Allocate a zero-valued record if empty and return it.
    fn allocate(&mut self) -> &mut dyn Shape;

    /// Reset to empty when the held record equals its zero value.
    fn collapse_if_zero(&mut self);

    /// The held record, if any.
    fn present(&self) -> Option<&dyn Shape>;
}

impl<T: Shape + Constrained + Default> Indirect for Option<T> {
    fn allocate(&mut self) -> &mut dyn Shape {
        self.get_or_insert_with(T::default)
    }

    fn collapse_if_zero(&mut self) {
        if self.as_ref().is_some_and(|inner| inner.is_zero()) {
            *self = None;
        }
    }

    fn present(&self) -> Option<&dyn Shape> {
        self.as_ref().map(|inner| -> &dyn Shape { inner })
    }
}

/// Value properties the rule catalog inspects.
pub trait Constrained {
    /// Whether the value equals the zero value of its type.
    fn is_zero(&self) -> bool;

    /// Textual form checked by pattern rules.
    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    /// Size checked by `MinSize`/`MaxSize`: character count for strings,
    /// element count for sequences, `None` when size does not apply.
    fn measure(&self) -> Option<usize> {
        None
    }
}

macro_rules! numeric_constrained {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Constrained for $ty {
                fn is_zero(&self) -> bool {
                    *self == <$ty>::default()
                }

                fn render(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

numeric_constrained!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl Constrained for bool {
    fn is_zero(&self) -> bool {
        !*self
    }

    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }
}

impl Constrained for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }

    fn measure(&self) -> Option<usize> {
        Some(self.chars().count())
    }
}

impl Constrained for FileRef {
    fn is_zero(&self) -> bool {
        false
    }

    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.filename())
    }
}

impl<T: Constrained> Constrained for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> Cow<'_, str> {
        let items: Vec<Cow<'_, str>> = self.iter().map(Constrained::render).collect();
        Cow::Owned(format!("[{}]", items.join(" ")))
    }

    fn measure(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<T: Constrained> Constrained for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn render(&self) -> Cow<'_, str> {
        self.as_ref()
            .map_or(Cow::Borrowed(""), Constrained::render)
    }

    fn measure(&self) -> Option<usize> {
        self.as_ref().and_then(Constrained::measure)
    }
}

impl<T: Constrained + ?Sized> Constrained for Box<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn render(&self) -> Cow<'_, str> {
        (**self).render()
    }

    fn measure(&self) -> Option<usize> {
        (**self).measure()
    }
}

/// Something that validates as a record or a sequence of records.
pub trait Validatable {
    /// Run declarative rules, then hooks, appending to `errors`.
    fn validate_into(&self, context: &RequestContext, errors: Errors) -> Errors;
}

impl<R: Record> Validatable for [R] {
    fn validate_into(&self, context: &RequestContext, errors: Errors) -> Errors {
        self.iter()
            .fold(errors, |errors, element| element.validate_into(context, errors))
    }
}

impl<R: Record> Validatable for Vec<R> {
    fn validate_into(&self, context: &RequestContext, errors: Errors) -> Errors {
        self.as_slice().validate_into(context, errors)
    }
}

impl<R: Record, const N: usize> Validatable for [R; N] {
    fn validate_into(&self, context: &RequestContext, errors: Errors) -> Errors {
        self.as_slice().validate_into(context, errors)
    }
}

/// A value that can sit behind the optional indirection of a bind target.
pub trait RecordSlot: Default {
    /// The record reached through the slot.
    type Record: Record;

    /// Borrow the record.
    fn record_mut(&mut self) -> &mut Self::Record;
}

impl<R: Record> RecordSlot for Box<R> {
    type Record = R;

    fn record_mut(&mut self) -> &mut R {
        self
    }
}

/// A value handed to a bind entry point.
///
/// Resolution enforces the structural preconditions: only a mutable
/// reference to a record (directly or through an optional indirection) is
/// bindable.
pub trait BindTarget<'a> {
    /// The record that gets bound.
    type Record: Record;

    /// Reach the record, or report the single structural error.
    fn resolve(self) -> Result<&'a mut Self::Record, FieldError>;
}

impl<'a, R: Record> BindTarget<'a> for &'a mut R {
    type Record = R;

    fn resolve(self) -> Result<&'a mut R, FieldError> {
        Ok(self)
    }
}

impl<'a, S: RecordSlot> BindTarget<'a> for &'a mut Option<S> {
    type Record = S::Record;

    fn resolve(self) -> Result<&'a mut S::Record, FieldError> {
        Ok(self.get_or_insert_with(S::default).record_mut())
    }
}

impl<'a, R: Record> BindTarget<'a> for &'a mut Vec<R> {
    type Record = R;

    fn resolve(self) -> Result<&'a mut R, FieldError> {
        Err(FieldError::input_not_structure())
    }
}

impl<'a, R: Record> BindTarget<'a> for &'a mut [R] {
    type Record = R;

    fn resolve(self) -> Result<&'a mut R, FieldError> {
        Err(FieldError::input_not_structure())
    }
}
