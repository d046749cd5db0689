//! String-to-value coercion for bindable fields.
//!
//! Every bindable field type implements [`FormField`]. Scalars go through
//! [`Scalar::parse_literal`]; a failed coercion appends one error labelled
//! with the external key and leaves the field at its current value.

use crate::files::FileRef;
use formbind_shared::{Classification, Errors};

/// Why a literal could not be coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoercionFailure {
    /// Signed integer parse failure or overflow.
    #[error("Value could not be parsed as integer")]
    Integer,
    /// Unsigned integer parse failure or overflow.
    #[error("Value could not be parsed as unsigned integer")]
    UnsignedInteger,
    /// Not a recognized boolean literal.
    #[error("Value could not be parsed as boolean")]
    Boolean,
    /// `f32` parse failure.
    #[error("Value could not be parsed as 32-bit float")]
    Float32,
    /// `f64` parse failure.
    #[error("Value could not be parsed as 64-bit float")]
    Float64,
}

impl CoercionFailure {
    /// Classification reported for this failure.
    #[must_use]
    pub const fn classification(self) -> Classification {
        match self {
            Self::Integer | Self::UnsignedInteger => Classification::IntegerType,
            Self::Boolean => Classification::BooleanType,
            Self::Float32 | Self::Float64 => Classification::FloatType,
        }
    }
}

/// A single-valued field kind that can be parsed from one literal.
pub trait Scalar: Default + Sized {
    /// Parse a literal.
    ///
    /// `Ok(None)` means the literal is valid but must not be written.
    fn parse_literal(literal: &str) -> Result<Option<Self>, CoercionFailure>;
}

macro_rules! integer_scalar {
    ($failure:ident: $($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn parse_literal(literal: &str) -> Result<Option<Self>, CoercionFailure> {
                    let literal = if literal.is_empty() { "0" } else { literal };
                    literal
                        .parse::<$ty>()
                        .map(Some)
                        .map_err(|_| CoercionFailure::$failure)
                }
            }
        )*
    };
}

integer_scalar!(Integer: i8, i16, i32, i64, i128, isize);
integer_scalar!(UnsignedInteger: u8, u16, u32, u64, u128, usize);

macro_rules! float_scalar {
    ($($ty:ty => $failure:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn parse_literal(literal: &str) -> Result<Option<Self>, CoercionFailure> {
                    let literal = if literal.is_empty() { "0.0" } else { literal };
                    literal
                        .parse::<$ty>()
                        .map(Some)
                        .map_err(|_| CoercionFailure::$failure)
                }
            }
        )*
    };
}

float_scalar!(f32 => Float32, f64 => Float64);

impl Scalar for bool {
    fn parse_literal(literal: &str) -> Result<Option<Self>, CoercionFailure> {
        match literal {
            "on" | "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(Some(true)),
            // false is never written: an unchecked box and an absent key look alike
            "" | "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(None),
            _ => Err(CoercionFailure::Boolean),
        }
    }
}

impl Scalar for String {
    fn parse_literal(literal: &str) -> Result<Option<Self>, CoercionFailure> {
        Ok(Some(literal.to_owned()))
    }
}

/// Coerce `literal` into `slot`, appending an error labelled `key` on failure.
pub fn coerce<S: Scalar>(slot: &mut S, key: &str, literal: &str, errors: &mut Errors) {
    match S::parse_literal(literal) {
        Ok(Some(value)) => *slot = value,
        Ok(None) => {},
        Err(failure) => errors.add([key], failure.classification(), failure.to_string()),
    }
}

/// A field the binder can write from the input bag.
pub trait FormField {
    /// Bind the values sent under `key`.
    fn bind_values(&mut self, key: &str, values: &[String], errors: &mut Errors);

    /// Bind the files sent under the field's key; ignored by non-file kinds.
    fn bind_files(&mut self, _files: &[FileRef]) {}
}

macro_rules! scalar_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FormField for $ty {
                fn bind_values(&mut self, key: &str, values: &[String], errors: &mut Errors) {
                    if let Some(first) = values.first() {
                        coerce(self, key, first, errors);
                    }
                }
            }
        )*
    };
}

scalar_field!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, String,
);

impl<S: Scalar> FormField for Vec<S> {
    fn bind_values(&mut self, key: &str, values: &[String], errors: &mut Errors) {
        if values.is_empty() {
            return;
        }
        let mut sequence = Vec::with_capacity(values.len());
        for literal in values {
            let mut element = S::default();
            coerce(&mut element, key, literal, errors);
            sequence.push(element);
        }
        *self = sequence;
    }
}

impl<S: Scalar> FormField for Option<S> {
    fn bind_values(&mut self, key: &str, values: &[String], errors: &mut Errors) {
        let Some(first) = values.first() else {
            return;
        };
        match S::parse_literal(first) {
            Ok(Some(value)) => *self = Some(value),
            Ok(None) => {},
            Err(failure) => errors.add([key], failure.classification(), failure.to_string()),
        }
    }
}

impl FormField for Option<FileRef> {
    fn bind_values(&mut self, _key: &str, _values: &[String], _errors: &mut Errors) {}

    fn bind_files(&mut self, files: &[FileRef]) {
        if let Some(first) = files.first() {
            *self = Some(first.clone());
        }
    }
}

impl FormField for Vec<FileRef> {
    fn bind_values(&mut self, _key: &str, _values: &[String], _errors: &mut Errors) {}

    fn bind_files(&mut self, files: &[FileRef]) {
        if !files.is_empty() {
            *self = files.to_vec();
        }
    }
}
