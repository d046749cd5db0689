//! Field-level binding and validation errors.
//!
//! Binding never fails fast: every recoverable problem becomes a
//! [`FieldError`] appended to an [`Errors`] accumulator, and an empty
//! accumulator is the only success signal.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification tag attached to every [`FieldError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Content type was empty or unsupported.
    ContentType,
    /// Body could not be decoded or the target has the wrong shape.
    Deserialization,
    /// Value could not be parsed as a (signed or unsigned) integer.
    IntegerType,
    /// Value could not be parsed as a boolean.
    BooleanType,
    /// Value could not be parsed as a float.
    FloatType,
    /// Required field left at its zero value.
    Required,
    /// Value contains characters outside `[A-Za-z0-9_-]`.
    AlphaDash,
    /// Value contains characters outside `[A-Za-z0-9_.-]`.
    AlphaDashDot,
    /// Value is shorter than the declared minimum.
    MinSize,
    /// Value is longer than the declared maximum.
    MaxSize,
    /// Value is not an email address.
    Email,
    /// Value is not an http(s) URL.
    Url,
    /// Caller-defined classification appended by a validation hook.
    Custom(Box<str>),
}

impl Classification {
    /// Create a caller-defined classification.
    pub fn custom(tag: impl Into<Box<str>>) -> Self {
        Self::Custom(tag.into())
    }

    /// Resolve a tag back into a classification.
    ///
    /// Unknown tags become [`Classification::Custom`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ContentTypeError" => Self::ContentType,
            "DeserializationError" => Self::Deserialization,
            "IntegerTypeError" => Self::IntegerType,
            "BooleanTypeError" => Self::BooleanType,
            "FloatTypeError" => Self::FloatType,
            "RequiredError" => Self::Required,
            "AlphaDashError" => Self::AlphaDash,
            "AlphaDashDotError" => Self::AlphaDashDot,
            "MinSizeError" => Self::MinSize,
            "MaxSizeError" => Self::MaxSize,
            "EmailError" => Self::Email,
            "UrlError" => Self::Url,
            other => Self::custom(other),
        }
    }

    /// Stable tag for this classification.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ContentType => "ContentTypeError",
            Self::Deserialization => "DeserializationError",
            Self::IntegerType => "IntegerTypeError",
            Self::BooleanType => "BooleanTypeError",
            Self::FloatType => "FloatTypeError",
            Self::Required => "RequiredError",
            Self::AlphaDash => "AlphaDashError",
            Self::AlphaDashDot => "AlphaDashDotError",
            Self::MinSize => "MinSizeError",
            Self::MaxSize => "MaxSizeError",
            Self::Email => "EmailError",
            Self::Url => "UrlError",
            Self::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<&str> for Classification {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagVisitor;

        impl Visitor<'_> for TagVisitor {
            type Value = Classification;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a classification tag")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Classification::from_tag(value))
            }
        }

        deserializer.deserialize_str(TagVisitor)
    }
}

/// One structured binding or validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Field labels; empty for record-level errors.
    pub field_names: Vec<String>,
    /// Classification tag.
    pub classification: Classification,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Create an error for the given field labels.
    pub fn new<I, S>(fields: I, classification: Classification, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: fields.into_iter().map(Into::into).collect(),
            classification,
            message: message.into(),
        }
    }

    /// Create a record-level error with no field labels.
    pub fn global(classification: Classification, message: impl Into<String>) -> Self {
        Self {
            field_names: Vec::new(),
            classification,
            message: message.into(),
        }
    }

    /// Request carried no content type where one was needed.
    pub fn empty_content_type() -> Self {
        Self::global(Classification::ContentType, "Empty Content-Type")
    }

    /// Request carried a content type no decoding path handles.
    pub fn unsupported_content_type() -> Self {
        Self::global(Classification::ContentType, "Unsupported Content-Type")
    }

    /// Binding target was handed over by value.
    pub fn input_not_by_reference() -> Self {
        Self::global(
            Classification::Deserialization,
            "input binding model is not by reference",
        )
    }

    /// Binding target does not resolve to a record.
    pub fn input_not_structure() -> Self {
        Self::global(
            Classification::Deserialization,
            "binding model is required to be structure",
        )
    }

    /// Body or stream failed to decode.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::global(Classification::Deserialization, message)
    }

    /// Field labels attached to this error.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.field_names
    }

    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> &Classification {
        &self.classification
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl std::error::Error for FieldError {}

/// Ordered, append-only accumulation of [`FieldError`]s.
///
/// Discovery order is preserved and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errors(Vec<FieldError>);

impl Errors {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an error built from its parts.
    pub fn add<I, S>(&mut self, fields: I, classification: Classification, message: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.push(FieldError::new(fields, classification, message));
    }

    /// Append a prepared error.
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Number of accumulated errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when nothing was accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if any error carries the classification.
    #[must_use]
    pub fn has(&self, classification: &Classification) -> bool {
        self.0
            .iter()
            .any(|error| &error.classification == classification)
    }

    /// Errors carrying the classification, in discovery order.
    #[must_use]
    pub fn with_class(&self, classification: &Classification) -> Self {
        self.0
            .iter()
            .filter(|error| &error.classification == classification)
            .cloned()
            .collect()
    }

    /// Errors naming the field label, in discovery order.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Self {
        self.0
            .iter()
            .filter(|error| error.field_names.iter().any(|name| name == field))
            .cloned()
            .collect()
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Borrow the errors as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// Consume into the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

impl From<FieldError> for Errors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<FieldError>> for Errors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl FromIterator<FieldError> for Errors {
    fn from_iter<T: IntoIterator<Item = FieldError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<FieldError> for Errors {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Errors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                formatter.write_str("; ")?;
            }
            if error.field_names.is_empty() {
                write!(formatter, "{}: {}", error.classification, error.message)?;
            } else {
                write!(
                    formatter,
                    "{} {}: {}",
                    error.field_names.join(","),
                    error.classification,
                    error.message
                )?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}
