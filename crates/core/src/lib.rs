//! # formbind-core
//!
//! Binding and validation engine.
//!
//! A [`Record`] describes its fields once, as a static table. Two passes walk
//! that table:
//!
//! - [`map_form`] fills fields from an [`InputBag`], coercing strings into
//!   typed values and attaching uploaded files.
//! - [`validate`] re-walks the populated record, applies each field's
//!   [`Rule`]s, and finally runs the record's [`ValidateHook`].
//!
//! Neither pass stops at the first problem: every failure is appended to an
//! [`Errors`] list, and an empty list is the only success signal.
//!
//! ```
//! use formbind_core::{FormValues, Record, RequestContext, bind_form};
//!
//! #[derive(Debug, Default, PartialEq, Record)]
//! struct Post {
//!     #[form("title")]
//!     #[binding(required)]
//!     pub title: String,
//!     #[form("content")]
//!     pub content: String,
//! }
//!
//! let mut values = FormValues::new();
//! values.insert("title".into(), vec![String::new()]);
//! let mut post = Post::default();
//! let errors = bind_form(&mut post, &values, &RequestContext::default());
//! assert_eq!(errors.len(), 1);
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod bag;
pub mod bind;
pub mod coerce;
pub mod files;
pub mod json;
pub mod rules;
pub mod shape;
pub mod validate;

pub use bag::{
    FileValues, FormValues, InputBag, MultipartForm, UrlEncodedError, form_values,
    parse_urlencoded,
};
pub use bind::{bind_bag, bind_form, bind_multipart, map_form};
pub use coerce::{CoercionFailure, FormField, Scalar, coerce};
pub use files::{FileContent, FilePart, FileRef};
pub use formbind_derive::Record;
pub use formbind_shared::{
    Classification, ErrorEnvelope, Errors, FieldError, RequestContext, ValidateHook,
};
pub use json::{JsonBindError, bind_json, merge_json};
pub use rules::Rule;
pub use shape::{
    Access, BindTarget, Constrained, Field, Indirect, Record, RecordSlot, Shape, Validatable,
};
pub use validate::{validate, validate_fields, validate_record};

/// Returns the core crate version.
#[must_use]
pub const fn core_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
