//! # formbind-facade
//!
//! Binds `http::Request` values into typed records. The content type picks
//! the decoder:
//!
//! - `application/x-www-form-urlencoded` (and bodiless requests): body and
//!   query string values
//! - `multipart/form-data`: values and uploaded files, parsed with a
//!   streaming reader that spills large files to disk
//! - anything containing `json`: the JSON body
//!
//! Every path validates the record afterwards and returns the combined
//! [`Errors`](formbind_core::Errors).
//!
//! ```
//! use formbind_facade::{Record, bind};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, PartialEq, Record, Serialize, Deserialize)]
//! struct Search {
//!     #[form("q")]
//!     #[binding(required)]
//!     pub query: String,
//! }
//!
//! let request = http::Request::get("/search?q=rust").body(Vec::<u8>::new())?;
//! let mut search = Search::default();
//! let errors = bind(&mut search, &request);
//! assert!(errors.is_empty());
//! assert_eq!(search.query, "rust");
//! # Ok::<(), http::Error>(())
//! ```

pub mod content_type;
pub mod dispatch;
pub mod multipart;

pub use content_type::MediaType;
pub use dispatch::{MAX_FORM_BODY, bind, form, json, multipart_form, read_multipart};
pub use formbind_config::{BinderConfig, install, max_memory, set_max_memory};
pub use formbind_core::{
    Classification, Errors, FieldError, FileRef, MultipartForm, Record, RequestContext,
    ValidateHook, validate,
};
pub use multipart::{MultipartError, MultipartReader, VALUE_ALLOWANCE};

/// Returns the facade crate version.
#[must_use]
pub const fn facade_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
