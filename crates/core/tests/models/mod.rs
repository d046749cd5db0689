//! Record shapes shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a subset of the models")]

use formbind_core::{Classification, Errors, FileRef, Record, RequestContext, ValidateHook};
use serde::{Deserialize, Serialize};

/// Basic record with a required field and a hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[binding(hook)]
pub struct Post {
    #[form("title")]
    #[binding(required)]
    pub title: String,
    #[form("content")]
    pub content: String,
}

impl ValidateHook for Post {
    fn validate_extra(&self, _context: &RequestContext, mut errors: Errors) -> Errors {
        if self.title.len() < 10 {
            errors.add(
                ["title"],
                Classification::custom("LengthError"),
                "Life is too short",
            );
        }
        errors
    }
}

/// Same shape as [`Post`] without a hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
pub struct Draft {
    #[form("title")]
    #[binding(required)]
    pub title: String,
    #[form("content")]
    pub content: String,
}

/// Nested record with a required field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
pub struct Person {
    #[form("name")]
    #[binding(required)]
    pub name: String,
    #[form("email")]
    pub email: String,
}

/// Nested, optional, ignored, repeated, and file fields together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[binding(hook)]
pub struct BlogPost {
    #[form(nested)]
    #[serde(flatten)]
    pub post: Post,
    #[form("id")]
    #[binding(required)]
    pub id: i64,
    #[form(skip)]
    #[serde(skip)]
    pub ignored: String,
    #[form("rating")]
    pub ratings: Vec<i64>,
    #[form(nested)]
    pub author: Person,
    #[form(nested)]
    pub coauthor: Option<Box<Person>>,
    #[form("headerImage")]
    #[serde(skip)]
    pub header_image: Option<FileRef>,
    #[form("picture")]
    #[serde(skip)]
    pub pictures: Vec<FileRef>,
    #[form("unexported")]
    #[serde(skip)]
    unexported: String,
}

impl BlogPost {
    pub fn unexported(&self) -> &str {
        &self.unexported
    }
}

impl ValidateHook for BlogPost {
    fn validate_extra(&self, context: &RequestContext, errors: Errors) -> Errors {
        self.post.validate_extra(context, errors)
    }
}

/// Record whose owner is set by the caller, never by a payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
pub struct OwnedDraft {
    #[form("title")]
    #[binding(required)]
    pub title: String,
    #[form(skip)]
    #[serde(skip)]
    pub owner: String,
    #[form(nested)]
    pub reviewer: Reviewer,
    #[form(nested)]
    pub backup: Option<Box<Reviewer>>,
}

/// Nested record with a caller-owned field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
pub struct Reviewer {
    #[form("reviewer")]
    pub name: String,
    #[serde(skip_deserializing)]
    pub session: String,
}

/// Record reached through an embedded optional indirection.
#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct EmbedPerson {
    #[form(embed)]
    pub person: Option<Box<Person>>,
}

/// One field per catalog rule.
#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct SadForm {
    #[form("AlphaDash")]
    #[binding(alpha_dash)]
    pub alpha_dash: String,
    #[form("AlphaDashDot")]
    #[binding(alpha_dash_dot)]
    pub alpha_dash_dot: String,
    #[form("MinSize")]
    #[binding(min_size = 5)]
    pub min_size: String,
    #[form("MinSizeSlice")]
    #[binding(min_size = 5)]
    pub min_size_slice: Vec<String>,
    #[form("MaxSize")]
    #[binding(max_size = 1)]
    pub max_size: String,
    #[form("MaxSizeSlice")]
    #[binding(max_size = 1)]
    pub max_size_slice: Vec<String>,
    #[form("Email")]
    #[binding(email)]
    pub email: String,
    #[form("Url")]
    #[binding(url)]
    pub url: String,
    #[form("UrlEmpty")]
    #[binding(url)]
    pub url_empty: String,
}

/// Every scalar kind the coercer handles.
#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct Everything {
    #[form("i8")]
    pub tiny: i8,
    #[form("i64")]
    pub big: i64,
    #[form("u16")]
    pub small_unsigned: u16,
    #[form("usize")]
    pub index: usize,
    #[form("f32")]
    pub single: f32,
    #[form("f64")]
    pub double: f64,
    #[form("bool")]
    pub flag: bool,
    #[form("name")]
    pub name: String,
    #[form("maybe")]
    pub maybe: Option<u32>,
    #[form("flags")]
    pub flags: Vec<bool>,
    // validated, never bound
    #[binding(required)]
    pub computed: u32,
}

/// Shorthand for a fresh request context.
pub fn context() -> RequestContext {
    RequestContext::default()
}

/// `(label, classification)` pairs in order.
pub fn summary(errors: &Errors) -> Vec<(String, String)> {
    errors
        .iter()
        .map(|error| {
            (
                error.fields().join(","),
                error.kind().as_str().to_string(),
            )
        })
        .collect()
}

/// Build an owned `(label, classification)` list.
pub fn expected(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(label, class)| ((*label).to_string(), (*class).to_string()))
        .collect()
}
