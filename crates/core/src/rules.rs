//! Declarative constraint catalog.

use crate::shape::Constrained;
use formbind_shared::{Classification, Errors};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Local-part and domain grammar for `email`. Unanchored: a match anywhere
/// in the value passes.
const EMAIL_PATTERN: &str = r"[\w!#$%&'*+/=?^`{|}~-]+(?:\.[\w!#$%&'*+/=?^`{|}~-]+)*@(?:[\w](?:[\w-]*[\w])?\.)+[a-zA-Z0-9](?:[\w-]*[\w])?";

/// Scheme, host, and optional path grammar for `url`. Unanchored.
const URL_PATTERN: &str = r"(?:http|https)://[\w_-]+(?:\.[\w_-]+)+(?:[\w.,@?^=%&;:/~+#-]*[\w@?^=%&;/~+#-])?";

// An unparsable pattern rejects every value rather than accepting it.
static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| ascii_regex(EMAIL_PATTERN));
static URL: LazyLock<Option<Regex>> = LazyLock::new(|| ascii_regex(URL_PATTERN));

fn ascii_regex(pattern: &str) -> Option<Regex> {
    regex::RegexBuilder::new(pattern)
        .unicode(false)
        .build()
        .ok()
}

fn pattern_matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|regex| regex.is_match(value))
}

/// One constraint from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Value must differ from its zero value.
    Required,
    /// Only `[A-Za-z0-9_-]`.
    AlphaDash,
    /// Only `[A-Za-z0-9_.-]`.
    AlphaDashDot,
    /// Character count (strings) or length (sequences) at least N.
    MinSize(usize),
    /// Character count (strings) or length (sequences) at most N.
    MaxSize(usize),
    /// Must contain an email address.
    Email,
    /// Empty, or must contain an http(s) URL.
    Url,
}

impl Rule {
    /// Rule name, also used as the violation message.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Required => "Required",
            Self::AlphaDash => "AlphaDash",
            Self::AlphaDashDot => "AlphaDashDot",
            Self::MinSize(_) => "MinSize",
            Self::MaxSize(_) => "MaxSize",
            Self::Email => "Email",
            Self::Url => "Url",
        }
    }

    /// Classification of a violation.
    #[must_use]
    pub const fn classification(self) -> Classification {
        match self {
            Self::Required => Classification::Required,
            Self::AlphaDash => Classification::AlphaDash,
            Self::AlphaDashDot => Classification::AlphaDashDot,
            Self::MinSize(_) => Classification::MinSize,
            Self::MaxSize(_) => Classification::MaxSize,
            Self::Email => Classification::Email,
            Self::Url => Classification::Url,
        }
    }

    /// Returns true when `value` violates the rule.
    pub fn violated_by(self, value: &dyn Constrained) -> bool {
        match self {
            Self::Required => value.is_zero(),
            Self::AlphaDash => !value.render().chars().all(is_alpha_dash),
            Self::AlphaDashDot => !value
                .render()
                .chars()
                .all(|ch| ch == '.' || is_alpha_dash(ch)),
            Self::MinSize(min) => value.measure().is_some_and(|size| size < min),
            Self::MaxSize(max) => value.measure().is_some_and(|size| size > max),
            Self::Email => !pattern_matches(&EMAIL, &value.render()),
            Self::Url => {
                let rendered = value.render();
                !rendered.is_empty() && !pattern_matches(&URL, &rendered)
            },
        }
    }
}

const fn is_alpha_dash(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

impl fmt::Display for Rule {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinSize(bound) | Self::MaxSize(bound) => {
                write!(formatter, "{}({bound})", self.name())
            },
            _ => formatter.write_str(self.name()),
        }
    }
}

/// Apply `rule` to one field, appending at most one error labelled `field`.
pub fn check(rule: Rule, field: &str, value: &dyn Constrained, errors: &mut Errors) {
    if rule.violated_by(value) {
        errors.add([field], rule.classification(), rule.name());
    }
}
