//! Media type parsing for `Content-Type` and `Content-Disposition` values.

use std::collections::BTreeMap;

/// A parsed `type/subtype; key=value` header value.
///
/// The essence and parameter names are lowercased; parameter values keep
/// their case and have quoting removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parse a header value. Returns `None` when the leading token is empty.
    ///
    /// Malformed parameters are skipped rather than failing the whole value.
    pub fn parse(input: &str) -> Option<Self> {
        let mut segments = Segments::new(input);
        let essence = segments.next()?.trim().to_ascii_lowercase();
        if essence.is_empty() {
            return None;
        }

        let mut params = BTreeMap::new();
        for segment in segments {
            let Some((name, value)) = segment.split_once('=') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                continue;
            }
            params
                .entry(name)
                .or_insert_with(|| unquote(value.trim()));
        }
        Some(Self { essence, params })
    }

    /// Lowercased `type/subtype` (or disposition type).
    #[must_use]
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Parameter value by case-insensitive name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Non-empty `boundary` parameter.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary").filter(|value| !value.is_empty())
    }
}

// Splits on `;` outside of quoted strings.
struct Segments<'a> {
    rest: Option<&'a str>,
}

impl<'a> Segments<'a> {
    const fn new(input: &'a str) -> Self {
        Self { rest: Some(input) }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        let mut quoted = false;
        let mut escaped = false;
        for (index, ch) in rest.char_indices() {
            match ch {
                _ if escaped => escaped = false,
                '\\' if quoted => escaped = true,
                '"' => quoted = !quoted,
                ';' if !quoted => {
                    self.rest = rest.get(index + 1..);
                    return rest.get(..index);
                },
                _ => {},
            }
        }
        self.rest = None;
        Some(rest)
    }
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
    else {
        return value.to_string();
    };
    // Only special characters are escaped, so Windows paths survive intact.
    let mut output = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match chars.peek() {
            Some(&next) if ch == '\\' && is_special(next) => {
                output.push(next);
                chars.next();
            },
            _ => output.push(ch),
        }
    }
    output
}

const fn is_special(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '='
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_essence_and_params() {
        let Some(media) = MediaType::parse("Multipart/Form-Data; Boundary=abc123") else {
            panic!("expected media type");
        };
        assert_eq!(media.essence(), "multipart/form-data");
        assert_eq!(media.boundary(), Some("abc123"));
        assert_eq!(media.param("BOUNDARY"), Some("abc123"));
    }

    #[test]
    fn quoted_values_may_contain_separators() {
        let Some(media) =
            MediaType::parse(r#"form-data; name="a;b"; filename="say \"hi\".txt""#)
        else {
            panic!("expected disposition");
        };
        assert_eq!(media.essence(), "form-data");
        assert_eq!(media.param("name"), Some("a;b"));
        assert_eq!(media.param("filename"), Some(r#"say "hi".txt"#));

        let Some(media) = MediaType::parse(r#"form-data; filename="C:\docs\a.txt""#) else {
            panic!("expected disposition");
        };
        assert_eq!(media.param("filename"), Some(r"C:\docs\a.txt"));
    }

    #[test]
    fn empty_and_bare_values() {
        assert_eq!(MediaType::parse(""), None);
        assert_eq!(MediaType::parse(" ; charset=utf-8"), None);
        let Some(media) = MediaType::parse("multipart/form-data; boundary=; junk") else {
            panic!("expected media type");
        };
        assert_eq!(media.boundary(), None);
    }
}
