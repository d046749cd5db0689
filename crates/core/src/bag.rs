//! Decoded request inputs: the string and file mappings binding reads from.

use crate::files::FileRef;
use std::collections::BTreeMap;
use std::fmt;

/// Key to ordered string values.
pub type FormValues = BTreeMap<String, Vec<String>>;

/// Key to ordered file references.
pub type FileValues = BTreeMap<String, Vec<FileRef>>;

/// Borrowed view over the inputs of one bind call.
///
/// A missing key means "not sent", never an error.
#[derive(Debug, Clone, Copy)]
pub struct InputBag<'a> {
    values: &'a FormValues,
    files: Option<&'a FileValues>,
}

impl<'a> InputBag<'a> {
    /// Bag over string values only.
    #[must_use]
    pub const fn new(values: &'a FormValues) -> Self {
        Self {
            values,
            files: None,
        }
    }

    /// Bag over string values and uploaded files.
    #[must_use]
    pub const fn with_files(values: &'a FormValues, files: &'a FileValues) -> Self {
        Self {
            values,
            files: Some(files),
        }
    }

    /// Values sent under `key`.
    #[must_use]
    pub fn values(&self, key: &str) -> Option<&'a [String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// Files sent under `key`.
    #[must_use]
    pub fn files(&self, key: &str) -> Option<&'a [FileRef]> {
        self.files?.get(key).map(Vec::as_slice)
    }
}

/// Parsed multipart payload: non-file values and uploaded files.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    /// Non-file parts by name.
    pub values: FormValues,
    /// File parts by name.
    pub files: FileValues,
}

impl MultipartForm {
    /// Borrow both mappings as an [`InputBag`].
    #[must_use]
    pub const fn bag(&self) -> InputBag<'_> {
        InputBag::with_files(&self.values, &self.files)
    }

    /// Append a non-file value.
    pub fn push_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// Append a file.
    pub fn push_file(&mut self, name: impl Into<String>, file: FileRef) {
        self.files.entry(name.into()).or_default().push(file);
    }
}

/// Percent-escape that is not followed by two hex digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEncodedError {
    offset: usize,
    escape: String,
}

impl UrlEncodedError {
    /// Byte offset of the bad escape.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for UrlEncodedError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "invalid URL escape {:?}", self.escape)
    }
}

impl std::error::Error for UrlEncodedError {}

/// Collect `key=value` pairs into an owned mapping.
pub fn form_values<I, K, V>(pairs: I) -> FormValues
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut values = FormValues::new();
    for (key, value) in pairs {
        values.entry(key.into()).or_default().push(value.into());
    }
    values
}

/// Decode an `application/x-www-form-urlencoded` payload into `into`.
///
/// Repeated keys keep their order. The payload is rejected as a whole when
/// it contains a malformed percent-escape, leaving `into` untouched.
pub fn parse_urlencoded(input: &[u8], into: &mut FormValues) -> Result<(), UrlEncodedError> {
    check_escapes(input)?;
    for (key, value) in url::form_urlencoded::parse(input) {
        into.entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    Ok(())
}

fn check_escapes(input: &[u8]) -> Result<(), UrlEncodedError> {
    let mut index = 0;
    while let Some(offset) = input
        .get(index..)
        .and_then(|rest| rest.iter().position(|byte| *byte == b'%'))
    {
        let start = index + offset;
        let digits = input.get(start + 1..start + 3);
        if !digits.is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit)) {
            let end = input.len().min(start + 3);
            let escape = input
                .get(start..end)
                .map(|raw| String::from_utf8_lossy(raw).into_owned())
                .unwrap_or_default();
            return Err(UrlEncodedError {
                offset: start,
                escape,
            });
        }
        index = start + 3;
    }
    Ok(())
}
