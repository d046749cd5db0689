//! Streaming `multipart/form-data` reader.
//!
//! Parts are read sequentially from any [`Read`] source. Non-file parts are
//! collected as strings; file parts stay in memory while the shared budget
//! lasts and are spilled to a temporary file once a part would exceed it.

use crate::content_type::MediaType;
use formbind_core::{FilePart, FileRef, MultipartForm};
use std::io::{self, Read, Write};
use tempfile::NamedTempFile;
use tracing::debug;

const READ_CHUNK: usize = 8 * 1024;
const MAX_HEADER_BYTES: usize = 16 * 1024;

/// Extra allowance for non-file values on top of the file budget.
pub const VALUE_ALLOWANCE: u64 = 10 << 20;

/// Failure while reading a multipart body.
#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    /// The content type is not `multipart/form-data`.
    #[error("request Content-Type isn't multipart/form-data")]
    NotMultipart,
    /// The content type carries no usable boundary.
    #[error("no multipart boundary param in Content-Type")]
    MissingBoundary,
    /// The body does not follow the multipart grammar.
    #[error("multipart: {0}")]
    Malformed(&'static str),
    /// Non-file values exceed their allowance, or a header block is too big.
    #[error("multipart: message too large")]
    TooLarge,
    /// Reading the body or writing a spill file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reader over one multipart body.
#[derive(Debug)]
pub struct MultipartReader<R> {
    source: R,
    delimiter: Vec<u8>,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl<R: Read> MultipartReader<R> {
    /// Create a reader for `boundary`.
    pub fn new(source: R, boundary: &str) -> Result<Self, MultipartError> {
        if boundary.is_empty() {
            return Err(MultipartError::MissingBoundary);
        }
        let mut delimiter = b"\r\n--".to_vec();
        delimiter.extend_from_slice(boundary.as_bytes());
        Ok(Self {
            source,
            delimiter,
            // Lets the opening boundary match the same delimiter as the rest.
            buffer: b"\r\n".to_vec(),
            exhausted: false,
        })
    }

    /// Create a reader from a `Content-Type` header value.
    pub fn from_content_type(source: R, content_type: &str) -> Result<Self, MultipartError> {
        let media = MediaType::parse(content_type).ok_or(MultipartError::NotMultipart)?;
        if media.essence() != "multipart/form-data" {
            return Err(MultipartError::NotMultipart);
        }
        let boundary = media.boundary().ok_or(MultipartError::MissingBoundary)?;
        Self::new(source, boundary)
    }

    /// Read every part into a [`MultipartForm`].
    ///
    /// `max_memory` bytes of file content are kept in memory across all
    /// parts; a file that would cross the budget goes to disk. Non-file
    /// values may use up to `max_memory` plus [`VALUE_ALLOWANCE`] in total.
    pub fn read_form(self, max_memory: u64) -> Result<MultipartForm, MultipartError> {
        self.read_form_with_allowance(max_memory, VALUE_ALLOWANCE)
    }

    fn read_form_with_allowance(
        mut self,
        max_memory: u64,
        value_allowance: u64,
    ) -> Result<MultipartForm, MultipartError> {
        let mut form = MultipartForm::default();
        let mut file_budget = max_memory;
        let mut value_budget = max_memory.saturating_add(value_allowance);

        // Preamble before the first boundary is discarded.
        self.stream_until_delimiter(|_| Ok(()))?;
        while self.after_delimiter()? {
            let headers = self.read_headers()?;
            let disposition = headers
                .content_disposition
                .as_deref()
                .and_then(MediaType::parse);
            let name = disposition
                .as_ref()
                .and_then(|media| media.param("name"))
                .unwrap_or_default()
                .to_string();
            let filename = disposition
                .as_ref()
                .and_then(|media| media.param("filename"))
                .map(base_name)
                .filter(|filename| !filename.is_empty())
                .map(str::to_string);

            if name.is_empty() {
                self.stream_until_delimiter(|_| Ok(()))?;
                continue;
            }

            match filename {
                None => {
                    let value = self.read_value(&mut value_budget)?;
                    form.push_value(name, value);
                },
                Some(filename) => {
                    let part = self.read_file(
                        &name,
                        filename,
                        headers.content_type,
                        &mut file_budget,
                    )?;
                    form.push_file(name, FileRef::new(part));
                },
            }
        }
        Ok(form)
    }

    fn read_value(&mut self, budget: &mut u64) -> Result<String, MultipartError> {
        let mut bytes = Vec::new();
        let mut remaining = *budget;
        self.stream_until_delimiter(|chunk| {
            let len = chunk.len() as u64;
            if len > remaining {
                return Err(MultipartError::TooLarge);
            }
            remaining -= len;
            bytes.extend_from_slice(chunk);
            Ok(())
        })?;
        *budget = remaining;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_file(
        &mut self,
        name: &str,
        filename: String,
        content_type: Option<String>,
        budget: &mut u64,
    ) -> Result<FilePart, MultipartError> {
        let limit = *budget;
        let mut sink = FileSink::Memory(Vec::new());
        let mut size: u64 = 0;
        self.stream_until_delimiter(|chunk| {
            size += chunk.len() as u64;
            match &mut sink {
                FileSink::Memory(bytes) if size <= limit => bytes.extend_from_slice(chunk),
                FileSink::Memory(bytes) => {
                    debug!(
                        target: "formbind::multipart",
                        field = name,
                        budget = limit,
                        "spilling file part to disk"
                    );
                    let mut file = NamedTempFile::new()?;
                    file.write_all(bytes)?;
                    file.write_all(chunk)?;
                    sink = FileSink::Disk(file);
                },
                FileSink::Disk(file) => file.write_all(chunk)?,
            }
            Ok(())
        })?;

        match sink {
            FileSink::Memory(bytes) => {
                *budget = limit.saturating_sub(size);
                Ok(FilePart::in_memory(filename, content_type, bytes))
            },
            FileSink::Disk(mut file) => {
                file.flush()?;
                Ok(FilePart::on_disk(filename, content_type, file, size))
            },
        }
    }

    /// Consume the two bytes after a delimiter. Returns false at the final
    /// boundary.
    fn after_delimiter(&mut self) -> Result<bool, MultipartError> {
        self.fill_to(2)?;
        if self.buffer.starts_with(b"--") {
            return Ok(false);
        }
        // Transport padding is allowed before the line break.
        loop {
            match self.buffer.first() {
                Some(b' ' | b'\t') => {
                    self.buffer.remove(0);
                },
                Some(_) => break,
                None => {
                    if !self.fill()? {
                        return Err(MultipartError::Malformed("unexpected end of body"));
                    }
                },
            }
        }
        self.fill_to(2)?;
        if self.buffer.starts_with(b"\r\n") {
            self.buffer.drain(..2);
        } else if self.buffer.starts_with(b"\n") {
            self.buffer.drain(..1);
        } else {
            return Err(MultipartError::Malformed("expected line break after boundary"));
        }
        Ok(true)
    }

    fn read_headers(&mut self) -> Result<PartHeaders, MultipartError> {
        let end = loop {
            // A part with no headers at all starts with the blank line.
            if self.buffer.starts_with(b"\r\n") {
                self.buffer.drain(..2);
                return Ok(PartHeaders::default());
            }
            if let Some(end) = find(&self.buffer, b"\r\n\r\n") {
                break end;
            }
            if self.buffer.len() > MAX_HEADER_BYTES {
                return Err(MultipartError::TooLarge);
            }
            if !self.fill()? {
                return Err(MultipartError::Malformed("unexpected end of part headers"));
            }
        };
        if end > MAX_HEADER_BYTES {
            return Err(MultipartError::TooLarge);
        }

        let block: Vec<u8> = self.buffer.drain(..end + 4).take(end).collect();
        let text = String::from_utf8_lossy(&block);
        let mut headers = PartHeaders::default();
        for line in text.split("\r\n") {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            if name.trim().eq_ignore_ascii_case("content-disposition") {
                headers.content_disposition.get_or_insert(value);
            } else if name.trim().eq_ignore_ascii_case("content-type") {
                headers.content_type.get_or_insert(value);
            }
        }
        Ok(headers)
    }

    /// Feed the body of the current part to `emit`, then consume the
    /// delimiter that ends it.
    fn stream_until_delimiter<F>(&mut self, mut emit: F) -> Result<(), MultipartError>
    where
        F: FnMut(&[u8]) -> Result<(), MultipartError>,
    {
        loop {
            if let Some(index) = find(&self.buffer, &self.delimiter) {
                if let Some(chunk) = self.buffer.get(..index) {
                    emit(chunk)?;
                }
                self.buffer.drain(..index + self.delimiter.len());
                return Ok(());
            }

            // Everything except a possible delimiter prefix is safe to emit.
            let keep = self.delimiter.len().saturating_sub(1);
            let safe = self.buffer.len().saturating_sub(keep);
            if safe > 0 {
                if let Some(chunk) = self.buffer.get(..safe) {
                    emit(chunk)?;
                }
                self.buffer.drain(..safe);
            }
            if !self.fill()? {
                return Err(MultipartError::Malformed("unexpected end of body"));
            }
        }
    }

    fn fill_to(&mut self, len: usize) -> Result<(), MultipartError> {
        while self.buffer.len() < len {
            if !self.fill()? {
                return Err(MultipartError::Malformed("unexpected end of body"));
            }
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<bool, MultipartError> {
        if self.exhausted {
            return Ok(false);
        }
        let mut chunk = [0_u8; READ_CHUNK];
        loop {
            match self.source.read(&mut chunk) {
                Ok(0) => {
                    self.exhausted = true;
                    return Ok(false);
                },
                Ok(read) => {
                    self.buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
                    return Ok(true);
                },
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {},
                Err(error) => return Err(error.into()),
            }
        }
    }
}

enum FileSink {
    Memory(Vec<u8>),
    Disk(NamedTempFile),
}

#[derive(Debug, Default)]
struct PartHeaders {
    content_disposition: Option<String>,
    content_type: Option<String>,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// Client paths are reduced to their last component.
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}
