//! Uploaded file references.
//!
//! A [`FilePart`] is produced by a multipart parser; records hold cheap
//! [`FileRef`] handles to it and never copy the content.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::ops::Deref;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Storage backing one uploaded file.
pub enum FileContent {
    /// Content held in memory.
    Memory(Vec<u8>),
    /// Content spilled to a temporary file, removed on drop.
    Disk(NamedTempFile),
}

impl fmt::Debug for FileContent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => formatter
                .debug_struct("Memory")
                .field("len", &bytes.len())
                .finish(),
            Self::Disk(file) => formatter
                .debug_struct("Disk")
                .field("path", &file.path())
                .finish(),
        }
    }
}

/// One uploaded file: client-supplied name, declared type, and content.
#[derive(Debug)]
pub struct FilePart {
    filename: String,
    content_type: Option<String>,
    size: u64,
    content: FileContent,
}

impl FilePart {
    /// Create a part whose content lives in memory.
    pub fn in_memory(
        filename: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            size: bytes.len() as u64,
            content: FileContent::Memory(bytes),
        }
    }

    /// Create a part whose content was written to a temporary file.
    pub fn on_disk(
        filename: impl Into<String>,
        content_type: Option<String>,
        file: NamedTempFile,
        size: u64,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            size,
            content: FileContent::Disk(file),
        }
    }

    /// Client-supplied file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Declared content type of the part, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Content length in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns true when the content lives in a temporary file.
    #[must_use]
    pub const fn is_spilled(&self) -> bool {
        matches!(self.content, FileContent::Disk(_))
    }

    /// Borrow the backing storage.
    #[must_use]
    pub const fn content(&self) -> &FileContent {
        &self.content
    }

    /// Open a fresh reader positioned at the start of the content.
    pub fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match &self.content {
            FileContent::Memory(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            FileContent::Disk(file) => Ok(Box::new(file.reopen()?)),
        }
    }

    /// Read the whole content into memory.
    pub fn read_to_vec(&self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
        self.open()?.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// Shared handle to an uploaded file.
///
/// Equality is identity: two handles are equal when they point at the same
/// upload.
#[derive(Clone)]
pub struct FileRef(Arc<FilePart>);

impl FileRef {
    /// Wrap a parsed part.
    #[must_use]
    pub fn new(part: FilePart) -> Self {
        Self(Arc::new(part))
    }

    /// Borrow the underlying part.
    #[must_use]
    pub fn part(&self) -> &FilePart {
        &self.0
    }
}

impl From<FilePart> for FileRef {
    fn from(part: FilePart) -> Self {
        Self::new(part)
    }
}

impl Deref for FileRef {
    type Target = FilePart;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for FileRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FileRef {}

impl fmt::Debug for FileRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FileRef")
            .field("filename", &self.0.filename)
            .field("size", &self.0.size)
            .field("spilled", &self.0.is_spilled())
            .finish()
    }
}
