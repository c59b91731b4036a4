//! Error types for iconset loading.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for bundle loading and byte-source access.
#[derive(Debug)]
pub struct IconsetError {
    /// The kind of error that occurred.
    kind: IconsetErrorKind,
    /// The path involved in the error, if any.
    path: Option<PathBuf>,
    /// The underlying source error, if any.
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// The kind of iconset error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconsetErrorKind {
    /// No `icondef.xml` could be read at the bundle origin.
    ManifestMissing,
    /// The manifest is not well-formed XML or its root is not `icondef`.
    ManifestMalformed,
    /// None of an icon's image candidates could be decoded.
    IconDecodeFailed,
    /// A sound from an archive was not unpacked.
    SoundUnpackSkipped,
    /// A file inside the source does not exist.
    NotFound,
    /// The origin is neither a directory nor a recognised archive.
    UnsupportedSource,
    /// The archive could not be opened or read.
    Archive,
    /// Invalid data or encoding.
    InvalidData,
    /// Any other I/O failure.
    Io,
}

impl IconsetError {
    /// Creates a new error.
    pub fn new(
        kind: IconsetErrorKind,
        path: Option<PathBuf>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self { kind, path, source }
    }

    /// Creates an error from an I/O error and path.
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => IconsetErrorKind::NotFound,
            io::ErrorKind::InvalidData => IconsetErrorKind::InvalidData,
            _ => IconsetErrorKind::Io,
        };
        Self::new(kind, Some(path.into()), Some(Box::new(err)))
    }

    /// Creates a "not found" error for the given path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(IconsetErrorKind::NotFound, Some(path.into()), None)
    }

    /// Creates an error of `kind` for `path` with a message as its source.
    pub fn with_message(
        kind: IconsetErrorKind,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            kind,
            Some(path.into()),
            Some(Box::new(io::Error::other(message.into()))),
        )
    }

    /// Re-tag this error with a different kind, keeping path and source.
    pub fn with_kind(mut self, kind: IconsetErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> IconsetErrorKind {
        self.kind
    }

    /// Returns the path involved in the error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Returns true if this error indicates the file was not found.
    pub fn is_not_found(&self) -> bool {
        self.kind == IconsetErrorKind::NotFound
    }
}

impl fmt::Display for IconsetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, &self.source) {
            (Some(path), Some(source)) => {
                write!(f, "{}: {}: {}", self.kind, path.display(), source)
            }
            (Some(path), None) => write!(f, "{}: {}", self.kind, path.display()),
            (None, Some(source)) => write!(f, "{}: {}", self.kind, source),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl fmt::Display for IconsetErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconsetErrorKind::ManifestMissing => write!(f, "manifest missing"),
            IconsetErrorKind::ManifestMalformed => write!(f, "manifest malformed"),
            IconsetErrorKind::IconDecodeFailed => write!(f, "icon decode failed"),
            IconsetErrorKind::SoundUnpackSkipped => write!(f, "sound unpack skipped"),
            IconsetErrorKind::NotFound => write!(f, "file not found"),
            IconsetErrorKind::UnsupportedSource => write!(f, "unsupported source"),
            IconsetErrorKind::Archive => write!(f, "archive error"),
            IconsetErrorKind::InvalidData => write!(f, "invalid data"),
            IconsetErrorKind::Io => write!(f, "i/o error"),
        }
    }
}

impl std::error::Error for IconsetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for IconsetError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => IconsetErrorKind::NotFound,
            io::ErrorKind::InvalidData => IconsetErrorKind::InvalidData,
            _ => IconsetErrorKind::Io,
        };
        Self::new(kind, None, Some(Box::new(err)))
    }
}

/// A specialized Result type for iconset operations.
pub type IconsetResult<T> = Result<T, IconsetError>;
