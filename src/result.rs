//! Error types that can be emitted from this library

use displaydoc::Display;
use thiserror::Error;

use std::borrow::Cow;
use std::io;

/// Generic result type with ProbeError as its error variant
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Error type for archive probing
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// i/o error: {0}
    Io(#[from] io::Error),

    /// invalid Zip archive: {0}
    InvalidArchive(Cow<'static, str>),

    /// unsupported Zip archive: {0}
    UnsupportedArchive(Cow<'static, str>),

    /// span at offset {offset} with length {length} exceeds file size {file_size}
    SpanOutOfBounds {
        offset: u64,
        length: u64,
        file_size: u64,
    },

    /// invalid raw deflate stream: {0}
    InvalidDeflate(Cow<'static, str>),
}

pub(crate) fn invalid_archive<T, M: Into<Cow<'static, str>>>(message: M) -> ProbeResult<T> {
    Err(ProbeError::InvalidArchive(message.into()))
}

impl From<ProbeError> for io::Error {
    fn from(err: ProbeError) -> io::Error {
        let kind = match &err {
            ProbeError::Io(err) => err.kind(),
            ProbeError::InvalidArchive(_) => io::ErrorKind::InvalidData,
            ProbeError::UnsupportedArchive(_) => io::ErrorKind::Unsupported,
            ProbeError::SpanOutOfBounds { .. } => io::ErrorKind::UnexpectedEof,
            ProbeError::InvalidDeflate(_) => io::ErrorKind::InvalidData,
        };

        io::Error::new(kind, err)
    }
}
