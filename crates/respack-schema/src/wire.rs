//! Context-free binary primitives via Postcard.
//!
//! Every value written here is self-delimiting: strings and byte blobs carry
//! a varint length prefix, sequences a varint count. Nothing refers to data
//! outside the value itself (no shared string tables, no back-pointers), so
//! a value can be decoded in isolation starting from the offset it was
//! written at.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural errors in a package stream.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The stream ended in the middle of a value.
    #[error("Unexpected end of stream while reading {0}")]
    Truncated(&'static str),

    /// A string field did not contain valid UTF-8.
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// Bytes were left over after the last expected value.
    #[error("{0} trailing bytes after the last value")]
    TrailingBytes(usize),

    /// Two content entries share the same path.
    #[error("Duplicate content path: {0}")]
    DuplicatePath(String),

    /// Any other Postcard failure.
    #[error("Serialization error: {0}")]
    Postcard(#[from] postcard::Error),
}

impl FormatError {
    fn from_postcard(err: postcard::Error, what: &'static str) -> Self {
        match err {
            postcard::Error::DeserializeUnexpectedEnd => Self::Truncated(what),
            postcard::Error::DeserializeBadUtf8 => Self::InvalidUtf8(what),
            other => Self::Postcard(other),
        }
    }
}

/// Appends context-free values to an in-memory buffer.
#[derive(Debug, Default)]
pub struct ContextFreeWriter {
    buf: Vec<u8>,
}

impl ContextFreeWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Postcard`] if the value cannot be serialized.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), FormatError> {
        self.buf.extend_from_slice(&postcard::to_allocvec(value)?);
        Ok(())
    }

    /// Append a length-prefixed byte blob.
    ///
    /// Postcard encodes a `[u8]` sequence as a varint length followed by the
    /// raw bytes, which is exactly what [`ContextFreeReader::read_bytes`] expects.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Postcard`] if serialization fails.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.write(bytes)
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads context-free values from a borrowed buffer.
#[derive(Debug, Clone)]
pub struct ContextFreeReader<'a> {
    input: &'a [u8],
    consumed: usize,
}

impl<'a> ContextFreeReader<'a> {
    /// Start reading at the beginning of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, consumed: 0 }
    }

    /// Read one value. `what` names the field in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Truncated`] if the input ends early,
    /// [`FormatError::InvalidUtf8`] for bad strings, or
    /// [`FormatError::Postcard`] for any other decoding failure.
    pub fn read<T: Deserialize<'a>>(&mut self, what: &'static str) -> Result<T, FormatError> {
        let (value, rest) = postcard::take_from_bytes::<T>(self.input)
            .map_err(|e| FormatError::from_postcard(e, what))?;
        self.consumed += self.input.len() - rest.len();
        self.input = rest;
        Ok(value)
    }

    /// Read a length-prefixed byte blob without copying it.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn read_bytes(&mut self, what: &'static str) -> Result<&'a [u8], FormatError> {
        self.read::<&'a [u8]>(what)
    }

    /// Bytes consumed since the reader was created.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Whether the whole input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Require that the input was consumed exactly.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::TrailingBytes`] if anything is left unread.
    pub fn finish(self) -> Result<(), FormatError> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(FormatError::TrailingBytes(self.input.len()))
        }
    }
}
