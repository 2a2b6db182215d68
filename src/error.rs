//! Centralized error handling for shadowptr.
//!
//! Every failure of a session is reported through [`ShadowError`]. None of them
//! is recoverable: once a session fails, its pointer bookkeeping is gone and the
//! traversal has to be restarted from scratch.
//!
//! ## Error Categories
//!
//! - **Archive Errors** ([`ShadowError::Io`], [`ShadowError::Serialization`]):
//!   failures of the underlying serializer, passed through unchanged.
//! - **Session Errors** ([`ShadowError::UseAfterComplete`]): the proxy was used
//!   after it was finalized.
//! - **Bookkeeping Errors** ([`ShadowError::UnresolvedAddress`],
//!   [`ShadowError::SizeMismatch`], [`ShadowError::OutOfRangeId`]): the pointer
//!   table could not be produced on save or does not match the load traversal.
//! - **Internal Errors** ([`ShadowError::Internal`]): limits of the id space.
//!
//! ## Usage
//!
//! ```rust
//! use shadowptr::{BincodeWriter, OutputArchive, Ptr, ShadowError};
//!
//! let outside = 7u32;
//! let dangling = Ptr::new(&outside);
//!
//! let mut sink = BincodeWriter::new(Vec::new());
//! let mut archive = OutputArchive::new(&mut sink);
//! archive.invoke(&dangling)?;
//!
//! match archive.complete() {
//!     Err(ShadowError::UnresolvedAddress { pointer, .. }) => assert_eq!(pointer, 0),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! # Ok::<(), ShadowError>(())
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

use bincode::error::{DecodeError, EncodeError};

use crate::mapper::ObjectId;

/// A specialized `Result` type for shadowptr operations.
pub type Result<T> = std::result::Result<T, ShadowError>;

/// The error enum covering every failure of a save or load session.
///
/// This type is `Clone` so that an error raised while a proxy is dropped can be
/// parked inside the underlying archive and handed out again later. I/O errors
/// are wrapped in `Arc` for that reason.
#[derive(Debug, Clone)]
pub enum ShadowError {
    /// Low-level I/O failure of the underlying archive's stream.
    Io(Arc<io::Error>),

    /// Encoding or decoding failure reported by the underlying archive.
    Serialization(String),

    /// A value was passed to a proxy after `complete()` already ran.
    UseAfterComplete,

    /// A pointer targets a location that the save traversal never visited, so it
    /// points outside of the co-serialized object graph.
    UnresolvedAddress {
        /// Index of the pointer site in encounter order.
        pointer: usize,
        /// The unresolved target address.
        address: usize,
    },

    /// The pointer table read back from the archive does not have one entry per
    /// pointer site of the load traversal.
    SizeMismatch {
        /// Number of pointer sites visited by the load traversal.
        expected: usize,
        /// Number of entries in the stored table.
        found: usize,
    },

    /// A pointer table entry names an object that the load traversal never
    /// visited.
    OutOfRangeId {
        /// Index of the pointer site in encounter order.
        pointer: usize,
        /// The offending id.
        id: ObjectId,
        /// Number of ids known to the load traversal, including null.
        visited: usize,
    },

    /// Internal limit violated, such as running out of object ids.
    Internal(String),
}

impl fmt::Display for ShadowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::Serialization(s) => write!(f, "Serialization Error: {s}"),
            Self::UseAfterComplete => {
                write!(f, "Session Error: value passed after the archive was completed")
            }
            Self::UnresolvedAddress { pointer, address } => write!(
                f,
                "Unresolved Address: pointer {pointer} targets {address:#x}, which was not visited by the traversal"
            ),
            Self::SizeMismatch { expected, found } => write!(
                f,
                "Size Mismatch: stored pointer table has {found} entries, traversal visited {expected} pointer sites"
            ),
            Self::OutOfRangeId {
                pointer,
                id,
                visited,
            } => write!(
                f,
                "Out Of Range Id: pointer {pointer} refers to object {id}, but only {visited} objects were visited"
            ),
            Self::Internal(s) => write!(f, "Internal Error: {s}"),
        }
    }
}

impl std::error::Error for ShadowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ShadowError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<EncodeError> for ShadowError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Io { inner, .. } => Self::Io(Arc::new(inner)),
            other => Self::Serialization(other.to_string()),
        }
    }
}

impl From<DecodeError> for ShadowError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io { inner, .. } => Self::Io(Arc::new(inner)),
            other => Self::Serialization(other.to_string()),
        }
    }
}
