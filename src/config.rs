//! Options for the bincode-backed archives.
//!
//! The saving and the loading archive of a pair must be built with the same
//! options, as bincode does not record its configuration in the stream.

/// How integers are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntEncoding {
    /// Variable-length integers, as in `bincode::config::standard()`.
    #[default]
    Variable,
    /// Fixed-width little-endian integers.
    Fixed,
}

/// Configuration of a [`BincodeWriter`](crate::BincodeWriter) or
/// [`BincodeReader`](crate::BincodeReader).
///
/// ```rust
/// use shadowptr::config::{IntEncoding, Options};
///
/// let options = Options::new().with_int_encoding(IntEncoding::Fixed);
/// assert_eq!(options.int_encoding(), IntEncoding::Fixed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    int_encoding: IntEncoding,
}

impl Options {
    /// The default options: variable-length integers.
    pub const fn new() -> Self {
        Self {
            int_encoding: IntEncoding::Variable,
        }
    }

    /// Sets the integer encoding.
    #[must_use]
    pub const fn with_int_encoding(mut self, int_encoding: IntEncoding) -> Self {
        self.int_encoding = int_encoding;
        self
    }

    /// Returns the integer encoding.
    pub const fn int_encoding(&self) -> IntEncoding {
        self.int_encoding
    }
}
