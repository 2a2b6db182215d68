//! The contract with the underlying serializer, and its bincode implementation.
//!
//! The shadow traversal never encodes values itself. It relies on an archive
//! that can save or load any serde value as one atomic call, including the
//! `Vec<u32>` pointer table written at the end of a session.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{IntEncoding, Options};
use crate::error::{Result, ShadowError};

/// The direction an archive or a shadow mapper works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Values are written.
    Save,
    /// Values are read.
    Load,
}

impl Direction {
    /// Returns true for [`Direction::Save`].
    pub const fn is_saving(self) -> bool {
        matches!(self, Self::Save)
    }

    /// Returns true for [`Direction::Load`].
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Load)
    }
}

/// An underlying serializer that a proxy can wrap.
pub trait Archive {
    /// The direction this archive works in.
    const DIRECTION: Direction;

    /// Stores an error raised while a proxy over this archive was dropped.
    ///
    /// `Drop` cannot return errors, so the proxy hands them to the archive. An
    /// implementation must report the error to its owner later, for example
    /// from its next operation.
    fn defer_error(&mut self, error: ShadowError);
}

/// An archive in save mode.
pub trait Saving: Archive {
    /// Writes one value.
    fn save<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()>;
}

/// An archive in load mode.
pub trait Loading: Archive {
    /// Reads one value.
    fn load<T: DeserializeOwned>(&mut self) -> Result<T>;
}

/// Remembers the first deferred error of an archive.
#[derive(Debug, Default)]
struct Deferred(Option<ShadowError>);

impl Deferred {
    fn store(&mut self, error: ShadowError) {
        if self.0.is_none() {
            self.0 = Some(error);
        }
    }

    fn check(&self) -> Result<()> {
        match &self.0 {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn take(&mut self) -> Result<()> {
        match self.0.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// A saving archive that encodes values with bincode into a `Write`.
///
/// ```rust
/// use shadowptr::{BincodeWriter, Saving};
///
/// let mut writer = BincodeWriter::new(Vec::new());
/// writer.save(&42u32)?;
/// let bytes = writer.finish()?;
/// assert_eq!(bytes, vec![42]);
/// # Ok::<(), shadowptr::ShadowError>(())
/// ```
#[derive(Debug)]
pub struct BincodeWriter<W: Write> {
    writer: W,
    options: Options,
    deferred: Deferred,
}

impl<W: Write> BincodeWriter<W> {
    /// Creates a writer with default options.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, Options::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(writer: W, options: Options) -> Self {
        Self {
            writer,
            options,
            deferred: Deferred::default(),
        }
    }

    /// Returns the options in use.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Returns a reference to the inner writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns the error of a session that failed while its proxy was dropped,
    /// or a flush error.
    pub fn finish(mut self) -> Result<W> {
        self.deferred.take()?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Archive for BincodeWriter<W> {
    const DIRECTION: Direction = Direction::Save;

    fn defer_error(&mut self, error: ShadowError) {
        self.deferred.store(error);
    }
}

impl<W: Write> Saving for BincodeWriter<W> {
    fn save<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.deferred.check()?;
        let standard = bincode::config::standard();
        match self.options.int_encoding() {
            IntEncoding::Variable => {
                bincode::serde::encode_into_std_write(value, &mut self.writer, standard)?
            }
            IntEncoding::Fixed => bincode::serde::encode_into_std_write(
                value,
                &mut self.writer,
                standard.with_fixed_int_encoding(),
            )?,
        };
        Ok(())
    }
}

/// A loading archive that decodes values with bincode from a `Read`.
#[derive(Debug)]
pub struct BincodeReader<R: Read> {
    reader: R,
    options: Options,
    deferred: Deferred,
}

impl<R: Read> BincodeReader<R> {
    /// Creates a reader with default options.
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, Options::default())
    }

    /// Creates a reader with explicit options.
    pub fn with_options(reader: R, options: Options) -> Self {
        Self {
            reader,
            options,
            deferred: Deferred::default(),
        }
    }

    /// Returns the options in use.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Returns a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns the inner reader.
    ///
    /// # Errors
    ///
    /// Returns the error of a session that failed while its proxy was dropped.
    pub fn finish(mut self) -> Result<R> {
        self.deferred.take()?;
        Ok(self.reader)
    }
}

impl<R: Read> Archive for BincodeReader<R> {
    const DIRECTION: Direction = Direction::Load;

    fn defer_error(&mut self, error: ShadowError) {
        self.deferred.store(error);
    }
}

impl<R: Read> Loading for BincodeReader<R> {
    fn load<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.deferred.check()?;
        let standard = bincode::config::standard();
        let value = match self.options.int_encoding() {
            IntEncoding::Variable => bincode::serde::decode_from_std_read(&mut self.reader, standard)?,
            IntEncoding::Fixed => bincode::serde::decode_from_std_read(
                &mut self.reader,
                standard.with_fixed_int_encoding(),
            )?,
        };
        Ok(value)
    }
}
