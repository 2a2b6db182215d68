//! The traversal proxies: the entry points of a save or load session.
//!
//! A proxy wraps an open underlying archive. Every value handed to it goes to
//! the archive first and to the shadow mapper second. Completing the proxy,
//! explicitly or by dropping it, finalizes the pointer bookkeeping.

use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::archive::{Archive, Loading, Saving};
use crate::error::{Result, ShadowError};
use crate::mapper::{Recorder, Resolver};
use crate::traverse::Traverse;

/// Lifecycle of a session. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Values may still be passed to the proxy.
    Active,
    /// The pointer table has been written or applied (or failed to be).
    Completed,
}

/// Rejects an archive of the wrong direction when the proxy is instantiated.
trait DirectionCheck: Archive {
    const SAVING: () = assert!(
        Self::DIRECTION.is_saving(),
        "OutputArchive cannot be used with a loading archive"
    );
    const LOADING: () = assert!(
        Self::DIRECTION.is_loading(),
        "InputArchive cannot be used with a saving archive"
    );
}

impl<A: Archive> DirectionCheck for A {}

/// Saves values together with the pointers between them.
///
/// Pointers ([`Ptr`](crate::Ptr)) are not written inline. When the session is
/// completed, a table mapping each pointer to the object it targets is written
/// after the last value.
///
/// # Example
///
/// ```rust
/// use shadowptr::{BincodeReader, BincodeWriter, InputArchive, OutputArchive, Ptr};
///
/// let x = 4i32;
/// let y = Ptr::new(&x);
///
/// let mut sink = BincodeWriter::new(Vec::new());
/// {
///     let mut archive = OutputArchive::new(&mut sink);
///     archive.invoke(&x)?.invoke(&y)?;
///     archive.complete()?;
/// }
/// let bytes = sink.finish()?;
///
/// let mut source = BincodeReader::new(bytes.as_slice());
/// let mut x_load = 0i32;
/// let mut y_load = Ptr::null();
/// {
///     let mut archive = InputArchive::new(&mut source);
///     archive.invoke(&mut x_load)?.invoke(&mut y_load)?;
///     archive.complete()?;
/// }
///
/// assert!(y_load.points_to(&x_load));
/// assert_eq!(unsafe { y_load.as_ref() }, Some(&4));
/// # Ok::<(), shadowptr::ShadowError>(())
/// ```
#[derive(Debug)]
pub struct OutputArchive<'a, A: Saving> {
    archive: &'a mut A,
    recorder: Recorder<'a>,
    state: SessionState,
}

impl<'a, A: Saving> OutputArchive<'a, A> {
    /// Starts a save session over an open archive.
    pub fn new(archive: &'a mut A) -> Self {
        let () = <A as DirectionCheck>::SAVING;
        debug!("save session started");
        Self {
            archive,
            recorder: Recorder::new(),
            state: SessionState::Active,
        }
    }

    /// Writes `value` to the archive and records its locations.
    ///
    /// `value` stays borrowed until the session ends, so that no recorded
    /// location can move or be reused before the pointer table is built.
    ///
    /// # Errors
    ///
    /// [`ShadowError::UseAfterComplete`] after [`complete`](Self::complete), or
    /// any error of the underlying archive.
    pub fn invoke<T>(&mut self, value: &'a T) -> Result<&mut Self>
    where
        T: Serialize + Traverse + ?Sized,
    {
        self.ensure_active()?;
        self.archive.save(value)?;
        value.traverse(&mut self.recorder);
        Ok(self)
    }

    /// Resolves every pointer to an object id and writes the pointer table.
    ///
    /// Only the first call does anything; later calls return `Ok(())`. The
    /// session is completed even if this fails.
    ///
    /// # Errors
    ///
    /// [`ShadowError::UnresolvedAddress`] if a pointer targets a value that was
    /// not part of the session, or any error of the underlying archive.
    pub fn complete(&mut self) -> Result<()> {
        if self.state == SessionState::Completed {
            return Ok(());
        }
        self.state = SessionState::Completed;

        let table = self.recorder.finalize()?;
        debug!(
            "save session completed: {} objects, {} pointers",
            self.recorder.objects_tracked(),
            table.len()
        );
        self.archive.save(&table)
    }

    /// Returns true once the session has been completed.
    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Number of objects the session has numbered so far.
    pub fn objects_tracked(&self) -> usize {
        self.recorder.objects_tracked()
    }

    /// Number of pointers the session has seen so far.
    pub fn pointers_tracked(&self) -> usize {
        self.recorder.pointers_tracked()
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Completed => Err(ShadowError::UseAfterComplete),
        }
    }
}

impl<A: Saving> Drop for OutputArchive<'_, A> {
    fn drop(&mut self) {
        if let Err(e) = self.complete() {
            error!("save session failed while being dropped: {e}");
            self.archive.defer_error(e);
        }
    }
}

/// Loads values saved by an [`OutputArchive`] and restores their pointers.
///
/// Each value is decoded straight into a slot owned by the caller. The slots
/// stay borrowed until the session ends; on completion the pointer table is
/// read and every loaded [`Ptr`](crate::Ptr) is pointed at the slot, or part of
/// a slot, that corresponds to its saved target.
///
/// Values must be passed in the same order and with the same types as on save.
#[derive(Debug)]
pub struct InputArchive<'a, A: Loading> {
    archive: &'a mut A,
    resolver: Resolver<'a>,
    state: SessionState,
}

impl<'a, A: Loading> InputArchive<'a, A> {
    /// Starts a load session over an open archive.
    pub fn new(archive: &'a mut A) -> Self {
        let () = <A as DirectionCheck>::LOADING;
        debug!("load session started");
        Self {
            archive,
            resolver: Resolver::new(),
            state: SessionState::Active,
        }
    }

    /// Reads the next value into `slot` and records its locations.
    ///
    /// # Errors
    ///
    /// [`ShadowError::UseAfterComplete`] after [`complete`](Self::complete), or
    /// any error of the underlying archive. On error `slot` is left unchanged.
    pub fn invoke<T>(&mut self, slot: &'a mut T) -> Result<&mut Self>
    where
        T: DeserializeOwned + Traverse,
    {
        self.ensure_active()?;
        *slot = self.archive.load()?;
        let slot: &'a T = slot;
        slot.traverse(&mut self.resolver);
        Ok(self)
    }

    /// Reads the pointer table and patches every loaded pointer.
    ///
    /// Only the first call does anything; later calls return `Ok(())`. The
    /// session is completed even if this fails.
    ///
    /// # Errors
    ///
    /// [`ShadowError::SizeMismatch`] or [`ShadowError::OutOfRangeId`] if the
    /// stored table does not fit the loaded values, or any error of the
    /// underlying archive.
    pub fn complete(&mut self) -> Result<()> {
        if self.state == SessionState::Completed {
            return Ok(());
        }
        self.state = SessionState::Completed;

        let objects = self.resolver.objects_tracked();
        let table: Vec<u32> = self.archive.load()?;
        self.resolver.finalize(&table)?;
        debug!(
            "load session completed: {objects} objects, {} pointers",
            table.len()
        );
        Ok(())
    }

    /// Returns true once the session has been completed.
    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Number of objects the session has numbered so far.
    pub fn objects_tracked(&self) -> usize {
        self.resolver.objects_tracked()
    }

    /// Number of pointers waiting to be restored.
    pub fn pointers_tracked(&self) -> usize {
        self.resolver.pointers_tracked()
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Completed => Err(ShadowError::UseAfterComplete),
        }
    }
}

impl<A: Loading> Drop for InputArchive<'_, A> {
    fn drop(&mut self) {
        if let Err(e) = self.complete() {
            error!("load session failed while being dropped: {e}");
            self.archive.defer_error(e);
        }
    }
}
