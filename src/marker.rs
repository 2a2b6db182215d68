//! Markers that tag values for the shadow traversal.
//!
//! None of the pointer markers carries data for the underlying archive: they
//! serialize as `()`, which encodes to zero bytes. Their only job is to route a
//! location into the [`ShadowMapper`].

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::mapper::{Location, ShadowMapper};

/// A pointer to a value that is serialized in the same session.
///
/// `Ptr<T>` is an ordinary value: it can be cloned, stored in containers and
/// fields, and compared by address. When it goes through a session it never
/// writes its address. Instead its [`Traverse`](crate::Traverse) implementation
/// reports it as a pointer site, and the pointer table written at the end of
/// the session restores it on load.
///
/// The target is held in a [`Cell`] so that the load side can patch the pointer
/// through the shared borrow it holds for the duration of the session.
///
/// ```rust
/// use shadowptr::Ptr;
///
/// let value = 4;
/// let ptr = Ptr::new(&value);
/// assert!(ptr.points_to(&value));
/// assert_eq!(unsafe { ptr.as_ref() }, Some(&4));
/// ```
pub struct Ptr<T> {
    target: Cell<*const T>,
}

impl<T> Ptr<T> {
    /// Creates a null pointer.
    pub const fn null() -> Self {
        Self {
            target: Cell::new(std::ptr::null()),
        }
    }

    /// Creates a pointer to `target`.
    pub fn new(target: &T) -> Self {
        Self::from_raw(target)
    }

    /// Creates a pointer from a raw address.
    pub const fn from_raw(target: *const T) -> Self {
        Self {
            target: Cell::new(target),
        }
    }

    /// Returns the raw target address.
    pub fn get(&self) -> *const T {
        self.target.get()
    }

    /// Points at `target`.
    pub fn set(&self, target: &T) {
        self.target.set(target);
    }

    /// Resets to null.
    pub fn clear(&self) {
        self.target.set(std::ptr::null());
    }

    pub(crate) fn set_raw(&self, target: *const T) {
        self.target.set(target);
    }

    /// Returns true if the pointer is null.
    pub fn is_null(&self) -> bool {
        self.get().is_null()
    }

    /// Returns true if the pointer targets exactly `value`.
    pub fn points_to(&self, value: &T) -> bool {
        std::ptr::eq(self.get(), value)
    }

    /// Dereferences the pointer.
    ///
    /// # Safety
    ///
    /// The target must still be alive at the address the pointer holds, must not
    /// have been moved since the pointer was set or loaded, and must not be
    /// mutably borrowed for the returned lifetime. A loaded pointer satisfies
    /// this as long as the values it was loaded alongside stay where the load
    /// session put them.
    #[allow(unsafe_code)]
    pub unsafe fn as_ref<'t>(&self) -> Option<&'t T> {
        // SAFETY: upheld by the caller as documented above.
        unsafe { self.get().as_ref() }
    }
}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self::from_raw(self.get())
    }
}

impl<T> Default for Ptr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.get(), other.get())
    }
}

impl<T> Eq for Ptr<T> {}

impl<T> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ptr({:p})", self.get())
    }
}

impl<T> Serialize for Ptr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

impl<'de, T> Deserialize<'de> for Ptr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <()>::deserialize(deserializer)?;
        Ok(Self::null())
    }
}

/// A pointer variable as seen by the shadow traversal.
///
/// Gives the mapper both the pointer's own location and its current target.
/// A site can also be handed to a save session directly, wrapping the pointer
/// at the use site. It writes zero bytes and numbers exactly like the `Ptr`
/// itself, so the load side invokes the plain `Ptr`:
///
/// ```rust
/// use shadowptr::{pointer_site, BincodeWriter, OutputArchive, Ptr};
///
/// let x = 4u32;
/// let y = Ptr::new(&x);
/// let site = pointer_site(&y);
///
/// let mut sink = BincodeWriter::new(Vec::new());
/// {
///     let mut archive = OutputArchive::new(&mut sink);
///     archive.invoke(&x)?.invoke(&site)?;
///     assert_eq!(archive.pointers_tracked(), 1);
///     archive.complete()?;
/// }
/// // `x`, then a one-entry table naming id 1.
/// assert_eq!(sink.finish()?, vec![4, 1, 1]);
/// # Ok::<(), shadowptr::ShadowError>(())
/// ```
pub struct PointerSite<'a, T> {
    ptr: &'a Ptr<T>,
}

impl<'a, T> PointerSite<'a, T> {
    /// Marks `ptr` as a pointer site.
    pub fn new(ptr: &'a Ptr<T>) -> Self {
        Self { ptr }
    }

    /// The pointer variable.
    pub fn ptr(&self) -> &'a Ptr<T> {
        self.ptr
    }

    /// Where the pointer variable itself lives.
    pub fn location(&self) -> Location {
        Location::of(self.ptr)
    }

    /// Where the pointer currently points.
    pub fn target(&self) -> Location {
        Location::from_ptr(self.ptr.get())
    }

    /// Reports this site to `mapper`.
    pub fn track<M: ShadowMapper<'a>>(self, mapper: &mut M) {
        mapper.track_pointer(self);
    }
}

impl<T> Clone for PointerSite<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PointerSite<'_, T> {}

impl<T> fmt::Debug for PointerSite<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointerSite({} -> {})", self.location(), self.target())
    }
}

impl<T> Serialize for PointerSite<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

/// Shorthand for [`PointerSite::new`].
pub fn pointer_site<T>(ptr: &Ptr<T>) -> PointerSite<'_, T> {
    PointerSite::new(ptr)
}

/// Exposes the location of a whole composite value to the shadow traversal.
///
/// A composite's traversal only visits its members, so without an anchor a
/// pointer to the value itself cannot be resolved. Types opt in by tracking an
/// anchor from their [`Traverse`](crate::Traverse) implementation, or with
/// `#[traverse(anchor)]` when deriving:
///
/// ```rust
/// use shadowptr::{Anchor, ShadowMapper, Traverse};
///
/// struct Point {
///     x: f32,
///     y: f32,
/// }
///
/// impl Traverse for Point {
///     fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
///         self.x.traverse(mapper);
///         self.y.traverse(mapper);
///         Anchor::new(self).track(mapper);
///     }
/// }
/// ```
pub struct Anchor<'a, T: ?Sized> {
    target: &'a T,
}

impl<'a, T: ?Sized> Anchor<'a, T> {
    /// Anchors `target`.
    pub fn new(target: &'a T) -> Self {
        Self { target }
    }

    /// The anchored value.
    pub fn target(&self) -> &'a T {
        self.target
    }

    /// The anchored location.
    pub fn location(&self) -> Location {
        Location::of(self.target)
    }

    /// Reports the anchored value to `mapper`.
    pub fn track<M: ShadowMapper<'a>>(self, mapper: &mut M) {
        mapper.track_anchor(self.target);
    }
}

impl<T: ?Sized> Clone for Anchor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Anchor<'_, T> {}

impl<T: ?Sized> fmt::Debug for Anchor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Anchor({})", self.location())
    }
}

impl<T: ?Sized> Serialize for Anchor<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

/// An opaque byte buffer.
///
/// The bytes go to the underlying archive as usual, but the shadow traversal
/// skips them entirely: nothing inside a blob can be the target of a pointer.
/// A plain `Vec<u8>` would instead register every byte as an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    /// Returns the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unwraps the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
