use std::fmt;

/// A strong type for the identity number a traversal assigns to a visited value.
///
/// Ids are handed out in encounter order. `0` is reserved for the null location
/// on both sides of a session, so the first visited value gets `1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(u32);

impl ObjectId {
    /// The id of the null location.
    pub const NULL: Self = Self(0);

    /// Creates a new `ObjectId` from its wire value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the id as an index into the load side's address list.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true if this is the null id.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The storage address of a visited value, used purely as an identity key.
///
/// The library never dereferences a `Location`. It is compared, hashed and, on
/// load, handed to a [`Fixup`](super::Fixup) which stores it in a `Ptr`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location(*const ());

impl Location {
    /// The null location, registered as [`ObjectId::NULL`].
    pub const NULL: Self = Self(std::ptr::null());

    /// Returns the location of `value`.
    pub fn of<T: ?Sized>(value: &T) -> Self {
        Self((value as *const T).cast())
    }

    /// Wraps a raw pointer, dropping any pointee metadata.
    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast())
    }

    /// Reinterprets the location as a pointer to `T`.
    pub fn cast<T>(self) -> *const T {
        self.0.cast()
    }

    /// Returns the numeric address, for diagnostics.
    pub fn addr(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the null location.
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location({:p})", self.0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", self.0)
    }
}
