//! The shadow traversal that runs next to the real value traversal.
//!
//! A [`ShadowMapper`] sees every value a session serializes, in the same order
//! the underlying archive sees it. It has two implementations:
//!
//! - [`Recorder`] (save): assigns an [`ObjectId`] to each visited location and
//!   remembers where every pointer points.
//! - [`Resolver`] (load): rebuilds the id to location table of the freshly
//!   loaded values and queues one [`Fixup`] per pointer.
//!
//! Both are driven by the same [`Traverse`](crate::Traverse) implementation of a
//! type, so the sequence of `track_*` calls is identical on both sides as long
//! as the loaded values have the same shape as the saved ones.

/// Defines the `ObjectId` and `Location` types.
pub mod id;
/// Defines the save-side `Recorder`.
pub mod recorder;
/// Defines the load-side `Resolver` and its fixups.
pub mod resolver;

pub use id::{Location, ObjectId};
pub use recorder::Recorder;
pub use resolver::{Fixup, PtrFixup, Resolver};

use crate::archive::Direction;
use crate::marker::PointerSite;

/// The capability interface of a shadow traversal.
///
/// `'a` is the session lifetime: every value reported to a mapper stays
/// borrowed, and therefore at a fixed location, until the session ends.
pub trait ShadowMapper<'a> {
    /// Whether this mapper records a save or resolves a load.
    const DIRECTION: Direction;

    /// Registers the location of `value` as the next object id.
    fn track_address<T: ?Sized>(&mut self, value: &'a T);

    /// Registers a pointer site. The pointer variable itself is also tracked as
    /// an object, so pointers to pointers resolve.
    fn track_pointer<T>(&mut self, site: PointerSite<'a, T>);

    /// Registers a leaf value such as an integer or a string.
    fn track_scalar<T: ?Sized>(&mut self, value: &'a T) {
        self.track_address(value);
    }

    /// Registers a composite value as a whole, so pointers to the value itself,
    /// not only to its members, resolve.
    fn track_anchor<T: ?Sized>(&mut self, value: &'a T) {
        self.track_address(value);
    }
}
