use log::trace;

use super::id::{Location, ObjectId};
use super::ShadowMapper;
use crate::archive::Direction;
use crate::error::{Result, ShadowError};
use crate::marker::{PointerSite, Ptr};

/// A deferred write of a resolved address into one pointer variable.
///
/// One implementation exists per pointee type ([`PtrFixup`]); the resolver
/// stores them behind this interface.
pub trait Fixup {
    /// Points the pointer variable at `target`.
    fn apply(&self, target: Location);
}

/// Writes a resolved location into a `Ptr<T>`.
#[derive(Debug)]
pub struct PtrFixup<'a, T> {
    site: &'a Ptr<T>,
}

impl<'a, T> PtrFixup<'a, T> {
    /// Creates the fixup for `site`.
    pub fn new(site: &'a Ptr<T>) -> Self {
        Self { site }
    }
}

impl<T> Fixup for PtrFixup<'_, T> {
    fn apply(&self, target: Location) {
        self.site.set_raw(target.cast());
    }
}

/// A pointer variable waiting for its target.
struct PendingSite<'a> {
    location: Location,
    fixup: Box<dyn Fixup + 'a>,
}

impl std::fmt::Debug for PendingSite<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PendingSite({})", self.location)
    }
}

/// Load-side pointer bookkeeping.
///
/// Rebuilds the id to location table of the loaded values: entry `n` is the
/// location of the value the save side numbered `n`. Pointer sites are queued
/// with a typed [`Fixup`] and patched in [`finalize`](Self::finalize), once the
/// pointer table has been read back.
#[derive(Debug)]
pub struct Resolver<'a> {
    /// Indexed by `ObjectId`. Entry `0` is the null location.
    addresses: Vec<Location>,
    pending: Vec<PendingSite<'a>>,
}

impl<'a> Resolver<'a> {
    /// Creates an empty resolver with the null location registered as id `0`.
    pub fn new() -> Self {
        Self {
            addresses: vec![Location::NULL],
            pending: Vec::new(),
        }
    }

    /// Number of values tracked so far, excluding the null entry.
    pub fn objects_tracked(&self) -> usize {
        self.addresses.len() - 1
    }

    /// Number of pointer sites waiting for a fixup.
    pub fn pointers_tracked(&self) -> usize {
        self.pending.len()
    }

    /// Returns the location registered under `id`, if any.
    pub fn location_of(&self, id: ObjectId) -> Option<Location> {
        self.addresses.get(id.index()).copied()
    }

    /// Applies the stored pointer table to every pending pointer site.
    ///
    /// The whole table is validated first, so on error no pointer is modified.
    /// The pending queue is consumed either way.
    ///
    /// # Errors
    ///
    /// - [`ShadowError::SizeMismatch`] if the table does not have exactly one
    ///   entry per pending site.
    /// - [`ShadowError::OutOfRangeId`] if an entry names an id that was never
    ///   visited.
    pub fn finalize(&mut self, table: &[u32]) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);

        if table.len() != pending.len() {
            return Err(ShadowError::SizeMismatch {
                expected: pending.len(),
                found: table.len(),
            });
        }

        let targets = table
            .iter()
            .enumerate()
            .map(|(pointer, raw)| {
                let id = ObjectId::new(*raw);
                self.location_of(id).ok_or(ShadowError::OutOfRangeId {
                    pointer,
                    id,
                    visited: self.addresses.len(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for (site, target) in pending.iter().zip(targets) {
            trace!("pointer at {} resolved to {}", site.location, target);
            site.fixup.apply(target);
        }

        Ok(())
    }
}

impl Default for Resolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ShadowMapper<'a> for Resolver<'a> {
    const DIRECTION: Direction = Direction::Load;

    fn track_address<T: ?Sized>(&mut self, value: &'a T) {
        self.addresses.push(Location::of(value));
    }

    fn track_pointer<T>(&mut self, site: PointerSite<'a, T>) {
        let location = site.location();
        self.addresses.push(location);
        self.pending.push(PendingSite {
            location,
            fixup: Box::new(PtrFixup::new(site.ptr())),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_applied_in_site_order() {
        let (a, b) = (10u32, 20u32);
        let first = Ptr::<u32>::null();
        let second = Ptr::<u32>::null();

        let mut resolver = Resolver::new();
        resolver.track_scalar(&a);
        resolver.track_scalar(&b);
        resolver.track_pointer(PointerSite::new(&first));
        resolver.track_pointer(PointerSite::new(&second));

        assert!(resolver.finalize(&[2, 1]).is_ok());
        assert!(first.points_to(&b));
        assert!(second.points_to(&a));
    }

    #[test]
    fn zero_resolves_to_null() {
        let value = 1u8;
        let ptr = Ptr::new(&value);

        let mut resolver = Resolver::new();
        resolver.track_pointer(PointerSite::new(&ptr));

        assert!(resolver.finalize(&[0]).is_ok());
        assert!(ptr.is_null());
    }

    #[test]
    fn pointer_can_target_another_pointer() {
        let value = 3i16;
        let inner = Ptr::<i16>::null();
        let outer = Ptr::<Ptr<i16>>::null();

        let mut resolver = Resolver::new();
        resolver.track_scalar(&value);
        resolver.track_pointer(PointerSite::new(&inner));
        resolver.track_pointer(PointerSite::new(&outer));

        assert!(resolver.finalize(&[1, 2]).is_ok());
        assert!(inner.points_to(&value));
        assert!(outer.points_to(&inner));
    }

    #[test]
    fn wrong_table_length_is_rejected() {
        let ptr = Ptr::<u8>::null();
        let mut resolver = Resolver::new();
        resolver.track_pointer(PointerSite::new(&ptr));

        assert!(matches!(
            resolver.finalize(&[]),
            Err(ShadowError::SizeMismatch {
                expected: 1,
                found: 0
            })
        ));
    }

    #[test]
    fn out_of_range_id_leaves_pointers_untouched() {
        let value = 5u64;
        let good = Ptr::<u64>::null();
        let bad = Ptr::<u64>::null();

        let mut resolver = Resolver::new();
        resolver.track_scalar(&value);
        resolver.track_pointer(PointerSite::new(&good));
        resolver.track_pointer(PointerSite::new(&bad));

        // Known ids are 0 (null), 1 (value), 2 (good) and 3 (bad).
        assert!(matches!(
            resolver.finalize(&[1, 4]),
            Err(ShadowError::OutOfRangeId {
                pointer: 1,
                visited: 4,
                ..
            })
        ));
        assert!(good.is_null());
    }
}
