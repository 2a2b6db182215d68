use std::collections::HashMap;
use std::hash::BuildHasher;
use std::marker::PhantomData;

use log::trace;
use twox_hash::XxHash64;

use super::id::{Location, ObjectId};
use super::ShadowMapper;
use crate::archive::Direction;
use crate::error::{Result, ShadowError};
use crate::marker::PointerSite;

/// Hashes addresses with xxHash64. Addresses are plain integers and never
/// attacker controlled, so a seeded fast hash is enough.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AddressHasher;

impl BuildHasher for AddressHasher {
    type Hasher = XxHash64;

    fn build_hasher(&self) -> XxHash64 {
        XxHash64::with_seed(0)
    }
}

/// Save-side pointer bookkeeping.
///
/// Associates the location of every visited value with an [`ObjectId`] and
/// records the current target of every pointer site. On
/// [`finalize`](Self::finalize) the targets are translated into the pointer
/// table that is written after the real data.
///
/// Visiting a location twice overwrites its id: only the most recent visit is
/// resolvable. A struct anchor and its first field share a location, and so do
/// an `Option` and its payload. Because the load side rebuilds the same layout,
/// whichever visit wins still resolves to the same reloaded address.
#[derive(Debug)]
pub struct Recorder<'a> {
    /// Location to id. Pre-seeded with `NULL -> 0`.
    addresses: HashMap<Location, ObjectId, AddressHasher>,
    /// Number of ids handed out, including the null id.
    assigned: u64,
    /// Target of each pointer site, in encounter order.
    targets: Vec<Location>,
    _session: PhantomData<&'a ()>,
}

impl Recorder<'_> {
    /// Creates an empty recorder with the null location registered as id `0`.
    pub fn new() -> Self {
        let mut addresses = HashMap::with_hasher(AddressHasher);
        addresses.insert(Location::NULL, ObjectId::NULL);
        Self {
            addresses,
            assigned: 1,
            targets: Vec::new(),
            _session: PhantomData,
        }
    }

    /// Number of values tracked so far, excluding the null entry.
    pub fn objects_tracked(&self) -> usize {
        usize::try_from(self.assigned - 1).unwrap_or(usize::MAX)
    }

    /// Number of pointer sites tracked so far.
    pub fn pointers_tracked(&self) -> usize {
        self.targets.len()
    }

    /// Returns the id currently associated with `location`, if any.
    pub fn id_of(&self, location: Location) -> Option<ObjectId> {
        self.addresses.get(&location).copied()
    }

    /// Translates every recorded pointer target into the id of the object it
    /// points at.
    ///
    /// # Errors
    ///
    /// - [`ShadowError::UnresolvedAddress`] if a target was never visited.
    /// - [`ShadowError::Internal`] if the traversal visited more values than
    ///   fit into a `u32` id.
    pub fn finalize(&self) -> Result<Vec<u32>> {
        if u32::try_from(self.assigned - 1).is_err() {
            return Err(ShadowError::Internal(format!(
                "traversal visited {} objects, the id space holds {}",
                self.assigned - 1,
                u32::MAX
            )));
        }

        self.targets
            .iter()
            .enumerate()
            .map(|(pointer, target)| {
                self.id_of(*target)
                    .map(ObjectId::as_u32)
                    .ok_or(ShadowError::UnresolvedAddress {
                        pointer,
                        address: target.addr(),
                    })
            })
            .collect()
    }
}

impl Default for Recorder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ShadowMapper<'a> for Recorder<'a> {
    const DIRECTION: Direction = Direction::Save;

    fn track_address<T: ?Sized>(&mut self, value: &'a T) {
        // Past u32::MAX the table is unusable anyway; finalize reports it.
        if let Ok(raw) = u32::try_from(self.assigned) {
            self.addresses.insert(Location::of(value), ObjectId::new(raw));
        }
        self.assigned += 1;
    }

    fn track_pointer<T>(&mut self, site: PointerSite<'a, T>) {
        let target = site.target();
        trace!(
            "pointer #{} at {} targets {}",
            self.targets.len(),
            site.location(),
            target
        );
        self.targets.push(target);
        self.track_address(site.ptr());
    }
}
