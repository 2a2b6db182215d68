//! Defines the `Traverse` trait that drives the shadow traversal.
//!
//! This is distinct from `serde::Serialize`. Instead of writing bytes, a
//! `Traverse` implementation reports locations to a [`ShadowMapper`].

use crate::mapper::ShadowMapper;

/// A type whose values can be walked by a shadow traversal.
///
/// One implementation serves both directions: the same method is driven by the
/// [`Recorder`](crate::mapper::Recorder) when saving and by the
/// [`Resolver`](crate::mapper::Resolver) when loading. It must visit the value's
/// parts in the same order every time, and in the same order as the type's
/// `Serialize` implementation, for the pointer table to line up.
///
/// Use `#[derive(Traverse)]` for structs and enums.
///
/// # Lifetimes
/// * `'a`: the session lifetime. `self` is borrowed for all of it, which keeps
///   every reported location fixed until the session is finalized.
pub trait Traverse {
    /// Reports `self` and its parts to `mapper`, in serialization order.
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M);
}
