//! `Traverse` implementations for standard Rust types.
//!
//! # Numbering Rules
//!
//! 1. **Scalars** (numbers, `bool`, `char`, strings) consume one id at their own
//!    location.
//! 2. **Length-prefixed sequences** (slices, `Vec`, `VecDeque`, `BTreeMap`,
//!    `BTreeSet`) and `Option` first anchor their own location, where their
//!    length or tag lives, then visit their elements in iteration order. A
//!    pointer to the collection itself therefore resolves, and a `&[T]` saved
//!    in a session numbers like the `Vec<T>` it is loaded into.
//! 3. **Fixed aggregates** (arrays, tuples) and `Box` only visit their parts.
//!    An array is encoded without a length, so it is not interchangeable with a
//!    slice or a `Vec`.
//! 4. `HashMap` and `HashSet` are not supported: a reloaded map iterates in a
//!    different order than the saved one, which would misnumber every entry.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::marker::PhantomData;

use crate::mapper::ShadowMapper;
use crate::marker::{Anchor, Blob, PointerSite, Ptr};
use crate::traverse::Traverse;

/// Implements `Traverse` for leaf types that occupy one id each.
macro_rules! impl_scalar_traverse {
    ($($t:ty),*) => {
        $(
            impl Traverse for $t {
                fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
                    mapper.track_scalar(self);
                }
            }
        )*
    }
}

impl_scalar_traverse!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, str,
    String
);

impl Traverse for () {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, _mapper: &mut M) {}
}

impl<T: ?Sized> Traverse for PhantomData<T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, _mapper: &mut M) {}
}

// Blobs are never scanned for addresses.
impl Traverse for Blob {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, _mapper: &mut M) {}
}

impl<T> Traverse for Ptr<T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        PointerSite::new(self).track(mapper);
    }
}

// Markers built at the use site route straight into the mapper.
impl<T> Traverse for PointerSite<'_, T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        PointerSite::new(self.ptr()).track(mapper);
    }
}

impl<T: ?Sized> Traverse for Anchor<'_, T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        Anchor::new(self.target()).track(mapper);
    }
}

impl<T: Traverse + ?Sized> Traverse for &T {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        (**self).traverse(mapper);
    }
}

impl<T: Traverse + ?Sized> Traverse for Box<T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        (**self).traverse(mapper);
    }
}

impl<T: Traverse> Traverse for Option<T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        mapper.track_anchor(self);
        if let Some(value) = self {
            value.traverse(mapper);
        }
    }
}

impl<T: Traverse> Traverse for [T] {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        mapper.track_anchor(self);
        for item in self {
            item.traverse(mapper);
        }
    }
}

impl<T: Traverse, const N: usize> Traverse for [T; N] {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        for item in self {
            item.traverse(mapper);
        }
    }
}

impl<T: Traverse> Traverse for Vec<T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        mapper.track_anchor(self);
        for item in self {
            item.traverse(mapper);
        }
    }
}

impl<T: Traverse> Traverse for VecDeque<T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        mapper.track_anchor(self);
        for item in self {
            item.traverse(mapper);
        }
    }
}

impl<T: Traverse> Traverse for BTreeSet<T> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        mapper.track_anchor(self);
        for item in self {
            item.traverse(mapper);
        }
    }
}

impl<K: Traverse, V: Traverse> Traverse for BTreeMap<K, V> {
    fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
        mapper.track_anchor(self);
        for (key, value) in self {
            key.traverse(mapper);
            value.traverse(mapper);
        }
    }
}

/// Implements `Traverse` for tuples, visiting fields left to right.
macro_rules! impl_tuple_traverse {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Traverse),+> Traverse for ($($name,)+) {
            fn traverse<'a, M: ShadowMapper<'a>>(&'a self, mapper: &mut M) {
                $( self.$idx.traverse(mapper); )+
            }
        }
    }
}

impl_tuple_traverse!(A: 0);
impl_tuple_traverse!(A: 0, B: 1);
impl_tuple_traverse!(A: 0, B: 1, C: 2);
impl_tuple_traverse!(A: 0, B: 1, C: 2, D: 3);
impl_tuple_traverse!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple_traverse!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_tuple_traverse!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_tuple_traverse!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
