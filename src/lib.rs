//! # shadowptr
//!
//! Serialize pointers between values that are serialized in the same pass,
//! without boxing the targets or wrapping them in shared ownership.
//!
//! ## Overview
//!
//! Object graphs often hold references into other objects: an edge that points
//! at a field of a vertex, a cursor into a buffer owned by a sibling. A regular
//! serializer cannot store such a reference, because an address means nothing
//! once the data is reloaded somewhere else.
//!
//! shadowptr solves this with a *shadow traversal*. Next to the real
//! serialization, every visited value is numbered in encounter order. Pointers
//! ([`Ptr`]) are not written inline; instead, when the session completes, a
//! table with the number of each pointer's target is appended to the stream. On
//! load the same numbering is rebuilt over the freshly decoded values, and the
//! table is used to point each loaded `Ptr` at its counterpart.
//!
//! ## Architecture
//!
//! ### Proxies
//!
//! [`OutputArchive`] and [`InputArchive`] wrap an open underlying archive. Every
//! value passed to [`OutputArchive::invoke`] is written by the archive and then
//! walked by the shadow traversal. Completing the proxy, explicitly through
//! `complete()` or by dropping it, writes or applies the pointer table.
//!
//! ### Shadow Mappers
//!
//! The [`mapper::Recorder`] numbers locations while saving; the
//! [`mapper::Resolver`] rebuilds the numbering while loading and queues the
//! pointer fixups. Both implement [`ShadowMapper`].
//!
//! ### Traverse
//!
//! The [`Traverse`] trait tells the shadow traversal how to walk a type. It is
//! implemented for the standard library types and can be derived:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use shadowptr::{Ptr, Traverse};
//!
//! #[derive(Serialize, Deserialize, Traverse)]
//! struct Vertex {
//!     weight: u32,
//!     label: String,
//! }
//!
//! #[derive(Serialize, Deserialize, Traverse)]
//! struct Edge {
//!     // Points into a vertex serialized in the same session.
//!     weight: Ptr<u32>,
//! }
//! ```
//!
//! ### Archives
//!
//! Any serde-based serializer can be plugged in through the [`Saving`] and
//! [`Loading`] traits. [`BincodeWriter`] and [`BincodeReader`] are provided.
//!
//! ## Wire Format
//!
//! ```text
//! [value 0] [value 1] ... [value n] [pointer table: Vec<u32>]
//! ```
//!
//! Values are encoded by the underlying archive exactly as they would be
//! without shadowptr; pointers contribute zero bytes. The table holds one object
//! id per pointer, in encounter order, with `0` meaning null.
//!
//! ## Safety and Error Handling
//!
//! * Every value passed to a session stays borrowed until the session ends, so
//!   recorded locations cannot move or be reused while the table is built.
//! * The library never dereferences a recorded address. Only [`Ptr::as_ref`]
//!   does, and it is an `unsafe fn`.
//! * All failures are reported through [`ShadowError`].
//! * Save and load must pass the same values in the same order. A mismatch in
//!   the number of pointers is detected; other drift is not.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

extern crate self as shadowptr;

pub mod archive;
pub mod config;
pub mod error;
pub mod mapper;
pub mod marker;
pub mod proxy;
pub mod traverse;

// Private modules
mod traverse_impls;

// --- RE-EXPORTS ---

pub use archive::{Archive, BincodeReader, BincodeWriter, Direction, Loading, Saving};
pub use error::{Result, ShadowError};
pub use mapper::{ObjectId, ShadowMapper};
pub use marker::{pointer_site, Anchor, Blob, PointerSite, Ptr};
pub use proxy::{InputArchive, OutputArchive, SessionState};
pub use traverse::Traverse;

// Re-export the derive macro so it is accessible as `shadowptr::Traverse`
pub use shadowptr_derive::Traverse;
