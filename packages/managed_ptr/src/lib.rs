#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides two ownership handles for heap objects, each parameterized
//! by a pluggable destruction policy: [`UniquePtr`] for exclusive ownership and
//! [`SharedPtr`] for reference-counted shared ownership.
//!
//! It is infrastructure for code that manages raw allocations — arena-backed object
//! graphs, FFI-owned resources, type-erased payloads — and needs destruction to
//! happen exactly once, through the right policy, with no manual lifetime tracking.
//!
//! # Features
//!
//! - **Exclusive ownership**: [`UniquePtr<T, D>`] stores the pointer and the
//!   [`Deleter`] inline — no allocation beyond the owned object, no `Clone`.
//! - **Shared ownership**: [`SharedPtr<T>`] handles share one atomically counted
//!   control block; the last owner destroys the target exactly once.
//! - **Pluggable deleters**: the [`Deleter`] trait erases *how* a target dies
//!   behind the handle type; [`DefaultDeleter`] reverses a `Box` allocation.
//! - **Polymorphic views**: handles can be cast to trait objects; a
//!   [`SharedPtr<dyn Trait>`] still destroys through the concrete type's deleter.
//! - **One conversion path**: [`UniquePtr::into_shared`] moves the pointer and
//!   deleter into a fresh control block, emptying the exclusive side.
//! - **Thread-safe accounting**: the reference count uses Release decrements with
//!   an Acquire fence on the final transition, so the destroying thread observes
//!   every other owner's writes. The target's contents are *not* synchronized.
//! - **Stable Rust**: no unstable features required.
//!
//! # Example
//!
//! ```rust
//! use managed_ptr::{SharedPtr, UniquePtr};
//!
//! // Exclusive ownership: move-only, destroyed when the handle goes away.
//! let mut exclusive = UniquePtr::new(String::from("payload"));
//! exclusive.push_str(" data");
//! assert_eq!(*exclusive, "payload data");
//!
//! // Convert to shared ownership; the string is destroyed by the last owner.
//! let shared = exclusive.into_shared();
//! let other = shared.clone();
//! assert_eq!(shared.use_count(), 2);
//!
//! drop(shared);
//! assert_eq!(other.use_count(), 1);
//! assert_eq!(*other, "payload data");
//! ```
//!
//! # What this crate deliberately does not do
//!
//! There is no weak (non-owning, observing) handle, the pointee's contents are not
//! made thread-safe, and reference counts are never embedded in user types — all
//! accounting lives in a separately allocated control block.

mod control;
mod deleter;
mod error;
mod shared;
mod unique;

pub use deleter::*;
pub use error::*;
pub use shared::*;
pub use unique::*;
