//! Runtime kernel dispatch: descriptors, registry, selection, and the
//! memoized dispatch table.
//!
//! The flow at a glance:
//!
//! 1. kernel modules declare a [`KernelDescriptor`] per operation and
//!    register it (with puppets and a [`CanonShape`]) in a [`Registry`];
//! 2. a [`DispatchTable`] pairs the registry with the host's
//!    [`CapabilitySet`](vlk_platform::CapabilitySet) and resolves each
//!    `(operation, alignment hint)` once, lazily;
//! 3. entry points call [`DispatchTable::resolve`] and index their own
//!    typed variant array with the returned index.
//!
//! Selection is pure and deterministic; persisted preferences and explicit
//! pins layer on top without changing that.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod adapter;
pub mod descriptor;
mod error;
pub mod registry;
pub mod select;
mod table;

pub use adapter::{as_f32s, as_f32s_mut, as_u64s, as_u64s_mut, CanonShape, CheckMode, FillMode, PuppetFn};
pub use descriptor::{Alignment, KernelDescriptor, Variant, VariantMeta};
pub use error::DispatchError;
pub use registry::{OpEntry, Registry};
pub use table::{DispatchTable, Resolved};
