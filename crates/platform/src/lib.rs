//! CPU capability detection for vlk.
//!
//! This crate is the single source of truth for what the executing host
//! supports. It exposes:
//!
//! - [`Extension`]: named instruction-set tokens with a partial preference
//!   order ("strictly faster than" on the same host)
//! - [`ExtSet`]: a bitset of extensions
//! - [`CapabilitySet`]: detected extensions plus the platform alignment
//!   boundary, immutable once computed
//! - [`detect()`]: one-shot, memoized runtime detection that degrades to
//!   [`CapabilitySet::minimal`] instead of failing
//!
//! Higher layers never probe the CPU themselves; they take a
//! `CapabilitySet` as input, which keeps selection testable against
//! simulated hosts.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::indexing_slicing))]

pub mod caps;
mod detect;

pub use caps::{CapabilitySet, ExtSet, Extension, DEFAULT_ALIGNMENT};
pub use detect::detect;
