//! Profiling harness and persisted per-host profiles.
//!
//! The dispatch core picks a variant from static preference weights; this
//! crate replaces that guess with measurement. `vlk-profile` (the binary)
//! verifies every variant against the generic reference, times them, and
//! persists the winners per host; `vlk::init_with_prefs` feeds the stored
//! mapping back into the dispatch table at startup.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod buffer;
pub mod engine;
mod error;
pub mod host;
pub mod prefs;
pub mod runner;
pub mod verify;

pub use buffer::AlignedBuf;
pub use engine::{OpReport, ProfileEngine};
pub use error::ProfileError;
pub use host::HostId;
pub use runner::{BenchResult, BenchRunner};
pub use verify::verify_op;
