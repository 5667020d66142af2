//! Core - shared error taxonomy and small utility re-exports.
//!
//! Every other `ripple_*` crate builds on this one for its error type and
//! for the hash map / string types used throughout the analyzer. Keeping
//! them in one place means a `calls[name]` lookup in the propagator and a
//! `bindings` map in a scope are backed by the same collection types.

mod error;

pub use error::{RippleError, RippleResult};

// Re-export the collection and string types used pervasively across the
// workspace so downstream crates depend on `ripple_core` rather than
// picking their own aliases for the same thing.
pub use compact_str::CompactString;
pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::{smallvec, SmallVec};

/// A 1-based line number within a single source fragment.
pub type LineNumber = u32;

/// A 0-based byte offset into the concatenated source buffer.
pub type BufferOffset = u32;
