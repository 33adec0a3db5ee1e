//! Contains common, primitive types and a prelude for easy importing.
//!
//! This module defines the key type used to identify issued registry tokens.
//! Using a distinct slotmap key instead of a bare integer keeps identifiers
//! unique for the lifetime of the owning registry.

use slotmap::new_key_type;

/// A prelude module for convenient importing of the most common Clockwork types.
///
/// # Example
/// ```
/// use clockwork::prelude::*;
/// ```
pub mod prelude {
    pub use super::TokenId;
    pub use crate::components::registry::IdRegistry;
    pub use crate::components::schedule::{defer, Ticker};
    pub use crate::sequence::{source, task, Sequence, Source, Step, Task, TaskError};
    pub use crate::time::{ClockTime, TimeError};
}

new_key_type! {
    /// Uniquely identifies a token issued by an [`IdRegistry`].
    ///
    /// Keys are never reused within a registry, even after release, which
    /// prevents stale-identifier bugs.
    ///
    /// [`IdRegistry`]: crate::components::registry::IdRegistry
    pub struct TokenId;
}
