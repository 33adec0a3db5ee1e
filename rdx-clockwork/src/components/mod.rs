//! Supporting components: identifier registry and scheduling helpers.

pub mod registry;
pub mod schedule;
