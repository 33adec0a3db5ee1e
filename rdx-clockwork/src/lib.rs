//! # Clockwork
//!
//! A wall-clock value type and an async task-pipeline toolkit for Rust.
//!
//! Clockwork provides two small, self-contained building blocks plus the
//! supporting pieces around them:
//!
//! - **`ClockTime`**: a validated, calendar-free time of day with
//!   millisecond precision, wrap-around arithmetic, total ordering, and
//!   string (de)serialization.
//! - **`Sequence`**: an ordered pipeline of asynchronous tasks with
//!   chain/parallel/race/retry composition, a pluggable error handler, and a
//!   cached final result.
//! - **`IdRegistry`** and the scheduling helpers (`defer`, `Ticker`) cover
//!   unique identifier issuing and timer-driven callbacks.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use clockwork::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // A pipeline: each stage receives the previous stage's output.
//!     let mut pipeline = Sequence::new()
//!         .then(|t: ClockTime| async move { Ok(t.add_minutes(90)) })
//!         .then(|t: ClockTime| async move { Ok(t.add_hours(-1)) })
//!         .error(|_| Ok(ClockTime::from_millis(0)));
//!
//!     let shifted = pipeline
//!         .execute(ClockTime::now())
//!         .await
//!         .map_err(|e| anyhow::anyhow!(e))?;
//!     println!("shifted to {shifted}");
//!
//!     // A deferred one-shot.
//!     defer(Duration::from_secs(1), || async {
//!         println!("one second later");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub const LIBRARY_NAME: &str = "Clockwork";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod sequence;
pub mod time;

pub use common::prelude;
pub use common::TokenId;
pub use sequence::{Sequence, SequenceError, Source, Step, Task, TaskError};
pub use time::{ClockTime, TimeError, MILLIS_PER_DAY};
