// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # fantasma-harness
//!
//! One-shot synthetic exchange harness: drives exactly one HTTP
//! request/response through a serving loop over a caller-supplied
//! synthetic connection, with no socket anywhere, then tears the loop down
//! deterministically and reports the first error observed.
//!
//! This crate provides:
//! - **Exchange orchestration**: [`Exchange`] composes the pieces below
//!   into one bounded run
//! - **Connection bridge**: [`conn_slot`] adapts one push-delivered
//!   connection into the pull-based accept contract of a serving loop
//! - **Completion tracking**: [`Completion`] and [`CompletionGuard`]
//!   decide when a run is finished rather than hung
//! - **Deadline arbitration**: [`Completion::wait`] races completion
//!   against an optional bound
//!
//! ## Iron Lotus Framework
//!
//! - **Jidoka**: first defect stops the run; exactly one outcome survives
//! - **Poka-Yoke**: completion guards cannot signal twice or be forgotten
//!
//! ## Example
//!
//! ```rust,ignore
//! use fantasma_harness::Exchange;
//! use std::time::Duration;
//!
//! let outcome = Exchange::new(new_conn, handler)
//!     .with_timeout(Duration::from_secs(1))
//!     .run_once()
//!     .await;
//! assert!(outcome.is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod completion;
pub mod error;
pub mod exchange;
#[cfg(test)]
pub mod tests;

pub use bridge::{ConnSender, ConnSlot, conn_slot};
pub use completion::{Completion, CompletionGuard, WaitOutcome};
pub use error::{HarnessError, Result};
pub use exchange::{Exchange, ExchangeRequest, ExchangeResponse};
