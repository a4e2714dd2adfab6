// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # fantasma-net
//!
//! Synthetic transport primitives for the Fantasma exchange harness.
//!
//! This crate provides the pieces a test drives a server through instead of
//! a real socket:
//!
//! - [`Conn`] / [`BoxConn`] duplex byte-stream contract for caller-owned
//!   synthetic connections
//! - [`MockConn`] caller-programmed connection stub (scripted reads,
//!   injected write faults)
//! - [`Listener`] / [`MockListener`] connection-acquisition seam
//! - [`TracedConn`] / [`TracedListener`] diagnostic decorators gated by
//!   [`TraceLevel`]
//! - [`is_network_error_fatal`] classifier separating expected peer
//!   behavior from genuine defects
//!
//! ## Iron Lotus Framework
//!
//! - **Jidoka**: explicit error handling, no panics
//! - **Genchi Genbutsu**: trace decorators expose every transport operation
//!
//! ## Example
//!
//! ```rust,ignore
//! use fantasma_net::{MockConn, is_network_error_fatal};
//! use std::io;
//!
//! let conn = MockConn::new()
//!     .with_write(|_| Err(io::Error::from(io::ErrorKind::BrokenPipe)));
//!
//! // A peer that hangs up mid-response is expected noise, not a defect.
//! let err = io::Error::from(io::ErrorKind::BrokenPipe);
//! assert!(!is_network_error_fatal(Some(&err)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod conn;
pub mod fault;
pub mod listener;
pub mod trace;

pub use conn::{BoxConn, Conn, MockConn};
pub use fault::{is_fatal, is_network_error_fatal};
pub use listener::{Listener, MockListener};
pub use trace::{TraceLevel, TracedConn, TracedListener};
