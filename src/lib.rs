//! Fantasma: One-Shot Synthetic Network Exchange Harness
//!
//! Part of the PAIML Sovereign AI Stack.
//!
//! Drives exactly one HTTP request/response through a serving loop over a
//! caller-supplied synthetic connection - no sockets, no flakiness, bounded
//! wall-clock time.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fantasma::prelude::*;
//!
//! // Re-exports from sub-crates for convenience
//! ```

pub use fantasma_harness as harness;
pub use fantasma_net as net;

/// Prelude module for common imports.
pub mod prelude {
    pub use fantasma_harness::{
        Completion, CompletionGuard, Exchange, ExchangeRequest, ExchangeResponse, HarnessError,
        WaitOutcome,
    };
    pub use fantasma_net::{
        BoxConn, Conn, Listener, MockConn, MockListener, TraceLevel, is_network_error_fatal,
    };
}
