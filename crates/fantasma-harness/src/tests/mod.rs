//! Scenario tests driving the harness end to end.
//!
//! Every scenario runs entirely in-process: the "network" is either a
//! [`tokio::io::duplex`] pair or a scripted mock connection.
