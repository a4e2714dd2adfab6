//! Connection-acquisition seam.
//!
//! A [`Listener`] is the pull side of connection delivery: the serving loop
//! asks it for the next connection and blocks until one is available. Test
//! code supplies the push side.

use std::fmt;
use std::io;

use async_trait::async_trait;

use crate::conn::{BoxConn, MockConn};

/// Source of inbound synthetic connections.
///
/// The contract mirrors a listening socket: `accept` blocks until a
/// connection is available and returns it, or fails with the error that
/// prevented one from being established.
#[async_trait]
pub trait Listener: Send {
    /// Waits for and returns the next connection.
    ///
    /// # Errors
    /// Returns an error when connection establishment failed; the caller
    /// must treat this as fatal and stop serving.
    async fn accept(&mut self) -> io::Result<BoxConn>;
}

#[async_trait]
impl<L: Listener + ?Sized> Listener for Box<L> {
    async fn accept(&mut self) -> io::Result<BoxConn> {
        (**self).accept().await
    }
}

type AcceptFn = Box<dyn FnMut() -> io::Result<BoxConn> + Send>;

/// Listener stub with a caller-supplied accept function.
///
/// The zero-value stub accepts an unconfigured [`MockConn`] every time it
/// is asked.
#[derive(Default)]
pub struct MockListener {
    accept_fn: Option<AcceptFn>,
}

impl MockListener {
    /// Creates a listener stub with zero-value behavior.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the accept operation.
    #[must_use]
    pub fn with_accept(
        mut self,
        accept_fn: impl FnMut() -> io::Result<BoxConn> + Send + 'static,
    ) -> Self {
        self.accept_fn = Some(Box::new(accept_fn));
        self
    }
}

impl fmt::Debug for MockListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockListener")
            .field("scripted_accept", &self.accept_fn.is_some())
            .finish()
    }
}

#[async_trait]
impl Listener for MockListener {
    async fn accept(&mut self) -> io::Result<BoxConn> {
        match self.accept_fn.as_mut() {
            Some(accept_fn) => accept_fn(),
            None => Ok(MockConn::new().boxed()),
        }
    }
}
