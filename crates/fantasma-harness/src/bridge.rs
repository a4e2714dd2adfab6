//! Push-to-pull connection handoff.
//!
//! The serving loop pulls connections through a [`Listener`]; test code
//! pushes exactly one. The bridge is the single-slot channel between the
//! two: the first accept consumes the slot, every later accept parks
//! forever. That is the deliberate one-shot limitation of the harness, not
//! a pool waiting to be generalized.

use std::fmt;
use std::io;

use async_trait::async_trait;
use fantasma_net::{BoxConn, Listener};
use tokio::sync::oneshot;

/// Creates the two ends of a single-connection handoff.
#[must_use]
pub fn conn_slot() -> (ConnSender, ConnSlot) {
    let (tx, rx) = oneshot::channel();
    (ConnSender { tx }, ConnSlot { rx: Some(rx) })
}

/// Push side: delivers the run's one connection, or the error that
/// prevented it.
pub struct ConnSender {
    tx: oneshot::Sender<io::Result<BoxConn>>,
}

impl ConnSender {
    /// Hands the connection outcome to the serving loop.
    ///
    /// If the serving loop is already gone the outcome is discarded; the
    /// run has been torn down and nobody is left to care.
    pub fn send(self, outcome: io::Result<BoxConn>) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("conn slot receiver dropped, discarding outcome");
        }
    }
}

impl fmt::Debug for ConnSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnSender").finish_non_exhaustive()
    }
}

/// Pull side: a [`Listener`] over the single delivered connection.
pub struct ConnSlot {
    rx: Option<oneshot::Receiver<io::Result<BoxConn>>>,
}

impl fmt::Debug for ConnSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnSlot")
            .field("consumed", &self.rx.is_none())
            .finish()
    }
}

#[async_trait]
impl Listener for ConnSlot {
    async fn accept(&mut self) -> io::Result<BoxConn> {
        match self.rx.take() {
            Some(rx) => match rx.await {
                Ok(outcome) => {
                    tracing::debug!(ok = outcome.is_ok(), "synthetic connection delivered");
                    outcome
                }
                // The producer vanished without delivering; surface it
                // instead of hanging the accept forever.
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "connection producer dropped without delivering a connection",
                )),
            },
            // One-shot: the slot has been consumed and no further
            // connection will ever arrive.
            None => std::future::pending().await,
        }
    }
}
