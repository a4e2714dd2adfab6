//! One-shot exchange orchestration.
//!
//! # Toyota Way: Jidoka (自働化)
//! Stop cleanly on the first defect. A run moves through
//! `Starting → AwaitingConnection → Serving → Completing → Closed` and
//! reports exactly one outcome, the first error any stage produced.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use fantasma_net::{BoxConn, Listener, TraceLevel, TracedListener, fault};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;

use crate::bridge::conn_slot;
use crate::completion::{Completion, CompletionGuard};
use crate::error::{HarnessError, Result};

/// Request type handed to an exchange handler.
pub type ExchangeRequest = Request<Incoming>;

/// Response type an exchange handler produces.
pub type ExchangeResponse = Response<Full<Bytes>>;

type ConnectFuture = Pin<Box<dyn Future<Output = io::Result<BoxConn>> + Send>>;
type ConnectFn = Box<dyn FnOnce(CompletionGuard) -> ConnectFuture + Send>;
type HandlerFuture = Pin<Box<dyn Future<Output = ExchangeResponse> + Send>>;
type HandlerFn = Arc<dyn Fn(ExchangeRequest) -> HandlerFuture + Send + Sync>;

/// Configuration for one synthetic request/response exchange.
///
/// The connection producer is handed a [`CompletionGuard`] and must release
/// it only once the client side of the exchange has fully finished, not
/// merely once the connection object exists; releasing early lets the run
/// tear down mid-exchange. The handler's guard is managed by the harness
/// and released as soon as the handler returns.
///
/// # Example
///
/// ```rust,ignore
/// use fantasma_harness::Exchange;
/// use std::time::Duration;
///
/// let err = Exchange::new(
///     |done| async move {
///         let (client, server) = tokio::io::duplex(4096);
///         tokio::spawn(drive_client(client, done));
///         Ok(Box::new(server) as _)
///     },
///     |req| async move { pong_response(req) },
/// )
/// .with_timeout(Duration::from_secs(1))
/// .run_once()
/// .await;
/// ```
pub struct Exchange {
    connect: ConnectFn,
    handler: HandlerFn,
    trace: TraceLevel,
    timeout: Duration,
}

impl Exchange {
    /// Creates an exchange from a connection producer and a request
    /// handler.
    #[must_use]
    pub fn new<C, CFut, H, HFut>(connect: C, handler: H) -> Self
    where
        C: FnOnce(CompletionGuard) -> CFut + Send + 'static,
        CFut: Future<Output = io::Result<BoxConn>> + Send + 'static,
        H: Fn(ExchangeRequest) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = ExchangeResponse> + Send + 'static,
    {
        Self {
            connect: Box::new(move |done| Box::pin(connect(done))),
            handler: Arc::new(move |req| Box::pin(handler(req))),
            trace: TraceLevel::Off,
            timeout: Duration::ZERO,
        }
    }

    /// Enables diagnostic tracing of the exchanged bytes.
    #[must_use]
    pub const fn with_trace(mut self, trace: TraceLevel) -> Self {
        self.trace = trace;
        self
    }

    /// Bounds the total run time.
    ///
    /// Zero means wait indefinitely for completion; a run whose
    /// participants deadlock will then hang, which the caller accepted by
    /// not configuring a bound.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Drives exactly one exchange through the serving loop and tears it
    /// down.
    ///
    /// The connection producer and the serving loop run concurrently; the
    /// run finishes when both the producer and the handler have signaled
    /// completion, or when the configured deadline expires. The serving
    /// loop is closed only after that race is decided.
    ///
    /// # Errors
    /// Returns the first error observed: a connection setup failure
    /// (surfaced through the accept stage), a serve-loop failure, the
    /// timeout sentinel, or a teardown failure. A timeout that won the
    /// race overrides late-arriving serve errors.
    pub async fn run_once(self) -> Result<()> {
        let Self {
            connect,
            handler,
            trace,
            timeout,
        } = self;

        // Starting: both participants register before anything runs.
        let completion = Completion::new();
        let producing_done = completion.register();
        let handling_done = completion.register();

        let (conn_tx, slot) = conn_slot();
        tokio::spawn(async move {
            let outcome = connect(producing_done).await;
            if let Err(err) = &outcome {
                tracing::debug!(error = %err, "connection setup failed");
            }
            conn_tx.send(outcome);
        });

        let mut listener: Box<dyn Listener> = Box::new(slot);
        if trace.is_enabled() {
            listener = Box::new(TracedListener::new(listener, trace.with_caller()));
        }

        // AwaitingConnection and Serving both live inside the serving
        // task; its result is a candidate outcome.
        let serving = tokio::spawn(serve(listener, handler, handling_done));

        // Completing: the arbiter decides the winning path.
        let outcome = completion.wait(timeout).await;

        // Closed: torn down only after the arbiter resolved, so a
        // just-in-time completion is not cut off mid-flight.
        serving.abort();

        if outcome.timed_out() {
            tracing::warn!(timeout = ?timeout, "run timed out with participants outstanding");
            return Err(HarnessError::Timeout(timeout));
        }

        match serving.await {
            Ok(result) => result,
            // Cancellation is the expected shutdown for a serving task
            // parked on its second accept.
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => Err(HarnessError::shutdown(err.to_string())),
        }
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("trace", &self.trace)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Serving loop: accept one connection, drive one exchange over it, then
/// park until torn down.
async fn serve(
    mut listener: Box<dyn Listener>,
    handler: HandlerFn,
    handling_done: CompletionGuard,
) -> Result<()> {
    let conn = match listener.accept().await {
        Ok(conn) => conn,
        Err(err) => {
            tracing::debug!(error = %err, "accept failed, stopping serve loop");
            return Err(HarnessError::Setup(err));
        }
    };

    let handling_done = Arc::new(Mutex::new(Some(handling_done)));
    let service = service_fn(move |req: ExchangeRequest| {
        let handler = Arc::clone(&handler);
        let handling_done = Arc::clone(&handling_done);
        async move {
            let response = handler(req).await;
            if let Some(done) = handling_done.lock().take() {
                done.done();
            }
            Ok::<_, Infallible>(response)
        }
    });

    match http1::Builder::new()
        .serve_connection(TokioIo::new(conn), service)
        .await
    {
        Ok(()) => tracing::debug!("exchange finished, connection closed"),
        Err(err) => {
            // Peer-disconnect shapes are expected noise in adversarial
            // scenarios; anything else is a real serve failure.
            if fault::is_fatal(&err) {
                return Err(HarnessError::Serve(err));
            }
            tracing::debug!(error = %err, "peer disconnected mid-exchange");
        }
    }

    // One-shot: no further connection ever arrives. Park here until the
    // orchestrator tears this task down.
    let _ = listener.accept().await;
    Ok(())
}
