//! Diagnostic decorators for synthetic transports.
//!
//! # Toyota Way: Genchi Genbutsu (現地現物)
//! "Go and see for yourself" - every read, write, and close on a decorated
//! connection is logged as it happens, with an optional call stack.

use std::backtrace::Backtrace;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::conn::{BoxConn, Conn};
use crate::listener::Listener;

/// Longest byte preview rendered into a log line.
const PREVIEW_MAX: usize = 1024;

/// How much diagnostic wrapping an exchange gets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceLevel {
    /// No diagnostic wrapping.
    #[default]
    Off,
    /// Every connection operation is logged with a size-capped byte
    /// preview.
    On,
    /// As [`TraceLevel::On`], plus the call stack for each operation.
    WithCaller,
}

impl TraceLevel {
    /// Returns true if connections should be decorated at all.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self >= Self::On
    }

    /// Returns true if each operation should also record its call stack.
    #[must_use]
    pub const fn with_caller(self) -> bool {
        matches!(self, Self::WithCaller)
    }
}

/// Renders a quoted, size-capped preview of a byte slice.
fn preview(bytes: &[u8]) -> String {
    if bytes.len() <= PREVIEW_MAX {
        format!("\"{}\"", bytes.escape_ascii())
    } else {
        format!("\"{}\"...", bytes[..PREVIEW_MAX].escape_ascii())
    }
}

fn log_caller() {
    tracing::debug!(stack = %Backtrace::force_capture(), "caller");
}

/// Connection decorator logging every operation through `tracing`.
///
/// A transparent tee: results and payloads pass through untouched.
#[derive(Debug)]
pub struct TracedConn<S> {
    inner: S,
    print_caller: bool,
}

impl<S: Conn> TracedConn<S> {
    /// Wraps a connection, optionally recording call stacks per operation.
    #[must_use]
    pub const fn new(inner: S, print_caller: bool) -> Self {
        Self {
            inner,
            print_caller,
        }
    }

    /// Consumes the decorator, returning the underlying connection.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Conn> AsyncRead for TracedConn<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let filled_before = buf.filled().len();
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let read = &buf.filled()[filled_before..];
                tracing::debug!(n = read.len(), data = %preview(read), "conn read");
                if this.print_caller {
                    log_caller();
                }
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(err)) => {
                tracing::debug!(error = %err, "conn read failed");
                if this.print_caller {
                    log_caller();
                }
                Poll::Ready(Err(err))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S: Conn> AsyncWrite for TracedConn<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => {
                tracing::debug!(n, data = %preview(&buf[..n]), "conn write");
                if this.print_caller {
                    log_caller();
                }
                Poll::Ready(Ok(n))
            }
            Poll::Ready(Err(err)) => {
                tracing::debug!(error = %err, "conn write failed");
                if this.print_caller {
                    log_caller();
                }
                Poll::Ready(Err(err))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_shutdown(cx) {
            Poll::Ready(result) => {
                tracing::debug!(ok = result.is_ok(), "conn close");
                if this.print_caller {
                    log_caller();
                }
                Poll::Ready(result)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Listener decorator that traces every accepted connection.
#[derive(Debug)]
pub struct TracedListener<L> {
    inner: L,
    print_caller: bool,
}

impl<L: Listener> TracedListener<L> {
    /// Wraps a listener so accepted connections come back decorated.
    #[must_use]
    pub const fn new(inner: L, print_caller: bool) -> Self {
        Self {
            inner,
            print_caller,
        }
    }
}

#[async_trait]
impl<L: Listener> Listener for TracedListener<L> {
    async fn accept(&mut self) -> io::Result<BoxConn> {
        let conn = self.inner.accept().await?;
        tracing::debug!("conn accepted");
        Ok(Box::new(TracedConn::new(conn, self.print_caller)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::MockConn;
    use crate::listener::MockListener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_trace_level_ordering() {
        assert!(TraceLevel::Off < TraceLevel::On);
        assert!(TraceLevel::On < TraceLevel::WithCaller);
    }

    #[test]
    fn test_trace_level_default_is_off() {
        assert_eq!(TraceLevel::default(), TraceLevel::Off);
        assert!(!TraceLevel::default().is_enabled());
    }

    #[test]
    fn test_trace_level_flags() {
        assert!(TraceLevel::On.is_enabled());
        assert!(!TraceLevel::On.with_caller());
        assert!(TraceLevel::WithCaller.is_enabled());
        assert!(TraceLevel::WithCaller.with_caller());
    }

    #[test]
    fn test_preview_quotes_short_payloads() {
        assert_eq!(preview(b"ping"), "\"ping\"");
    }

    #[test]
    fn test_preview_escapes_control_bytes() {
        assert_eq!(preview(b"a\r\nb"), "\"a\\r\\nb\"");
    }

    #[test]
    fn test_preview_caps_long_payloads() {
        let payload = vec![b'x'; PREVIEW_MAX + 1];
        let rendered = preview(&payload);
        assert!(rendered.ends_with("\"..."));
        assert_eq!(rendered.len(), PREVIEW_MAX + "\"\"...".len());
    }

    #[tokio::test]
    async fn test_traced_conn_passes_data_through() {
        let mut script = std::io::Cursor::new(b"ping".to_vec());
        let inner = MockConn::new().with_read(move |buf| std::io::Read::read(&mut script, buf));
        let mut conn = TracedConn::new(inner, false);

        let mut buf = Vec::new();
        conn.read_to_end(&mut buf).await.expect("read_to_end");
        assert_eq!(buf, b"ping");
    }

    #[tokio::test]
    async fn test_traced_conn_passes_errors_through() {
        let inner =
            MockConn::new().with_write(|_| Err(io::Error::from(io::ErrorKind::BrokenPipe)));
        let mut conn = TracedConn::new(inner, false);

        let err = conn.write(b"x").await.expect_err("write should fail");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_traced_conn_shutdown_passes_through() {
        let mut conn = TracedConn::new(MockConn::new(), false);
        conn.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn test_traced_listener_decorates_accepted_conns() {
        let mut listener = TracedListener::new(MockListener::new(), false);
        let mut conn = listener.accept().await.expect("accept");

        let mut buf = [0u8; 4];
        let n = conn.read(&mut buf).await.expect("read");
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_traced_listener_passes_accept_errors_through() {
        let inner = MockListener::new()
            .with_accept(|| Err(io::Error::new(io::ErrorKind::ConnectionRefused, "no peer")));
        let mut listener = TracedListener::new(inner, false);

        let err = listener.accept().await.expect_err("accept should fail");
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }
}
