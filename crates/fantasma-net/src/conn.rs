//! Caller-programmed synthetic connections.
//!
//! A synthetic connection stands in for a network socket: the caller scripts
//! its behavior, the code under test drives it through the ordinary tokio
//! I/O traits. Nothing here touches a real network.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Duplex byte-stream contract expected of a synthetic connection.
///
/// Anything that reads and writes bytes asynchronously qualifies: a
/// [`MockConn`], one half of [`tokio::io::duplex`], or a real stream in the
/// rare test that wants one.
pub trait Conn: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> Conn for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

impl fmt::Debug for dyn Conn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<dyn Conn>")
    }
}

/// Owned, type-erased synthetic connection.
pub type BoxConn = Box<dyn Conn>;

type ReadFn = Box<dyn FnMut(&mut [u8]) -> io::Result<usize> + Send>;
type WriteFn = Box<dyn FnMut(&[u8]) -> io::Result<usize> + Send>;
type CloseFn = Box<dyn FnOnce() -> io::Result<()> + Send>;

/// Connection stub whose every operation is supplied by the caller.
///
/// Unconfigured operations take their zero-value behavior: reads report
/// end-of-stream, writes fail broken-pipe-shaped, close succeeds. A closure
/// returning [`io::ErrorKind::WouldBlock`] parks the task and immediately
/// reschedules it, so scripted backpressure does not wedge the runtime.
///
/// # Example
///
/// ```rust,ignore
/// use fantasma_net::MockConn;
/// use std::io::{Cursor, Read};
///
/// let mut request = Cursor::new(b"GET /test HTTP/1.0\r\n\r\n".to_vec());
/// let conn = MockConn::new()
///     .with_read(move |buf| request.read(buf))
///     .with_write(|_| Err(std::io::ErrorKind::BrokenPipe.into()));
/// ```
#[derive(Default)]
pub struct MockConn {
    read_fn: Option<ReadFn>,
    write_fn: Option<WriteFn>,
    close_fn: Option<CloseFn>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
}

impl MockConn {
    /// Creates a connection stub with zero-value behavior for every
    /// operation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the read side of the connection.
    ///
    /// The closure fills the destination buffer and returns how many bytes
    /// it produced; `Ok(0)` signals end-of-stream.
    #[must_use]
    pub fn with_read(
        mut self,
        read_fn: impl FnMut(&mut [u8]) -> io::Result<usize> + Send + 'static,
    ) -> Self {
        self.read_fn = Some(Box::new(read_fn));
        self
    }

    /// Scripts the write side of the connection.
    ///
    /// Returning `Err` here is how tests simulate peers that disconnect
    /// mid-response.
    #[must_use]
    pub fn with_write(
        mut self,
        write_fn: impl FnMut(&[u8]) -> io::Result<usize> + Send + 'static,
    ) -> Self {
        self.write_fn = Some(Box::new(write_fn));
        self
    }

    /// Scripts the close hook, invoked at most once on shutdown.
    #[must_use]
    pub fn with_close(mut self, close_fn: impl FnOnce() -> io::Result<()> + Send + 'static) -> Self {
        self.close_fn = Some(Box::new(close_fn));
        self
    }

    /// Sets the address reported as the local end of the connection.
    #[must_use]
    pub const fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Sets the address reported as the remote peer.
    #[must_use]
    pub const fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Returns the configured local address, if any.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Returns the configured peer address, if any.
    #[must_use]
    pub const fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Boxes this stub as an opaque [`BoxConn`].
    #[must_use]
    pub fn boxed(self) -> BoxConn {
        Box::new(self)
    }
}

impl fmt::Debug for MockConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockConn")
            .field("scripted_read", &self.read_fn.is_some())
            .field("scripted_write", &self.write_fn.is_some())
            .field("scripted_close", &self.close_fn.is_some())
            .field("local_addr", &self.local_addr)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

impl AsyncRead for MockConn {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let Some(read_fn) = this.read_fn.as_mut() else {
            // Zero-value read: immediate end-of-stream.
            return Poll::Ready(Ok(()));
        };

        let unfilled = buf.initialize_unfilled();
        let capacity = unfilled.len();
        match read_fn(unfilled) {
            Ok(n) => {
                buf.advance(n.min(capacity));
                Poll::Ready(Ok(()))
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(err) => Poll::Ready(Err(err)),
        }
    }
}

impl AsyncWrite for MockConn {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let Some(write_fn) = this.write_fn.as_mut() else {
            // Zero-value write: the peer is gone.
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        };

        match write_fn(buf) {
            Ok(n) => Poll::Ready(Ok(n.min(buf.len()))),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(err) => Poll::Ready(Err(err)),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match this.close_fn.take() {
            Some(close_fn) => Poll::Ready(close_fn()),
            None => Poll::Ready(Ok(())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_zero_value_read_is_eof() {
        let mut conn = MockConn::new();
        let mut buf = [0u8; 16];
        let n = conn.read(&mut buf).await.expect("read");
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_zero_value_write_is_broken_pipe() {
        let mut conn = MockConn::new();
        let err = conn.write(b"ping").await.expect_err("write should fail");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_zero_value_close_succeeds() {
        let mut conn = MockConn::new();
        conn.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn test_scripted_read_then_eof() {
        let mut script = std::io::Cursor::new(b"ping".to_vec());
        let mut conn = MockConn::new().with_read(move |buf| std::io::Read::read(&mut script, buf));

        let mut buf = Vec::new();
        conn.read_to_end(&mut buf).await.expect("read_to_end");
        assert_eq!(buf, b"ping");
    }

    #[tokio::test]
    async fn test_scripted_write_captures_bytes() {
        let written = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&written);
        let mut conn = MockConn::new().with_write(move |buf| {
            sink.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        });

        conn.write_all(b"pong").await.expect("write_all");
        assert_eq!(&*written.lock().expect("lock"), b"pong");
    }

    #[tokio::test]
    async fn test_scripted_write_error_surfaces() {
        let mut conn = MockConn::new()
            .with_write(|_| Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset")));
        let err = conn.write(b"x").await.expect_err("write should fail");
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn test_close_hook_runs_once() {
        let closed = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = std::sync::Arc::clone(&closed);
        let mut conn = MockConn::new().with_close(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });

        conn.shutdown().await.expect("first shutdown");
        conn.shutdown().await.expect("second shutdown");
        assert_eq!(closed.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_hook_error_surfaces() {
        let mut conn = MockConn::new()
            .with_close(|| Err(io::Error::new(io::ErrorKind::Other, "close failed")));
        let err = conn.shutdown().await.expect_err("shutdown should fail");
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_addresses_default_to_none() {
        let conn = MockConn::new();
        assert!(conn.local_addr().is_none());
        assert!(conn.peer_addr().is_none());
    }

    #[test]
    fn test_addresses_roundtrip() {
        let local: SocketAddr = "127.0.0.1:8080".parse().expect("local");
        let peer: SocketAddr = "127.0.0.1:9090".parse().expect("peer");
        let conn = MockConn::new().with_local_addr(local).with_peer_addr(peer);
        assert_eq!(conn.local_addr(), Some(local));
        assert_eq!(conn.peer_addr(), Some(peer));
    }

    #[test]
    fn test_debug_does_not_require_closures() {
        let conn = MockConn::new().with_read(|_| Ok(0));
        let rendered = format!("{conn:?}");
        assert!(rendered.contains("MockConn"));
        assert!(rendered.contains("scripted_read: true"));
    }

    #[test]
    fn test_would_block_parks_and_reschedules() {
        let mut polls = 0u32;
        let mut conn = MockConn::new().with_read(move |buf| {
            polls += 1;
            if polls == 1 {
                Err(io::ErrorKind::WouldBlock.into())
            } else {
                buf[0] = b'a';
                Ok(1)
            }
        });

        let mut read = tokio_test::task::spawn(async move {
            let mut buf = [0u8; 4];
            let n = conn.read(&mut buf).await.expect("read");
            (n, buf[0])
        });

        tokio_test::assert_pending!(read.poll());
        assert!(read.is_woken(), "a blocked read must reschedule itself");
        let (n, byte) = tokio_test::assert_ready!(read.poll());
        assert_eq!((n, byte), (1, b'a'));
    }

    #[tokio::test]
    async fn test_boxed_conn_reads_through_erasure() {
        let mut script = std::io::Cursor::new(b"abc".to_vec());
        let mut conn: BoxConn = MockConn::new().with_read(move |buf| std::io::Read::read(&mut script, buf)).boxed();

        let mut buf = Vec::new();
        conn.read_to_end(&mut buf).await.expect("read_to_end");
        assert_eq!(buf, b"abc");
    }
}
