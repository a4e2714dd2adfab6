//! Network fault classification.
//!
//! Tests intentionally simulate peers that disconnect mid-response. The
//! classifier lets handler code log such failures and continue, while still
//! failing the test on genuine protocol or logic defects.

use std::error::Error;
use std::io;

/// Classifies a transport error, `None` meaning no error occurred.
///
/// Decision table, evaluated in order:
///
/// 1. No error → not fatal.
/// 2. End-of-stream → not fatal (graceful close).
/// 3. No I/O error anywhere in the source chain → fatal (unrecognized
///    shape, treated conservatively as real).
/// 4. Timeout or transient condition → not fatal.
/// 5. Broken pipe or connection reset, by kind or by raw errno → not fatal
///    (the peer disconnected, expected in adversarial scenarios).
/// 6. Anything else → fatal.
#[must_use]
pub fn is_network_error_fatal(err: Option<&(dyn Error + 'static)>) -> bool {
    err.is_some_and(is_fatal)
}

/// Classifies a present transport error.
///
/// Walks the error's source chain looking for the underlying
/// [`io::Error`], so wrapped shapes (an HTTP connection driver error
/// around a socket fault, say) classify the same as the bare fault.
#[must_use]
pub fn is_fatal(err: &(dyn Error + 'static)) -> bool {
    let Some(io_err) = find_io_error(err) else {
        return true;
    };

    match io_err.kind() {
        // connection closed
        io::ErrorKind::UnexpectedEof => false,
        // timeouts and transient conditions resolve themselves
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => false,
        // peer disconnected
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => false,
        _ => !matches!(
            io_err.raw_os_error(),
            Some(libc::EPIPE | libc::ECONNRESET)
        ),
    }
}

/// Finds the first I/O error in the source chain, the error itself
/// included.
fn find_io_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a io::Error> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        current = err.source();
    }
    None
}
