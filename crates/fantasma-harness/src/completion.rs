//! Completion tracking and deadline arbitration.
//!
//! A run is finished when every registered participant has signaled. The
//! tracker hands each participant an owned guard instead of a bare counter:
//! a guard signals exactly once, on [`CompletionGuard::done`] or on drop,
//! so error and panic paths cannot leave the tracker hanging and nothing
//! can ever signal twice.

use std::time::Duration;

use tokio::sync::mpsc;

/// How the wait for a run's completion resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every registered participant signaled before the deadline.
    Completed,
    /// The deadline elapsed with participants still outstanding.
    TimedOut,
}

impl WaitOutcome {
    /// Returns true if the deadline won the race.
    #[must_use]
    pub const fn timed_out(self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Tracks the outstanding participants of a single run.
///
/// Register every participant before waiting; registrations after
/// [`Completion::wait`] has consumed the tracker are impossible by
/// construction.
#[derive(Debug)]
pub struct Completion {
    tx: mpsc::Sender<()>,
    rx: mpsc::Receiver<()>,
}

/// Owned completion signal for one participant.
///
/// Signals exactly once: explicitly through [`CompletionGuard::done`], or
/// implicitly when dropped on an error path.
#[derive(Debug)]
pub struct CompletionGuard {
    _tx: mpsc::Sender<()>,
}

impl CompletionGuard {
    /// Signals completion for this participant.
    pub fn done(self) {}
}

impl Completion {
    /// Creates a tracker with no participants.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx }
    }

    /// Registers a participant, returning its completion guard.
    #[must_use]
    pub fn register(&self) -> CompletionGuard {
        CompletionGuard {
            _tx: self.tx.clone(),
        }
    }

    /// Blocks until every registered participant has signaled, or until
    /// `timeout` elapses.
    ///
    /// A zero `timeout` means wait indefinitely: the caller opted out of
    /// bounding, and a deadlocked participant will hang the run. Otherwise
    /// the deadline races the completion signal and whichever resolves
    /// first decides the outcome.
    pub async fn wait(self, timeout: Duration) -> WaitOutcome {
        let Self { tx, mut rx } = self;
        // The tracker's own sender must not keep the channel open.
        drop(tx);

        let all_signaled = async move { while rx.recv().await.is_some() {} };

        if timeout.is_zero() {
            all_signaled.await;
            return WaitOutcome::Completed;
        }

        match tokio::time::timeout(timeout, all_signaled).await {
            Ok(()) => WaitOutcome::Completed,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_with_no_participants_completes() {
        let completion = Completion::new();
        assert_eq!(completion.wait(Duration::ZERO).await, WaitOutcome::Completed);
    }

    #[tokio::test]
    async fn test_explicit_done_completes() {
        let completion = Completion::new();
        let guard = completion.register();

        tokio::spawn(async move {
            guard.done();
        });

        assert_eq!(completion.wait(Duration::ZERO).await, WaitOutcome::Completed);
    }

    #[tokio::test]
    async fn test_drop_signals_completion() {
        let completion = Completion::new();
        let guard = completion.register();

        tokio::spawn(async move {
            let _held = guard;
            // Returning drops the guard; no explicit signal.
        });

        assert_eq!(completion.wait(Duration::ZERO).await, WaitOutcome::Completed);
    }

    #[tokio::test]
    async fn test_panic_path_still_signals() {
        let completion = Completion::new();
        let guard = completion.register();

        let handle = tokio::spawn(async move {
            let _held = guard;
            panic!("participant died");
        });

        assert_eq!(completion.wait(Duration::from_secs(1)).await, WaitOutcome::Completed);
        assert!(handle.await.is_err());
    }

    #[test]
    fn test_waits_for_all_participants() {
        let completion = Completion::new();
        let first = completion.register();
        let second = completion.register();

        let mut wait = tokio_test::task::spawn(completion.wait(Duration::ZERO));

        tokio_test::assert_pending!(wait.poll());
        first.done();
        tokio_test::assert_pending!(wait.poll(), "one guard still outstanding");
        second.done();
        tokio_test::assert_ready_eq!(wait.poll(), WaitOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outstanding_participant_times_out() {
        let completion = Completion::new();
        let guard = completion.register();

        let outcome = completion.wait(Duration::from_millis(50)).await;
        assert!(outcome.timed_out());
        drop(guard);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_beats_late_signal() {
        let completion = Completion::new();
        let guard = completion.register();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            guard.done();
        });

        let started = tokio::time::Instant::now();
        let outcome = completion.wait(Duration::from_millis(100)).await;
        assert!(outcome.timed_out());
        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }
}
