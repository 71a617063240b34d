//! Time-bounded result animation tracking.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::types::{AnimationEnd, AnimationEvent, AnimationHandle};

/// The animation currently waiting for its timer.
struct PendingAnimation {
    handle: AnimationHandle,
    timer: JoinHandle<()>,
    done_tx: oneshot::Sender<AnimationEnd>,
}

#[derive(Default)]
struct StageInner {
    next_id: u64,
    pending: Option<PendingAnimation>,
}

/// Tracks completion of the result mark shown after a host response.
///
/// Only one animation is pending at a time. Starting a new one discards the
/// previous one without signalling it, so completions never stack up. What is
/// actually drawn is the presenter's business; this stage only decides when
/// the animation counts as finished.
#[derive(Clone, Default)]
pub struct AnimationStage {
    inner: Arc<Mutex<StageInner>>,
    listener: Option<mpsc::UnboundedSender<AnimationEvent>>,
}

/// Returned by [`AnimationStage::start`]: the handle plus a way to await the end.
#[derive(Debug)]
pub struct AnimationTicket {
    handle: AnimationHandle,
    done_rx: oneshot::Receiver<AnimationEnd>,
}

impl AnimationTicket {
    pub fn handle(&self) -> AnimationHandle {
        self.handle
    }

    /// Wait for the animation to end.
    pub async fn wait(self) -> AnimationEnd {
        // The sender only disappears without a value if the stage was dropped
        // mid-flight, which is as good as discarding the animation.
        self.done_rx.await.unwrap_or(AnimationEnd::Discarded)
    }
}

impl AnimationStage {
    /// Create a stage without a completion listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send an [`AnimationEvent`] to `listener` every time an animation completes.
    pub fn with_listener(mut self, listener: mpsc::UnboundedSender<AnimationEvent>) -> Self {
        self.listener = Some(listener);
        self
    }

    fn lock(&self) -> MutexGuard<'_, StageInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start an animation that completes after `duration`.
    ///
    /// Must be called from within a tokio runtime; see [`start_on`](Self::start_on).
    pub fn start(&self, duration: Duration) -> AnimationTicket {
        self.start_on(&Handle::current(), duration)
    }

    /// Start an animation whose timer runs on `runtime`.
    ///
    /// Callable from any thread.
    pub fn start_on(&self, runtime: &Handle, duration: Duration) -> AnimationTicket {
        let mut inner = self.lock();

        if let Some(previous) = inner.pending.take() {
            debug!("Discarding pending animation {}", previous.handle);
            previous.timer.abort();
            let _ = previous.done_tx.send(AnimationEnd::Discarded);
        }

        inner.next_id += 1;
        let handle = AnimationHandle(inner.next_id);
        let (done_tx, done_rx) = oneshot::channel();

        let stage = self.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            stage.finish(handle, AnimationEnd::Elapsed);
        });

        debug!("Started animation {} for {:?}", handle, duration);
        inner.pending = Some(PendingAnimation {
            handle,
            timer,
            done_tx,
        });

        AnimationTicket { handle, done_rx }
    }

    /// Complete the animation immediately.
    ///
    /// Returns `false` (and signals nothing) if it already completed.
    pub fn cancel(&self, handle: AnimationHandle) -> bool {
        self.finish(handle, AnimationEnd::Cancelled)
    }

    /// Complete whatever animation is pending. Returns `false` if none was.
    pub fn force_complete(&self) -> bool {
        let pending = self.lock().pending.as_ref().map(|p| p.handle);
        match pending {
            Some(handle) => self.cancel(handle),
            None => false,
        }
    }

    /// Drop the pending animation without signalling completion.
    pub fn reset(&self) {
        if let Some(previous) = self.lock().pending.take() {
            debug!("Resetting animation {}", previous.handle);
            previous.timer.abort();
            let _ = previous.done_tx.send(AnimationEnd::Discarded);
        }
    }

    /// Whether `handle` is no longer pending.
    ///
    /// A discarded animation reports complete as well: nothing is left to wait for.
    pub fn is_complete(&self, handle: AnimationHandle) -> bool {
        let inner = self.lock();
        let started = handle.0 >= 1 && handle.0 <= inner.next_id;
        let pending = inner.pending.as_ref().is_some_and(|p| p.handle == handle);
        started && !pending
    }

    /// Whether any animation is waiting for its timer.
    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    fn finish(&self, handle: AnimationHandle, end: AnimationEnd) -> bool {
        let pending = {
            let mut inner = self.lock();
            match inner.pending.as_ref() {
                Some(p) if p.handle == handle => inner.pending.take(),
                _ => None,
            }
        };

        let Some(pending) = pending else {
            return false;
        };

        if end == AnimationEnd::Cancelled {
            pending.timer.abort();
        }
        debug!("Animation {} completed: {:?}", handle, end);

        let _ = pending.done_tx.send(end);
        if let Some(listener) = &self.listener {
            let _ = listener.send(AnimationEvent { handle, end });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_duration() {
        let stage = AnimationStage::new();
        let ticket = stage.start(Duration::from_millis(1200));
        let handle = ticket.handle();
        let mut wait = task::spawn(ticket.wait());

        assert_pending!(wait.poll());
        assert!(!stage.is_complete(handle));

        tokio::time::sleep(Duration::from_millis(1199)).await;
        assert_pending!(wait.poll());

        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_ready_eq!(wait.poll(), AnimationEnd::Elapsed);
        assert!(stage.is_complete(handle));
        assert!(!stage.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_completes_immediately() {
        let stage = AnimationStage::new();
        let ticket = stage.start(Duration::from_secs(60));
        let handle = ticket.handle();

        assert!(stage.cancel(handle));
        assert!(stage.is_complete(handle));
        assert_eq!(ticket.wait().await, AnimationEnd::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_completion_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stage = AnimationStage::new().with_listener(tx);
        let ticket = stage.start(Duration::from_millis(10));
        let handle = ticket.handle();

        assert_eq!(ticket.wait().await, AnimationEnd::Elapsed);
        assert!(!stage.cancel(handle));
        assert!(!stage.cancel(handle));

        let event = rx.recv().await.expect("Should receive completion event");
        assert_eq!(event.handle, handle);
        assert_eq!(event.end, AnimationEnd::Elapsed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_discards_previous_without_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stage = AnimationStage::new().with_listener(tx);

        let first = stage.start(Duration::from_millis(100));
        let first_handle = first.handle();
        let second = stage.start(Duration::from_millis(100));
        let second_handle = second.handle();

        assert_ne!(first_handle, second_handle);
        assert_eq!(first.wait().await, AnimationEnd::Discarded);
        assert!(stage.is_complete(first_handle));
        assert!(!stage.cancel(first_handle));

        assert_eq!(second.wait().await, AnimationEnd::Elapsed);

        let event = rx.recv().await.expect("Should receive one event");
        assert_eq!(event.handle, second_handle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_complete_and_reset() {
        let stage = AnimationStage::new();
        assert!(!stage.force_complete());

        let ticket = stage.start(Duration::from_secs(5));
        assert!(stage.force_complete());
        assert_eq!(ticket.wait().await, AnimationEnd::Cancelled);

        let ticket = stage.start(Duration::from_secs(5));
        stage.reset();
        assert!(!stage.is_pending());
        assert_eq!(ticket.wait().await, AnimationEnd::Discarded);
    }

    #[tokio::test]
    async fn test_unknown_handle_is_not_complete() {
        let stage = AnimationStage::new();
        assert!(!stage.is_complete(AnimationHandle(0)));
        assert!(!stage.is_complete(AnimationHandle(7)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_start_on_from_plain_thread() {
        let stage = AnimationStage::new();
        let runtime = Handle::current();

        let ticket = std::thread::spawn({
            let stage = stage.clone();
            move || stage.start_on(&runtime, Duration::from_millis(20))
        })
        .join()
        .expect("Starting off the runtime should not panic");

        assert_eq!(ticket.wait().await, AnimationEnd::Elapsed);
        assert!(!stage.is_pending());
    }
}
