//! Recording presenter and delivery sink, plus a ready-made UI loop.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::collaborators::{DeliverySink, Presenter};
use crate::outcome::{OutcomeKind, TransactionOutcome};
use crate::ui::{create_ui_dispatcher, UiHandle};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// A presenter call, as seen by the recording presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    Animation {
        outcome_id: String,
        kind: OutcomeKind,
    },
    PrintingProgress,
    HidePrintingProgress,
    PrintingError(String),
    PrintingSuccess,
}

/// Presenter that records every call.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    calls: Mutex<Vec<PresenterCall>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls, oldest first.
    pub fn calls(&self) -> Vec<PresenterCall> {
        lock(&self.calls).clone()
    }

    /// Number of animations shown.
    pub fn animation_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, PresenterCall::Animation { .. }))
            .count()
    }

    fn push(&self, call: PresenterCall) {
        lock(&self.calls).push(call);
    }
}

impl Presenter for RecordingPresenter {
    fn show_animation(&self, outcome: &TransactionOutcome, kind: OutcomeKind) {
        self.push(PresenterCall::Animation {
            outcome_id: outcome.id.clone(),
            kind,
        });
    }

    fn show_printing_progress(&self) {
        self.push(PresenterCall::PrintingProgress);
    }

    fn hide_printing_progress(&self) {
        self.push(PresenterCall::HidePrintingProgress);
    }

    fn show_printing_error(&self, message: &str) {
        self.push(PresenterCall::PrintingError(message.to_string()));
    }

    fn show_printing_success(&self) {
        self.push(PresenterCall::PrintingSuccess);
    }
}

/// Delivery sink that records every delivered outcome.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<TransactionOutcome>>,
    notify: Notify,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all delivered outcomes, in delivery order.
    pub fn delivered(&self) -> Vec<TransactionOutcome> {
        lock(&self.delivered).clone()
    }

    /// Ids of the delivered outcomes, in delivery order.
    pub fn delivered_ids(&self) -> Vec<String> {
        lock(&self.delivered).iter().map(|o| o.id.clone()).collect()
    }

    pub fn delivery_count(&self) -> usize {
        lock(&self.delivered).len()
    }

    /// Wait until at least `count` outcomes were delivered.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub async fn wait_for_deliveries(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.delivery_count() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

impl DeliverySink for RecordingSink {
    fn deliver(&self, outcome: TransactionOutcome) {
        lock(&self.delivered).push(outcome);
        self.notify.notify_waiters();
    }
}

/// A running UI loop wired to a recording presenter and sink.
pub struct TestUi {
    pub presenter: Arc<RecordingPresenter>,
    pub sink: Arc<RecordingSink>,
    handle: UiHandle,
    _task: JoinHandle<()>,
}

impl TestUi {
    /// Spawn the loop. Must be called from within a tokio runtime.
    pub fn start() -> Self {
        let presenter = Arc::new(RecordingPresenter::new());
        let sink = Arc::new(RecordingSink::new());
        let (handle, ui_loop) = create_ui_dispatcher(presenter.clone(), sink.clone());
        let task = tokio::spawn(ui_loop.run());

        Self {
            presenter,
            sink,
            handle,
            _task: task,
        }
    }

    /// A handle for posting to the loop.
    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Wait until every command posted so far has run.
    pub async fn flush(&self) {
        self.handle
            .flush()
            .await
            .expect("UI loop stopped while flushing");
    }
}
