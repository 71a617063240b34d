use std::sync::Arc;

use tokio::sync::mpsc;

use super::{UiCommand, UiHandle};
use crate::collaborators::{DeliverySink, Presenter};
use crate::metrics;

/// Background task that runs every UI-affine call in posting order.
///
/// This is the single place where the presenter and the delivery sink are
/// invoked, so they never see concurrent calls.
pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<UiCommand>,
    presenter: Arc<dyn Presenter>,
    sink: Arc<dyn DeliverySink>,
}

impl UiLoop {
    pub fn new(
        rx: mpsc::UnboundedReceiver<UiCommand>,
        presenter: Arc<dyn Presenter>,
        sink: Arc<dyn DeliverySink>,
    ) -> Self {
        Self {
            rx,
            presenter,
            sink,
        }
    }

    /// Run the loop, consuming commands until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!("UI loop started");

        while let Some(command) = self.rx.recv().await {
            tracing::trace!("UI command: {}", command.name());
            match command {
                UiCommand::ShowAnimation { outcome, kind } => {
                    self.presenter.show_animation(&outcome, kind);
                }
                UiCommand::ShowPrintingProgress => self.presenter.show_printing_progress(),
                UiCommand::HidePrintingProgress => self.presenter.hide_printing_progress(),
                UiCommand::ShowPrintingError(message) => {
                    self.presenter.show_printing_error(&message);
                }
                UiCommand::ShowPrintingSuccess => self.presenter.show_printing_success(),
                UiCommand::Deliver(outcome) => {
                    tracing::info!("Delivering outcome {}", outcome.id);
                    metrics::DELIVERIES
                        .with_label_values(&[outcome.kind.as_str()])
                        .inc();
                    self.sink.deliver(outcome);
                }
                UiCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }

        tracing::info!("UI loop shutting down");
    }
}

/// Create a UI dispatcher
///
/// Returns:
/// - `UiHandle` - for posting work (clone this to share across tasks)
/// - `UiLoop` - spawn this as a background task with `tokio::spawn(ui_loop.run())`
pub fn create_ui_dispatcher(
    presenter: Arc<dyn Presenter>,
    sink: Arc<dyn DeliverySink>,
) -> (UiHandle, UiLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = UiHandle::new(tx);
    let ui_loop = UiLoop::new(rx, presenter, sink);
    (handle, ui_loop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{OutcomeKind, PrintRequirements, TransactionOutcome};
    use crate::testing::{PresenterCall, RecordingPresenter, RecordingSink};

    #[tokio::test]
    async fn test_loop_runs_commands_in_order() {
        let presenter = Arc::new(RecordingPresenter::new());
        let sink = Arc::new(RecordingSink::new());
        let (handle, ui_loop) = create_ui_dispatcher(presenter.clone(), sink.clone());
        let loop_task = tokio::spawn(ui_loop.run());

        let outcome = TransactionOutcome::approved("TXN1", PrintRequirements::both());
        handle.show_animation(&outcome, OutcomeKind::Transaction);
        handle.show_printing_progress();
        handle.show_printing_error("out of paper");
        handle.deliver(outcome.clone()).unwrap();
        handle.flush().await.unwrap();

        assert_eq!(
            presenter.calls(),
            vec![
                PresenterCall::Animation {
                    outcome_id: "TXN1".to_string(),
                    kind: OutcomeKind::Transaction
                },
                PresenterCall::PrintingProgress,
                PresenterCall::PrintingError("out of paper".to_string()),
            ]
        );
        assert_eq!(sink.delivered_ids(), vec!["TXN1".to_string()]);

        drop(handle);
        loop_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_stops_when_handles_dropped() {
        let (handle, ui_loop) = create_ui_dispatcher(
            Arc::new(RecordingPresenter::new()),
            Arc::new(RecordingSink::new()),
        );
        let loop_task = tokio::spawn(ui_loop.run());
        let clone = handle.clone();
        drop(handle);
        drop(clone);

        loop_task.await.unwrap();
    }
}
