use tokio::sync::{mpsc, oneshot};

use crate::outcome::{OutcomeKind, TransactionOutcome};

/// Work that must run on the UI loop.
#[derive(Debug)]
pub enum UiCommand {
    ShowAnimation {
        outcome: TransactionOutcome,
        kind: OutcomeKind,
    },
    ShowPrintingProgress,
    HidePrintingProgress,
    ShowPrintingError(String),
    ShowPrintingSuccess,
    Deliver(TransactionOutcome),
    /// Acknowledged once every command posted before it has run.
    Flush(oneshot::Sender<()>),
}

impl UiCommand {
    /// Command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShowAnimation { .. } => "show_animation",
            Self::ShowPrintingProgress => "show_printing_progress",
            Self::HidePrintingProgress => "hide_printing_progress",
            Self::ShowPrintingError(_) => "show_printing_error",
            Self::ShowPrintingSuccess => "show_printing_success",
            Self::Deliver(_) => "deliver",
            Self::Flush(_) => "flush",
        }
    }
}

/// The UI loop is gone; nothing posted to it will run.
#[derive(Debug, thiserror::Error)]
#[error("UI loop is closed, dropped {command}")]
pub struct UiClosed {
    pub command: &'static str,
}

/// Handle for posting work to the UI loop.
///
/// This is cheaply cloneable and can be shared across tasks and threads.
/// Posting never blocks, so it is safe while holding a synchronous lock.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiCommand>,
}

impl UiHandle {
    /// Create a new UI handle from a channel sender
    pub fn new(tx: mpsc::UnboundedSender<UiCommand>) -> Self {
        Self { tx }
    }

    /// Post a command, failing if the loop has stopped.
    pub fn post(&self, command: UiCommand) -> Result<(), UiClosed> {
        let name = command.name();
        self.tx.send(command).map_err(|_| UiClosed { command: name })
    }

    /// Post a presentation-only command. Failures are logged, not returned.
    fn notify(&self, command: UiCommand) {
        if let Err(e) = self.post(command) {
            tracing::warn!("Failed to post UI notification: {}", e);
        }
    }

    pub fn show_animation(&self, outcome: &TransactionOutcome, kind: OutcomeKind) {
        self.notify(UiCommand::ShowAnimation {
            outcome: outcome.clone(),
            kind,
        });
    }

    pub fn show_printing_progress(&self) {
        self.notify(UiCommand::ShowPrintingProgress);
    }

    pub fn hide_printing_progress(&self) {
        self.notify(UiCommand::HidePrintingProgress);
    }

    pub fn show_printing_error(&self, message: impl Into<String>) {
        self.notify(UiCommand::ShowPrintingError(message.into()));
    }

    pub fn show_printing_success(&self) {
        self.notify(UiCommand::ShowPrintingSuccess);
    }

    /// Queue the outcome for the delivery sink.
    pub fn deliver(&self, outcome: TransactionOutcome) -> Result<(), UiClosed> {
        self.post(UiCommand::Deliver(outcome))
    }

    /// Wait until everything posted so far has run on the loop.
    pub async fn flush(&self) -> Result<(), UiClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.post(UiCommand::Flush(ack_tx))?;
        ack_rx.await.map_err(|_| UiClosed { command: "flush" })
    }

    /// Whether the loop has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::PrintRequirements;

    #[tokio::test]
    async fn test_post_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = UiHandle::new(tx);

        handle.show_printing_progress();
        handle
            .deliver(TransactionOutcome::approved("TXN1", PrintRequirements::none()))
            .unwrap();

        let first = rx.recv().await.expect("Should receive first command");
        let second = rx.recv().await.expect("Should receive second command");
        assert!(matches!(first, UiCommand::ShowPrintingProgress));
        assert!(matches!(second, UiCommand::Deliver(ref o) if o.id == "TXN1"));
    }

    #[tokio::test]
    async fn test_deliver_fails_when_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = UiHandle::new(tx);
        drop(rx);

        assert!(handle.is_closed());
        let err = handle
            .deliver(TransactionOutcome::failed("TXN2", 5, "declined"))
            .unwrap_err();
        assert_eq!(err.command, "deliver");
        assert_eq!(err.to_string(), "UI loop is closed, dropped deliver");
    }

    #[tokio::test]
    async fn test_notification_on_closed_loop_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = UiHandle::new(tx);
        drop(rx);

        handle.show_printing_error("paper jam");
        handle.show_printing_success();
    }
}
