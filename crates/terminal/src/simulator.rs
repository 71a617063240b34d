//! Console collaborators for running the terminal without hardware.
//!
//! The printer and the operator are simulated from the `[simulator]` config
//! section. Presentation goes to the log, deliveries go to stdout as JSON.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use postpay_core::{
    DecisionProvider, DeliverySink, OutcomeKind, PrintDecision, PrintScope, Presenter, Printer,
    PrinterError, RecoveryChoice, SimulatorConfig, TransactionOutcome,
};

use crate::metrics;

/// Printer that takes a fixed time per job and fails the first N jobs.
pub struct SimulatedPrinter {
    print_duration: Duration,
    failures_left: AtomicU32,
}

impl SimulatedPrinter {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            print_duration: Duration::from_millis(config.print_duration_ms),
            failures_left: AtomicU32::new(config.fail_first_attempts),
        }
    }
}

#[async_trait]
impl Printer for SimulatedPrinter {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn print(
        &self,
        scope: PrintScope,
        outcome: &TransactionOutcome,
    ) -> Result<(), PrinterError> {
        tokio::time::sleep(self.print_duration).await;

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(PrinterError::OutOfPaper);
        }

        if scope.includes_customer() {
            info!("[printer] customer copy for {}", outcome.id);
        }
        if scope.includes_merchant() {
            info!("[printer] merchant copy for {}", outcome.id);
        }
        Ok(())
    }
}

/// Operator that always gives the configured answers.
pub struct ScriptedOperator {
    decision: PrintDecision,
    recovery: RecoveryChoice,
}

impl ScriptedOperator {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            decision: config.auto_decision,
            recovery: config.auto_recovery,
        }
    }
}

#[async_trait]
impl DecisionProvider for ScriptedOperator {
    async fn request_decision(&self, outcome: &TransactionOutcome) -> PrintDecision {
        info!("[operator] print prompt for {}: {:?}", outcome.id, self.decision);
        self.decision
    }

    async fn request_recovery(
        &self,
        outcome: &TransactionOutcome,
        error: &PrinterError,
    ) -> RecoveryChoice {
        info!(
            "[operator] print error for {} ({}): {:?}",
            outcome.id, error, self.recovery
        );
        self.recovery
    }
}

/// Presenter that logs what a screen would show.
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn show_animation(&self, outcome: &TransactionOutcome, kind: OutcomeKind) {
        let label = match kind {
            OutcomeKind::Transaction => "APPROVED",
            OutcomeKind::Reconciliation => "BATCH CLOSED",
        };
        info!("[screen] {} {}", label, outcome.id);
    }

    fn show_printing_progress(&self) {
        info!("[screen] printing...");
    }

    fn show_printing_error(&self, message: &str) {
        info!("[screen] print error: {}", message);
    }

    fn show_printing_success(&self) {
        info!("[screen] receipt printed");
    }
}

/// Writes each delivered outcome to stdout as one JSON line.
pub struct JsonLinesSink {
    delivered_tx: mpsc::UnboundedSender<String>,
}

impl JsonLinesSink {
    /// Create the sink and a receiver yielding the id of each delivered outcome.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (delivered_tx, delivered_rx) = mpsc::unbounded_channel();
        (Self { delivered_tx }, delivered_rx)
    }

    fn write(&self, outcome: &TransactionOutcome) -> std::io::Result<()> {
        let line = serde_json::to_string(outcome)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()
    }
}

impl DeliverySink for JsonLinesSink {
    fn deliver(&self, outcome: TransactionOutcome) {
        if let Err(e) = self.write(&outcome) {
            warn!("Failed to write outcome {}: {}", outcome.id, e);
        }
        metrics::OUTCOMES_WRITTEN
            .with_label_values(&[if outcome.is_success() {
                "approved"
            } else {
                "failed"
            }])
            .inc();
        let _ = self.delivered_tx.send(outcome.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postpay_core::PrintRequirements;

    fn outcome() -> TransactionOutcome {
        TransactionOutcome::approved("TXN1", PrintRequirements::both())
    }

    #[tokio::test(start_paused = true)]
    async fn test_printer_fails_first_attempts() {
        let printer = SimulatedPrinter::new(&SimulatorConfig {
            print_duration_ms: 200,
            fail_first_attempts: 2,
            ..Default::default()
        });

        let started = tokio::time::Instant::now();
        assert_eq!(
            printer.print(PrintScope::All, &outcome()).await,
            Err(PrinterError::OutOfPaper)
        );
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(printer.print(PrintScope::All, &outcome()).await.is_err());
        assert!(printer.print(PrintScope::All, &outcome()).await.is_ok());
        assert!(printer.print(PrintScope::All, &outcome()).await.is_ok());
    }

    #[tokio::test]
    async fn test_operator_gives_configured_answers() {
        let operator = ScriptedOperator::new(&SimulatorConfig {
            auto_decision: PrintDecision::Skip,
            auto_recovery: RecoveryChoice::Cancel,
            ..Default::default()
        });

        assert_eq!(
            operator.request_decision(&outcome()).await,
            PrintDecision::Skip
        );
        assert_eq!(
            operator
                .request_recovery(&outcome(), &PrinterError::OutOfPaper)
                .await,
            RecoveryChoice::Cancel
        );
    }

    #[tokio::test]
    async fn test_sink_reports_delivered_ids() {
        let (sink, mut delivered) = JsonLinesSink::new();
        sink.deliver(TransactionOutcome::failed("TXN2", 5, "DECLINED"));

        assert_eq!(delivered.recv().await.as_deref(), Some("TXN2"));
    }
}
