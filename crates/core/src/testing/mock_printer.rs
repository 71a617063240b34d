//! Mock printer for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::collaborators::{Printer, PrinterError};
use crate::outcome::{PrintScope, TransactionOutcome};

/// A recorded print operation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPrint {
    /// Outcome the receipts were printed for.
    pub outcome_id: String,
    /// Receipts covered by the operation.
    pub scope: PrintScope,
    /// Whether the operation succeeded.
    pub success: bool,
}

#[derive(Debug)]
enum ScriptedFailure {
    Error(PrinterError),
    Panic,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock implementation of the Printer trait.
///
/// Provides controllable behavior for testing:
/// - Track print operations for assertions
/// - Script failures (errors or panics) for upcoming operations
/// - Simulate print duration
///
/// # Example
///
/// ```rust,ignore
/// use postpay_core::testing::MockPrinter;
///
/// let printer = MockPrinter::new();
/// printer.fail_next(PrinterError::OutOfPaper);
///
/// // First print fails, second succeeds
/// let prints = printer.recorded_prints();
/// assert!(!prints[0].success);
/// ```
#[derive(Debug, Default)]
pub struct MockPrinter {
    /// Recorded print operations.
    prints: Mutex<Vec<RecordedPrint>>,
    /// Failures consumed one per operation, in order.
    failures: Mutex<VecDeque<ScriptedFailure>>,
    /// Simulated print duration.
    print_duration: Mutex<Duration>,
}

impl MockPrinter {
    /// Create a new mock printer that prints instantly and never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded print operations.
    pub fn recorded_prints(&self) -> Vec<RecordedPrint> {
        lock(&self.prints).clone()
    }

    /// Get the number of print operations performed, failed ones included.
    pub fn print_count(&self) -> usize {
        lock(&self.prints).len()
    }

    /// Get the number of successful print operations.
    pub fn successful_prints(&self) -> usize {
        lock(&self.prints).iter().filter(|p| p.success).count()
    }

    /// Make the next unscripted operation fail with `error`.
    pub fn fail_next(&self, error: PrinterError) {
        lock(&self.failures).push_back(ScriptedFailure::Error(error));
    }

    /// Make the next unscripted operation panic.
    pub fn panic_next(&self) {
        lock(&self.failures).push_back(ScriptedFailure::Panic);
    }

    /// Set the simulated print duration.
    pub fn set_print_duration(&self, duration: Duration) {
        *lock(&self.print_duration) = duration;
    }

    fn record(&self, outcome: &TransactionOutcome, scope: PrintScope, success: bool) {
        lock(&self.prints).push(RecordedPrint {
            outcome_id: outcome.id.clone(),
            scope,
            success,
        });
    }
}

#[async_trait]
impl Printer for MockPrinter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn print(
        &self,
        scope: PrintScope,
        outcome: &TransactionOutcome,
    ) -> Result<(), PrinterError> {
        let duration = *lock(&self.print_duration);
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }

        let failure = lock(&self.failures).pop_front();
        match failure {
            None => {
                self.record(outcome, scope, true);
                Ok(())
            }
            Some(ScriptedFailure::Error(error)) => {
                self.record(outcome, scope, false);
                Err(error)
            }
            Some(ScriptedFailure::Panic) => {
                self.record(outcome, scope, false);
                panic!("mock printer panicked while printing {}", outcome.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::PrintRequirements;

    #[tokio::test]
    async fn test_scripted_failures_in_order() {
        let printer = MockPrinter::new();
        printer.fail_next(PrinterError::OutOfPaper);
        let outcome = TransactionOutcome::approved("TXN1", PrintRequirements::both());

        let first = printer.print(PrintScope::All, &outcome).await;
        let second = printer.print(PrintScope::All, &outcome).await;

        assert_eq!(first, Err(PrinterError::OutOfPaper));
        assert!(second.is_ok());
        assert_eq!(printer.print_count(), 2);
        assert_eq!(printer.successful_prints(), 1);
        assert_eq!(printer.recorded_prints()[0].outcome_id, "TXN1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_print_duration() {
        let printer = MockPrinter::new();
        printer.set_print_duration(Duration::from_millis(300));
        let outcome = TransactionOutcome::approved("TXN1", PrintRequirements::both());

        let started = tokio::time::Instant::now();
        printer.print(PrintScope::All, &outcome).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
