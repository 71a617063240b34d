//! Printing stage implementation.

use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

use crate::collaborators::{DecisionProvider, Printer, PrinterError};
use crate::metrics;
use crate::outcome::{PrintScope, RecoveryChoice, TransactionOutcome};
use crate::ui::UiHandle;

use super::config::PrintingConfig;
use super::types::{PrintingError, PrintingResolution, PrintingState};

/// Runs the receipt workflow for one outcome at a time:
/// required check, operator confirmation, print, and retry on failure.
///
/// The stage never blocks anything but itself. An unanswered prompt keeps
/// this stage waiting and nothing else.
#[derive(Clone)]
pub struct PrintingStage {
    config: PrintingConfig,
    printer: Arc<dyn Printer>,
    decisions: Arc<dyn DecisionProvider>,
    ui: UiHandle,
    /// One permit: at most one print operation in flight.
    print_guard: Arc<Semaphore>,
    state: Arc<watch::Sender<PrintingState>>,
    cancel: Arc<watch::Sender<bool>>,
}

impl PrintingStage {
    /// Creates a new printing stage with its own printer guard.
    pub fn new(
        config: PrintingConfig,
        printer: Arc<dyn Printer>,
        decisions: Arc<dyn DecisionProvider>,
        ui: UiHandle,
    ) -> Self {
        let (state, _) = watch::channel(PrintingState::Idle);
        let (cancel, _) = watch::channel(false);

        Self {
            config,
            printer,
            decisions,
            ui,
            print_guard: Arc::new(Semaphore::new(1)),
            state: Arc::new(state),
            cancel: Arc::new(cancel),
        }
    }

    /// Share the printer guard with other stages driving the same printer.
    pub fn with_print_guard(mut self, guard: Arc<Semaphore>) -> Self {
        self.print_guard = guard;
        self
    }

    /// Current workflow state.
    pub fn state(&self) -> PrintingState {
        self.state.borrow().clone()
    }

    /// Watch workflow state changes.
    pub fn subscribe(&self) -> watch::Receiver<PrintingState> {
        self.state.subscribe()
    }

    /// Claim the stage for `outcome`.
    ///
    /// Fails if a workflow is already running. The returned run does nothing
    /// until awaited, but cancellation requested in between is honoured.
    pub fn begin(&self, outcome: TransactionOutcome) -> Result<PrintingRun, PrintingError> {
        let mut rejected = None;
        self.state.send_if_modified(|state| {
            if state.is_active() {
                rejected = Some(state.name());
                false
            } else {
                *state = PrintingState::Checking;
                self.cancel.send_replace(false);
                true
            }
        });

        if let Some(state) = rejected {
            warn!(
                "Printing workflow already {}, rejecting request for {}",
                state, outcome.id
            );
            return Err(PrintingError::AlreadyActive { state });
        }

        Ok(PrintingRun {
            stage: self.clone(),
            outcome,
            finished: false,
        })
    }

    /// Run the whole workflow for `outcome`.
    pub async fn run(
        &self,
        outcome: TransactionOutcome,
    ) -> Result<PrintingResolution, PrintingError> {
        self.begin(outcome)?.run().await
    }

    /// Cancel the running workflow.
    ///
    /// Before printing starts the workflow ends as declined. While a print
    /// operation is in flight it runs to completion, but no retry is offered
    /// afterwards. Returns `false` if no workflow was running.
    pub fn cancel(&self) -> bool {
        let active = self.state.borrow().is_active();
        if active {
            debug!("Cancelling printing workflow");
            self.cancel.send_replace(true);
        }
        active
    }

    fn set_state(&self, state: PrintingState) {
        debug!("Printing state -> {}", state.name());
        self.state.send_replace(state);
    }
}

/// A claimed printing workflow. See [`PrintingStage::begin`].
pub struct PrintingRun {
    stage: PrintingStage,
    outcome: TransactionOutcome,
    finished: bool,
}

impl PrintingRun {
    /// Drive the workflow to its resolution.
    pub async fn run(mut self) -> Result<PrintingResolution, PrintingError> {
        let result = self.execute().await;
        self.finished = true;

        match &result {
            Ok(resolution) => {
                info!(
                    "Printing for {} finished: {}",
                    self.outcome.id,
                    resolution.as_str()
                );
                metrics::PRINTING_RESOLUTIONS
                    .with_label_values(&[resolution.as_str()])
                    .inc();
                self.stage
                    .set_state(PrintingState::Done(resolution.clone()));
            }
            Err(e) => {
                warn!("Printing for {} rejected: {}", self.outcome.id, e);
                self.stage.set_state(PrintingState::Idle);
            }
        }

        result
    }

    async fn execute(&self) -> Result<PrintingResolution, PrintingError> {
        let outcome = &self.outcome;

        if !outcome.requires_printing() {
            debug!("No receipt required for {}", outcome.id);
            return Ok(PrintingResolution::NotRequired);
        }

        let scope = if self.stage.config.confirm_before_printing {
            self.stage.set_state(PrintingState::AwaitingConfirmation);
            let decision = tokio::select! {
                decision = self.stage.decisions.request_decision(outcome) => decision,
                _ = self.cancelled() => {
                    info!("Printing for {} cancelled before confirmation", outcome.id);
                    return Ok(PrintingResolution::Declined);
                }
            };
            debug!("Operator decision for {}: {:?}", outcome.id, decision);

            match decision.scope() {
                Some(scope) => scope,
                None => {
                    info!("Operator skipped printing for {}", outcome.id);
                    return Ok(PrintingResolution::Declined);
                }
            }
        } else {
            match PrintScope::from_requirements(&outcome.print_requirements) {
                Some(scope) => scope,
                None => return Ok(PrintingResolution::NotRequired),
            }
        };

        if self.is_cancelled() {
            info!("Printing for {} cancelled before printing", outcome.id);
            return Ok(PrintingResolution::Declined);
        }

        let max_attempts = self.stage.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;

            let error = match self.print_once(scope, attempt).await? {
                Ok(()) => {
                    self.stage.ui.show_printing_success();
                    return Ok(PrintingResolution::Printed {
                        scope,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            warn!(
                "Print attempt {} for {} failed: {}",
                attempt, outcome.id, error
            );
            self.stage.ui.show_printing_error(error.to_string());
            self.stage.set_state(PrintingState::Error {
                attempt,
                message: error.to_string(),
            });

            if self.is_cancelled() {
                return Ok(PrintingResolution::Abandoned {
                    attempts: attempt,
                    last_error: error,
                });
            }

            if !error.is_retryable() || attempt >= max_attempts {
                return Ok(PrintingResolution::Failed {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let choice = tokio::select! {
                choice = self.stage.decisions.request_recovery(outcome, &error) => choice,
                _ = self.cancelled() => RecoveryChoice::Cancel,
            };

            match choice {
                RecoveryChoice::Retry => {
                    info!("Retrying print for {}", outcome.id);
                }
                RecoveryChoice::Cancel => {
                    info!("Operator gave up printing for {}", outcome.id);
                    return Ok(PrintingResolution::Abandoned {
                        attempts: attempt,
                        last_error: error,
                    });
                }
            }
        }
    }

    /// One print operation on its own task, holding the printer guard.
    async fn print_once(
        &self,
        scope: PrintScope,
        attempt: u32,
    ) -> Result<Result<(), PrinterError>, PrintingError> {
        let Ok(permit) = Arc::clone(&self.stage.print_guard).try_acquire_owned() else {
            warn!(
                "Print operation already in flight, rejecting print for {}",
                self.outcome.id
            );
            metrics::PRINT_ATTEMPTS.with_label_values(&["busy"]).inc();
            return Err(PrintingError::PrinterBusy);
        };

        self.stage
            .set_state(PrintingState::Printing { scope, attempt });
        self.stage.ui.show_printing_progress();
        info!(
            "Printing {:?} for {} on {} (attempt {})",
            scope,
            self.outcome.id,
            self.stage.printer.name(),
            attempt
        );

        let printer = Arc::clone(&self.stage.printer);
        let outcome = self.outcome.clone();
        // The permit moves into the task so the guard covers the operation
        // even if this workflow is dropped mid-print.
        let task = tokio::spawn(async move {
            let _permit = permit;
            printer.print(scope, &outcome).await
        });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(PrinterError::Aborted {
                reason: e.to_string(),
            }),
        };
        self.stage.ui.hide_printing_progress();

        let label = if result.is_ok() { "success" } else { "error" };
        metrics::PRINT_ATTEMPTS.with_label_values(&[label]).inc();

        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        *self.stage.cancel.borrow()
    }

    async fn cancelled(&self) {
        let mut rx = self.stage.cancel.subscribe();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for PrintingRun {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Printing run for {} dropped unfinished", self.outcome.id);
            self.stage.state.send_replace(PrintingState::Idle);
        }
    }
}
