//! Result orchestrator implementation.
//!
//! Admits one approved outcome at a time, runs the animation and printing
//! stages concurrently, and delivers the outcome once both have finished:
//! - Admission: synchronous, under the session lock, from any thread
//! - Stages: one task each, reporting a `StageEvent` when done
//! - Join and delivery: the event loop, under the session lock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::animation::{AnimationConfig, AnimationStage};
use crate::metrics;
use crate::outcome::TransactionOutcome;
use crate::printing::PrintingStage;
use crate::ui::UiHandle;

use super::config::OrchestratorConfig;
use super::session::{JoinStatus, ProcessingSession};
use super::types::{
    Admission, OrchestratorCounters, OrchestratorError, OrchestratorPhase, OrchestratorStatus,
    SessionId, StageCompletion, StageEvent,
};

/// The session in flight plus the tasks driving its stages.
struct ActiveSession {
    session: ProcessingSession,
    tasks: Vec<JoinHandle<()>>,
}

#[derive(Default)]
struct SessionState {
    active: Option<ActiveSession>,
    phase: OrchestratorPhase,
    counters: OrchestratorCounters,
    events_tx: Option<mpsc::Sender<StageEvent>>,
    event_loop: Option<JoinHandle<()>>,
    // Runtime captured at start; stage tasks are spawned here.
    runtime: Option<Handle>,
}

/// Finalizes host outcomes: animation, receipts, then exactly one delivery.
///
/// Cheap to clone; every clone drives the same session.
#[derive(Clone)]
pub struct ResultOrchestrator {
    config: OrchestratorConfig,
    animation_config: AnimationConfig,
    animation: AnimationStage,
    printing: PrintingStage,
    ui: UiHandle,

    // Runtime state
    state: Arc<Mutex<SessionState>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ResultOrchestrator {
    /// Create a new orchestrator. Nothing is admitted until [`start`](Self::start).
    pub fn new(
        config: OrchestratorConfig,
        animation_config: AnimationConfig,
        animation: AnimationStage,
        printing: PrintingStage,
        ui: UiHandle,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            animation_config,
            animation,
            printing,
            ui,
            state: Arc::new(Mutex::new(SessionState::default())),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start the orchestrator (spawns the event loop).
    ///
    /// Must be called from within a tokio runtime. Stage tasks for every
    /// session run on that runtime, whichever thread admits the outcome.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!("Starting result orchestrator");

        let runtime = Handle::current();
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer.max(1));
        let event_loop = self.spawn_event_loop(&runtime, events_rx);

        let mut state = self.lock();
        state.events_tx = Some(events_tx);
        state.event_loop = Some(event_loop);
        state.runtime = Some(runtime);
    }

    /// Stop the orchestrator.
    ///
    /// A session still in flight is discarded without delivery.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping result orchestrator");

        let (active, event_loop) = {
            let mut state = self.lock();
            state.events_tx = None;
            state.runtime = None;
            state.phase = OrchestratorPhase::Idle;
            (state.active.take(), state.event_loop.take())
        };

        // Signal shutdown to the event loop
        let _ = self.shutdown_tx.send(());

        if let Some(active) = active {
            info!(
                "Discarding session {} for {} without delivery",
                active.session.id, active.session.outcome.id
            );
            self.animation.reset();
            self.printing.cancel();
            for task in &active.tasks {
                task.abort();
            }
            join_all(active.tasks).await;
        }

        if let Some(event_loop) = event_loop {
            let _ = event_loop.await;
        }

        info!("Result orchestrator stopped");
    }

    /// Offer a host outcome for finalization.
    ///
    /// Failure outcomes skip animation and printing and are delivered right
    /// away, even while another session is in flight. An approved outcome
    /// opens a session unless one is already active.
    ///
    /// Safe to call from any thread, inside a runtime or not.
    pub fn admit(&self, outcome: TransactionOutcome) -> Result<Admission, OrchestratorError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(OrchestratorError::NotRunning);
        }

        if !outcome.is_success() {
            info!(
                "Outcome {} failed with status {}, delivering immediately",
                outcome.id, outcome.status_code
            );
            self.ui.deliver(outcome)?;
            self.lock().counters.failures_delivered += 1;
            metrics::ADMISSIONS
                .with_label_values(&["failure_bypass"])
                .inc();
            return Ok(Admission::DeliveredImmediately);
        }

        let mut state = self.lock();

        let (Some(events_tx), Some(runtime)) = (state.events_tx.clone(), state.runtime.clone())
        else {
            return Err(OrchestratorError::NotRunning);
        };

        if let Some(active) = &state.active {
            warn!(
                "Outcome {} rejected: session {} for {} still in progress",
                outcome.id, active.session.id, active.session.outcome.id
            );
            let err = OrchestratorError::AlreadyInProgress {
                active: active.session.outcome.id.clone(),
                rejected: outcome.id,
            };
            state.counters.rejected += 1;
            metrics::ADMISSIONS.with_label_values(&["rejected"]).inc();
            return Err(err);
        }

        let session = ProcessingSession::new(outcome.clone());
        let session_id = session.id;
        let tasks = self.spawn_stages(&runtime, session_id, &outcome, events_tx);
        state.phase = OrchestratorPhase::Admitted;
        info!("Admitted {} as session {}", outcome.id, session_id);

        state.active = Some(ActiveSession { session, tasks });
        state.phase = OrchestratorPhase::Running;
        state.counters.admitted += 1;
        metrics::ADMISSIONS.with_label_values(&["started"]).inc();

        Ok(Admission::Started(session_id))
    }

    /// Fire-and-forget entry point for the host integration.
    ///
    /// Callable from the host's own threads. Rejections are logged and the
    /// outcome dropped.
    pub fn on_host_outcome(&self, outcome: TransactionOutcome) {
        let id = outcome.id.clone();
        match self.admit(outcome) {
            Ok(Admission::Started(session)) => {
                debug!("Host outcome {} started session {}", id, session);
            }
            Ok(Admission::DeliveredImmediately) => {
                debug!("Host outcome {} delivered immediately", id);
            }
            // Already logged by admit
            Err(OrchestratorError::AlreadyInProgress { .. }) => {}
            Err(e) => {
                warn!("Dropping host outcome {}: {}", id, e);
            }
        }
    }

    /// Fast-forward the session in flight.
    ///
    /// The animation completes at once and printing is cancelled: declined if
    /// it has not started printing, no retry offered if it has. The outcome
    /// is still delivered exactly once. Returns `false` if nothing was active.
    pub fn cancel(&self) -> bool {
        // Held so the stages cannot move on to another session meanwhile.
        let state = self.lock();

        let Some(active) = &state.active else {
            debug!("Nothing to cancel");
            return false;
        };

        info!(
            "Cancelling session {} for {}",
            active.session.id, active.session.outcome.id
        );
        self.animation.force_complete();
        self.printing.cancel();
        true
    }

    /// Get current orchestrator status.
    pub fn status(&self) -> OrchestratorStatus {
        let state = self.lock();
        let session = state.active.as_ref().map(|a| &a.session);

        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            phase: state.phase,
            session: session.map(|s| s.id),
            outcome_id: session.map(|s| s.outcome.id.clone()),
            animation_done: session.is_some_and(|s| s.animation_done),
            printing_done: session.is_some_and(|s| s.printing_done),
            printing_state: self.printing.state(),
            counters: state.counters,
        }
    }

    /// Start both stages for a new session on `runtime`.
    ///
    /// Called with the session lock held; nothing here awaits or panics off
    /// the runtime.
    fn spawn_stages(
        &self,
        runtime: &Handle,
        session_id: SessionId,
        outcome: &TransactionOutcome,
        events_tx: mpsc::Sender<StageEvent>,
    ) -> Vec<JoinHandle<()>> {
        self.ui.show_animation(outcome, outcome.kind);
        let ticket = self
            .animation
            .start_on(runtime, self.animation_config.duration_for(outcome.kind));

        // Claim the printing stage now so a cancel arriving before the task
        // is polled still reaches this run.
        let printing = self.printing.begin(outcome.clone());

        let animation_task = {
            let events_tx = events_tx.clone();
            runtime.spawn(async move {
                let end = ticket.wait().await;
                let event = StageEvent {
                    session: session_id,
                    completion: StageCompletion::Animation(end),
                };
                if events_tx.send(event).await.is_err() {
                    debug!("Event loop gone, dropping animation completion");
                }
            })
        };

        let printing_task = runtime.spawn(async move {
            let result = match printing {
                Ok(run) => run.run().await,
                Err(e) => Err(e),
            };
            let event = StageEvent {
                session: session_id,
                completion: StageCompletion::Printing(result),
            };
            if events_tx.send(event).await.is_err() {
                debug!("Event loop gone, dropping printing completion");
            }
        });

        vec![animation_task, printing_task]
    }

    /// Spawn the loop that joins stage completions.
    fn spawn_event_loop(
        &self,
        runtime: &Handle,
        mut events_rx: mpsc::Receiver<StageEvent>,
    ) -> JoinHandle<()> {
        let this = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        runtime.spawn(async move {
            info!("Stage event loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Stage event loop received shutdown signal");
                        break;
                    }
                    event = events_rx.recv() => {
                        match event {
                            Some(event) => this.apply(event),
                            None => break,
                        }
                    }
                }
            }
            info!("Stage event loop stopped");
        })
    }

    /// Record a stage completion and deliver once both stages are done.
    fn apply(&self, event: StageEvent) {
        let StageEvent {
            session: session_id,
            completion,
        } = event;

        match &completion {
            StageCompletion::Animation(end) => {
                debug!("Animation for session {} ended: {:?}", session_id, end);
            }
            StageCompletion::Printing(Ok(resolution)) => {
                debug!(
                    "Printing for session {} resolved: {}",
                    session_id,
                    resolution.as_str()
                );
            }
            StageCompletion::Printing(Err(e)) => {
                warn!(
                    "Printing for session {} rejected ({}), treating as done",
                    session_id, e
                );
            }
        }

        let mut state = self.lock();

        let Some(active) = state.active.as_mut() else {
            debug!(
                "Ignoring {} completion for session {}: no session active",
                completion.stage(),
                session_id
            );
            return;
        };
        if active.session.id != session_id {
            debug!(
                "Ignoring stale {} completion for session {}",
                completion.stage(),
                session_id
            );
            return;
        }

        match active.session.record(&completion) {
            JoinStatus::Waiting => {}
            JoinStatus::Duplicate => {
                warn!(
                    "Duplicate {} completion for session {}",
                    completion.stage(),
                    session_id
                );
            }
            JoinStatus::Ready => {
                state.phase = OrchestratorPhase::Joined;
                let Some(done) = state.active.take() else {
                    return;
                };
                let session = done.session;
                let kind = session.outcome.kind;
                let elapsed = session.elapsed();

                match self.ui.deliver(session.outcome) {
                    Ok(()) => {
                        info!(
                            "Session {} finalized after {:?}, delivery enqueued",
                            session_id, elapsed
                        );
                        state.phase = OrchestratorPhase::Delivered;
                        state.counters.delivered += 1;
                        metrics::SESSION_DURATION
                            .with_label_values(&[kind.as_str()])
                            .observe(elapsed.as_secs_f64());
                    }
                    Err(e) => {
                        error!("Session {} could not be delivered: {}", session_id, e);
                        state.phase = OrchestratorPhase::Idle;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::outcome::{PrintDecision, PrintRequirements};
    use crate::printing::{PrintingConfig, PrintingState};
    use crate::testing::{fixtures, MockDecisionProvider, MockPrinter, TestUi};

    struct Harness {
        printer: Arc<MockPrinter>,
        decisions: Arc<MockDecisionProvider>,
        ui: TestUi,
        orchestrator: ResultOrchestrator,
    }

    fn harness() -> Harness {
        let printer = Arc::new(MockPrinter::new());
        let decisions = Arc::new(MockDecisionProvider::new());
        let ui = TestUi::start();
        let printing = PrintingStage::new(
            PrintingConfig::default(),
            printer.clone(),
            decisions.clone(),
            ui.handle(),
        );
        let orchestrator = ResultOrchestrator::new(
            OrchestratorConfig::default(),
            AnimationConfig::default(),
            AnimationStage::new(),
            printing,
            ui.handle(),
        );
        orchestrator.start();

        Harness {
            printer,
            decisions,
            ui,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_admit_before_start_is_rejected() {
        let ui = TestUi::start();
        let printing = PrintingStage::new(
            PrintingConfig::default(),
            Arc::new(MockPrinter::new()),
            Arc::new(MockDecisionProvider::new()),
            ui.handle(),
        );
        let orchestrator = ResultOrchestrator::new(
            OrchestratorConfig::default(),
            AnimationConfig::default(),
            AnimationStage::new(),
            printing,
            ui.handle(),
        );

        let err = orchestrator
            .admit(fixtures::customer_receipt("TXN1"))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NotRunning));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_tracks_session() {
        let h = harness();
        h.decisions.push_decision(PrintDecision::Skip);

        let status = h.orchestrator.status();
        assert!(status.running);
        assert_eq!(status.phase, OrchestratorPhase::Idle);

        let Admission::Started(id) = h
            .orchestrator
            .admit(fixtures::customer_receipt("TXN1"))
            .unwrap()
        else {
            panic!("expected a session");
        };

        let status = h.orchestrator.status();
        assert_eq!(status.session, Some(id));
        assert_eq!(status.outcome_id.as_deref(), Some("TXN1"));
        assert_eq!(status.phase, OrchestratorPhase::Running);
        assert_eq!(status.counters.admitted, 1);

        assert!(h.ui.sink.wait_for_deliveries(1, Duration::from_secs(5)).await);
        let status = h.orchestrator.status();
        assert!(status.session.is_none());
        assert_eq!(status.phase, OrchestratorPhase::Delivered);
        assert_eq!(status.counters.delivered, 1);
        assert_eq!(
            status.printing_state,
            PrintingState::Done(crate::printing::PrintingResolution::Declined)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_fast_forwards_to_delivery() {
        let h = harness();
        h.decisions.hold_decisions();

        h.orchestrator
            .admit(fixtures::customer_receipt("TXN1"))
            .unwrap();
        let mut printing = h.orchestrator.printing.subscribe();
        printing
            .wait_for(|s| *s == PrintingState::AwaitingConfirmation)
            .await
            .unwrap();

        assert!(h.orchestrator.cancel());
        assert!(h.ui.sink.wait_for_deliveries(1, Duration::from_secs(5)).await);

        assert_eq!(h.ui.sink.delivered_ids(), vec!["TXN1"]);
        assert_eq!(h.printer.print_count(), 0);
        assert!(!h.orchestrator.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_session() {
        let h = harness();
        h.decisions.hold_decisions();

        h.orchestrator
            .admit(fixtures::customer_receipt("TXN1"))
            .unwrap();
        h.orchestrator.shutdown().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        h.ui.flush().await;
        assert!(h.ui.sink.delivered_ids().is_empty());

        let status = h.orchestrator.status();
        assert!(!status.running);
        assert!(status.session.is_none());
        assert_eq!(h.orchestrator.printing.state(), PrintingState::Idle);
        assert!(matches!(
            h.orchestrator.admit(fixtures::customer_receipt("TXN2")),
            Err(OrchestratorError::NotRunning)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_shutdown() {
        let h = harness();
        h.orchestrator.shutdown().await;
        h.orchestrator.start();

        let outcome = TransactionOutcome::approved("TXN3", PrintRequirements::none());
        h.orchestrator.admit(outcome).unwrap();
        assert!(h.ui.sink.wait_for_deliveries(1, Duration::from_secs(5)).await);
        assert_eq!(h.ui.sink.delivered_ids(), vec!["TXN3"]);
    }
}
