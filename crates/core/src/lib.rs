pub mod animation;
pub mod collaborators;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod outcome;
pub mod printing;
pub mod testing;
pub mod ui;

pub use animation::{AnimationConfig, AnimationEnd, AnimationHandle, AnimationStage};
pub use collaborators::{DecisionProvider, DeliverySink, Presenter, Printer, PrinterError};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SimulatorConfig,
};
pub use orchestrator::{
    Admission, OrchestratorConfig, OrchestratorError, OrchestratorPhase, OrchestratorStatus,
    ResultOrchestrator, SessionId,
};
pub use outcome::{
    OutcomeKind, PrintDecision, PrintRequirements, PrintScope, RecoveryChoice,
    TransactionOutcome,
};
pub use printing::{PrintingConfig, PrintingResolution, PrintingStage, PrintingState};
pub use ui::{create_ui_dispatcher, UiHandle, UiLoop};
