mod metrics;
mod simulator;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postpay_core::{
    create_ui_dispatcher, load_config, load_config_from_env, validate_config, Admission,
    AnimationStage, Config, PrintingStage, ResultOrchestrator, TransactionOutcome,
};

use simulator::{ConsolePresenter, JsonLinesSink, ScriptedOperator, SimulatedPrinter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging. Stdout carries the delivered outcomes.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load(&config_path())?;

    // Collaborators
    let (sink, mut delivered_rx) = JsonLinesSink::new();
    let (ui, ui_loop) = create_ui_dispatcher(Arc::new(ConsolePresenter), Arc::new(sink));
    let ui_task = tokio::spawn(ui_loop.run());

    let printing = PrintingStage::new(
        config.printing.clone(),
        Arc::new(SimulatedPrinter::new(&config.simulator)),
        Arc::new(ScriptedOperator::new(&config.simulator)),
        ui.clone(),
    );
    let orchestrator = ResultOrchestrator::new(
        config.orchestrator.clone(),
        config.animation.clone(),
        AnimationStage::new(),
        printing,
        ui,
    );

    orchestrator.start();
    metrics::ORCHESTRATOR_RUNNING.set(1);
    info!("Reading outcomes from stdin, one JSON object per line");

    tokio::select! {
        result = process_input(&orchestrator, &mut delivered_rx) => {
            result?;
            info!("End of input");
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    orchestrator.shutdown().await;
    metrics::ORCHESTRATOR_RUNNING.set(0);

    // The orchestrator and its stages hold UI handles; the loop ends once they are gone.
    drop(orchestrator);
    let _ = ui_task.await;
    info!("UI loop stopped");

    debug!("Final metrics:\n{}", metrics::encode_metrics());
    Ok(())
}

fn config_path() -> PathBuf {
    std::env::var("POSTPAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("postpay.toml"))
}

/// Load configuration, falling back to defaults when the file does not exist.
fn load(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        info!("Loading configuration from {:?}", path);
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
    } else {
        info!("No configuration at {:?}, using defaults", path);
        load_config_from_env().context("Failed to load config from environment")?
    };

    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Animation: {} ms (transaction), {} ms (reconciliation)",
        config.animation.transaction_duration_ms, config.animation.reconciliation_duration_ms
    );
    info!(
        "Printing: confirm = {}, max attempts = {}",
        config.printing.confirm_before_printing, config.printing.max_attempts
    );
    Ok(config)
}

/// Submit each input line and wait for its delivery before reading the next.
async fn process_input(
    orchestrator: &ResultOrchestrator,
    delivered_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let outcome: TransactionOutcome = match serde_json::from_str(line) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Skipping invalid input line: {}", e);
                metrics::INPUT_LINES.with_label_values(&["invalid"]).inc();
                continue;
            }
        };

        let id = outcome.id.clone();
        match orchestrator.admit(outcome) {
            Ok(Admission::Started(session)) => {
                debug!("Outcome {} in session {}", id, session);
            }
            Ok(Admission::DeliveredImmediately) => {}
            Err(e) => {
                warn!("Outcome {} not admitted: {}", id, e);
                metrics::INPUT_LINES.with_label_values(&["rejected"]).inc();
                continue;
            }
        }
        metrics::INPUT_LINES.with_label_values(&["submitted"]).inc();

        wait_for_delivery(delivered_rx, &id).await?;
    }

    Ok(())
}

async fn wait_for_delivery(
    delivered_rx: &mut mpsc::UnboundedReceiver<String>,
    id: &str,
) -> Result<()> {
    while let Some(delivered) = delivered_rx.recv().await {
        if delivered == id {
            return Ok(());
        }
    }
    anyhow::bail!("UI loop stopped before {} was delivered", id)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
