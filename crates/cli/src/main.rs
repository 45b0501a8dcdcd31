mod args;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vodmigrator_core::{
    create_gateway, load_config, metrics, validate_config, Config, FsObjectStore, HttpWorker,
    IdempotencyGuard, OrchestratorError, RetryPolicy, SanitizedConfig, TransferOrchestrator,
    WorkerInvoker,
};

use args::Args;

const EXIT_FAILURE: u8 = 1;
/// Exit code for a run refused before the worker was invoked.
const EXIT_PRECONDITION: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    if std::env::var_os("VODMIGRATOR_LOG_JSON").is_some() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    info!("Loading configuration from {:?}", args.config);
    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    info!(config = %sanitized, "Configuration loaded successfully");

    let request = args.transfer_request()?;
    let orchestrator = build_orchestrator(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let result = orchestrator.run_until_cancelled(request, shutdown_rx).await;

    if args.print_metrics {
        print_metrics();
    }

    match result {
        Ok(outcome) => {
            let rendered =
                serde_json::to_string_pretty(&outcome).context("Failed to render outcome")?;
            println!("{}", rendered);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let report = json!({
                "error": e.error_code(),
                "message": e.to_string(),
                "context": e.debug_context(),
            });
            let rendered =
                serde_json::to_string_pretty(&report).context("Failed to render failure")?;
            println!("{}", rendered);
            Ok(ExitCode::from(exit_code_for(&e)))
        }
    }
}

fn build_orchestrator(config: &Config) -> Result<TransferOrchestrator> {
    let store = Arc::new(FsObjectStore::new(config.storage.root.clone()));
    info!("Using object store at {:?}", config.storage.root);

    let gateway = create_gateway(&config.notifications).context("Failed to create notifier")?;
    info!(
        topic = gateway.topic(),
        policy = ?gateway.policy(),
        "Notification gateway ready"
    );

    let worker = Arc::new(
        HttpWorker::from_config(&config.worker).context("Failed to create worker client")?,
    );
    let policy = RetryPolicy::from(&config.retry);
    info!(
        endpoint = %config.worker.endpoint,
        max_attempts = policy.max_attempts,
        "Worker client ready"
    );

    Ok(TransferOrchestrator::new(
        IdempotencyGuard::new(store),
        gateway,
        WorkerInvoker::new(worker, policy),
        config.worker.invocation_settings(),
        config.orchestrator.limits(),
    ))
}

fn exit_code_for(error: &OrchestratorError) -> u8 {
    if error.is_precondition_failure() {
        EXIT_PRECONDITION
    } else {
        EXIT_FAILURE
    }
}

fn print_metrics() {
    use prometheus::Encoder;

    let registry = prometheus::Registry::new();
    for metric in metrics::all_metrics() {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }

    let mut buffer = Vec::new();
    match prometheus::TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        Ok(()) => eprintln!("{}", String::from_utf8_lossy(&buffer)),
        Err(e) => warn!("Failed to encode metrics: {}", e),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
