//! Nodes observer daemon
//!
//! Loads the configuration, checks the vital nodes on a timer, serves the
//! client registration endpoint and logs aggregate status changes.
//!
//! Usage:
//!   nodes-observer --config <file> [--log-filter <filter>] [--simulation]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use nodes_observer::config::ObserverConfig;
use nodes_observer::observer::sources::{ChannelNotifier, JsonFileParamStore, MemoryParamStore};
use nodes_observer::observer::{
    CheckLoop, HealthStatus, NodesTracker, ParameterStore, ProcessRegistry,
};
#[cfg(unix)]
use nodes_observer::utils::create_shutdown_receiver;
use nodes_observer::utils::{init_logging_from_config, wait_for_shutdown_signal};

#[cfg(not(target_os = "windows"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "nodes-observer", about = "Vital nodes liveness and readiness monitor")]
struct Args {
    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(long, short)]
    config: PathBuf,

    /// Log filter, overrides the config file (RUST_LOG still wins)
    #[arg(long)]
    log_filter: Option<String>,

    /// Force simulation mode: the real-hardware vital nodes are not required
    #[arg(long)]
    simulation: bool,
}

#[cfg(feature = "sysinfo")]
fn process_registry() -> anyhow::Result<Arc<dyn ProcessRegistry>> {
    Ok(Arc::new(
        nodes_observer::observer::sources::SysinfoProcessRegistry::new(),
    ))
}

#[cfg(not(feature = "sysinfo"))]
fn process_registry() -> anyhow::Result<Arc<dyn ProcessRegistry>> {
    Err(anyhow::anyhow!(
        "no process registry available: build with the 'sysinfo' feature"
    ))
}

#[cfg(unix)]
async fn serve_until_shutdown(
    config: &ObserverConfig,
    tracker: &Arc<NodesTracker>,
) -> anyhow::Result<()> {
    use nodes_observer::ipc::PingServer;
    use nodes_observer::RegistrationEndpoint;

    if config.ipc.enabled {
        let endpoint = RegistrationEndpoint::new(Arc::clone(tracker));
        let server = PingServer::new(&config.ipc.socket_path, endpoint);
        server.run(create_shutdown_receiver()).await?;
    } else {
        wait_for_shutdown_signal().await;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn serve_until_shutdown(
    config: &ObserverConfig,
    _tracker: &Arc<NodesTracker>,
) -> anyhow::Result<()> {
    if config.ipc.enabled {
        warn!("Registration endpoint needs Unix domain sockets, running without it");
    }
    wait_for_shutdown_signal().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ObserverConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    config.apply_env_overrides();
    if args.simulation {
        config.observer.simulation_mode = Some(true);
    }

    init_logging_from_config(config.logging.as_ref(), args.log_filter.as_deref());

    config.validate()?;
    let settings = config.settings()?;
    info!(
        "Nodes observer starting: {} vital node(s), {} initialization parameter(s), {} Hz",
        settings.vital_nodes().len(),
        settings.initialization_params().len(),
        settings.check_frequency_hz()
    );

    let registry = process_registry()?;
    let params: Arc<dyn ParameterStore> = match &config.params.file {
        Some(path) => {
            info!("Reading parameters from {}", path);
            Arc::new(JsonFileParamStore::new(path))
        }
        None => Arc::new(MemoryParamStore::with_values(config.params.initial.clone())),
    };
    let (notifier, mut changes) = ChannelNotifier::new();

    let tracker = Arc::new(NodesTracker::new(
        settings,
        registry,
        params,
        Arc::new(notifier),
    ));

    // Parent status component: re-publish on every change signal
    let reporter = Arc::clone(&tracker);
    tokio::spawn(async move {
        let mut last: Option<HealthStatus> = None;
        while changes.recv().await.is_some() {
            let status = reporter.status().await;
            let overall = status.overall();
            if last != Some(overall) {
                info!(
                    "Nodes status {:?}: missing={:?}, uninitialized={:?}, clients={:?}",
                    overall,
                    status.missing_vital_nodes,
                    status.uninitialized_params,
                    status.active_clients
                );
            } else {
                debug!("Nodes status unchanged: {:?}", overall);
            }
            last = Some(overall);
        }
    });

    if tracker.check_nodes_initialization().await {
        info!("All vital nodes alive and initialized");
    } else {
        warn!(
            "Nodes not ready: missing={:?}, uninitialized={:?}",
            tracker.missing_vital_nodes().await,
            tracker.uninitialized_params().await
        );
    }

    let check_loop = CheckLoop::new();
    check_loop.start(Arc::clone(&tracker));

    serve_until_shutdown(&config, &tracker).await?;

    drop(check_loop);
    info!("Nodes observer stopped");
    Ok(())
}
