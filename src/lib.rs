//! AIX Node Exporter: serves host metrics of an AIX partition in the
//! Prometheus text exposition format.
//!
//! Every request to the listener, regardless of method or path, runs the
//! enabled collectors synchronously and answers with the rendered document.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use collector::{Registry, Slot};
use command::{CommandRunner, ProcessRunner};
use config::Config;
use exporter::Exporter;
use exposition::StaticLabels;

pub mod api;
pub mod collector;
pub mod command;
pub mod config;
pub mod error;
pub mod exporter;
pub mod exposition;
pub mod filesystem;
pub mod mounts;
pub mod mpio;

/// Builds the registry with every collector this build can back.
///
/// Slots that need libperfstat stay empty; callers may still fill them via
/// [`Registry::register`].
pub fn default_registry(config: &Config) -> Registry {
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    let mut registry = Registry::new();
    registry
        .register(Slot::CpuCompat, collector::CpuCompatCollector)
        .register(Slot::CpusCompat, collector::CpusCompatCollector)
        .register(Slot::Cpus, collector::CpusCollector)
        .register(Slot::Memory, collector::MemoryCollector)
        .register(Slot::Disks, collector::DisksCollector)
        .register(Slot::NetInterfaces, collector::NetInterfacesCollector)
        .register(Slot::Partition, collector::PartitionCollector)
        .register(
            Slot::Filesystems,
            filesystem::FilesystemsCollector::new(
                mounts::KernelMountTable,
                filesystem::StatvfsStatter,
            ),
        )
        .register(
            Slot::Vmstat,
            collector::VmstatCollector::new(Arc::clone(&runner), config.vmstat_command.as_str()),
        )
        .register(
            Slot::Mpio,
            mpio::MpioCollector::new(runner, config.lspath_command.as_str()),
        );
    registry
}

/// Cancels `shutdown` on the first SIGINT or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            log::error!("failed to install SIGTERM handler: {err}");
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("failed to install SIGINT handler: {err}");
                return;
            }
        }
    }
    log::info!("Received termination signal");
    shutdown.cancel();
}

/// Runs the exporter until a termination signal arrives.
///
/// # Errors
///
/// Fails if the listen address cannot be bound or the server stops with an
/// I/O error. Collector failures never surface here.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let enabled = config.enabled_collectors();
    let registry = default_registry(&config);
    for part in registry.unbacked_parts(&enabled) {
        log::warn!("collector {part:?} is enabled but unavailable in this build");
    }
    log::debug!("Enabled collectors: {enabled:?}");

    let exporter = Arc::new(Exporter::new(registry, enabled, StaticLabels::from_host));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind `{addr}`: {err}"))?;
    log::info!("Listening on {addr}");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    api::APIServer::new(exporter, config.server_limits())
        .listen(listener, shutdown)
        .await?;
    log::info!("Shutting down gracefully");
    Ok(())
}
