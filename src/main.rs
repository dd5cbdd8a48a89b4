use clap::Parser;

/// Entry point for the AIX Node Exporter.
///
/// Configuration comes from flags or `AIX_EXPORTER_*` environment variables,
/// log verbosity from `RUST_LOG`.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=info aix-node-exporter --port 9100 --collectors filesystems,mpio
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = aix_node_exporter::config::Config::parse();
    aix_node_exporter::run(config).await
}
