use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use crate::api::ServerLimits;
use crate::collector::{CollectorSet, Part};

/// Prometheus exporter for AIX hosts.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Port to listen on.
    #[arg(short, long, env = "AIX_EXPORTER_PORT", default_value_t = 9100)]
    pub port: u16,

    /// Address to bind.
    #[arg(
        long,
        env = "AIX_EXPORTER_LISTEN_ADDRESS",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub listen_address: IpAddr,

    /// Comma separated collectors to enable. Defaults to all of them.
    #[arg(
        short,
        long,
        env = "AIX_EXPORTER_COLLECTORS",
        value_enum,
        value_delimiter = ','
    )]
    pub collectors: Vec<Part>,

    /// Maximum number of concurrently served scrapes.
    #[arg(long, env = "AIX_EXPORTER_THREADS", default_value_t = 5)]
    pub threads: usize,

    /// Per-request timeout in seconds.
    #[arg(long, env = "AIX_EXPORTER_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Maximum request body size in bytes.
    #[arg(long, env = "AIX_EXPORTER_MAX_REQUEST_SIZE", default_value_t = 131_072)]
    pub max_request_size: usize,

    #[arg(long, env = "AIX_EXPORTER_LSPATH_COMMAND", default_value = crate::mpio::DEFAULT_COMMAND)]
    pub lspath_command: String,

    /// Invoked with `-v`.
    #[arg(long, env = "AIX_EXPORTER_VMSTAT_COMMAND", default_value = crate::collector::vmstat::DEFAULT_COMMAND)]
    pub vmstat_command: String,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }

    /// An empty list enables every collector.
    pub fn enabled_collectors(&self) -> CollectorSet {
        if self.collectors.is_empty() {
            CollectorSet::all()
        } else {
            self.collectors.iter().copied().collect()
        }
    }

    pub fn server_limits(&self) -> ServerLimits {
        ServerLimits {
            max_concurrent_scrapes: self.threads,
            request_timeout: Duration::from_secs(self.request_timeout),
            max_request_size: self.max_request_size,
        }
    }
}
