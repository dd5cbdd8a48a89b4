//! Portable peer collectors backed by `sysinfo`.
//!
//! Every collector builds a fresh `sysinfo` view per scrape, so nothing is
//! shared between concurrent requests.

use std::collections::BTreeMap;

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};

use super::Collect;
use crate::exposition::{MetricType, MetricWriter};

/// node_exporter compatible load averages.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuCompatCollector;

impl Collect for CpuCompatCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let load = System::load_average();
        for (name, help, value) in [
            ("node_load1", "1m load average.", load.one),
            ("node_load5", "5m load average.", load.five),
            ("node_load15", "15m load average.", load.fifteen),
        ] {
            out.header(name, help, MetricType::Gauge);
            out.sample(name, &[], value);
        }
    }
}

/// node_exporter compatible per-CPU frequency.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpusCompatCollector;

impl Collect for CpusCompatCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        const NAME: &str = "node_cpu_frequency_hertz";
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_frequency()),
        );

        out.header(NAME, "Current CPU frequency in hertz.", MetricType::Gauge);
        for (index, cpu) in sys.cpus().iter().enumerate() {
            let index = index.to_string();
            out.sample(
                NAME,
                &[("cpu", index.as_str())],
                cpu.frequency().saturating_mul(1_000_000),
            );
        }
    }
}

/// Per-CPU utilisation, sampled over [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CpusCollector;

impl Collect for CpusCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        out.header("aix_cpu_count", "Number of logical CPUs", MetricType::Gauge);
        out.sample("aix_cpu_count", &[], sys.cpus().len());

        out.header(
            "aix_cpu_usage_percent",
            "CPU utilisation in percent",
            MetricType::Gauge,
        );
        for cpu in sys.cpus() {
            out.sample(
                "aix_cpu_usage_percent",
                &[("cpu", cpu.name())],
                cpu.cpu_usage(),
            );
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryCollector;

impl Collect for MemoryCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        );

        for (name, help, value) in [
            ("aix_memory_total_bytes", "Real memory size in bytes", sys.total_memory()),
            ("aix_memory_free_bytes", "Free real memory in bytes", sys.free_memory()),
            (
                "aix_memory_available_bytes",
                "Memory available for new work in bytes",
                sys.available_memory(),
            ),
            ("aix_memory_used_bytes", "Used real memory in bytes", sys.used_memory()),
            ("aix_memory_swap_total_bytes", "Paging space size in bytes", sys.total_swap()),
            ("aix_memory_swap_free_bytes", "Free paging space in bytes", sys.free_swap()),
        ] {
            out.header(name, help, MetricType::Gauge);
            out.sample(name, &[], value);
        }
    }
}

/// Cumulative block I/O per disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisksCollector;

impl Collect for DisksCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let disks = Disks::new_with_refreshed_list();
        // Several mounts can share one device.
        let usage: BTreeMap<String, sysinfo::DiskUsage> = disks
            .list()
            .iter()
            .map(|disk| (disk.name().to_string_lossy().into_owned(), disk.usage()))
            .collect();

        type Counter = (&'static str, &'static str, fn(&sysinfo::DiskUsage) -> u64);
        let families: [Counter; 2] = [
            ("aix_disk_read_bytes_total", "Bytes read from disk", |u| u.total_read_bytes),
            ("aix_disk_written_bytes_total", "Bytes written to disk", |u| {
                u.total_written_bytes
            }),
        ];
        for (name, help, value) in families {
            out.header(name, help, MetricType::Counter);
            for (disk, u) in &usage {
                out.sample(name, &[("disk", disk.as_str())], value(u));
            }
        }
    }
}

/// Cumulative traffic per network interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetInterfacesCollector;

impl Collect for NetInterfacesCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let networks = Networks::new_with_refreshed_list();
        let interfaces: BTreeMap<&str, &sysinfo::NetworkData> = networks
            .list()
            .iter()
            .map(|(name, data)| (name.as_str(), data))
            .collect();

        type Counter = (&'static str, &'static str, fn(&sysinfo::NetworkData) -> u64);
        let families: [Counter; 6] = [
            ("aix_netinterface_received_bytes_total", "Bytes received", |d| {
                d.total_received()
            }),
            ("aix_netinterface_transmitted_bytes_total", "Bytes transmitted", |d| {
                d.total_transmitted()
            }),
            ("aix_netinterface_received_packets_total", "Packets received", |d| {
                d.total_packets_received()
            }),
            ("aix_netinterface_transmitted_packets_total", "Packets transmitted", |d| {
                d.total_packets_transmitted()
            }),
            ("aix_netinterface_receive_errors_total", "Receive errors", |d| {
                d.total_errors_on_received()
            }),
            ("aix_netinterface_transmit_errors_total", "Transmit errors", |d| {
                d.total_errors_on_transmitted()
            }),
        ];
        for (name, help, value) in families {
            out.header(name, help, MetricType::Counter);
            for (interface, data) in &interfaces {
                out.sample(name, &[("interface", *interface)], value(data));
            }
        }
    }
}

/// Identity and uptime of the logical partition.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartitionCollector;

impl Collect for PartitionCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let hostname = System::host_name().unwrap_or_default();
        let os_version = System::os_version().unwrap_or_default();
        let kernel_version = System::kernel_version().unwrap_or_default();

        out.header(
            "aix_partition_info",
            "Partition identity, value is always 1",
            MetricType::Gauge,
        );
        out.sample(
            "aix_partition_info",
            &[
                ("hostname", hostname.as_str()),
                ("os_version", os_version.as_str()),
                ("kernel_version", kernel_version.as_str()),
            ],
            1,
        );

        out.header(
            "aix_partition_uptime_seconds",
            "Seconds since boot",
            MetricType::Gauge,
        );
        out.sample("aix_partition_uptime_seconds", &[], System::uptime());

        match std::thread::available_parallelism() {
            Ok(cpus) => {
                out.header(
                    "aix_partition_online_cpus",
                    "Logical CPUs online in the partition",
                    MetricType::Gauge,
                );
                out.sample("aix_partition_online_cpus", &[], cpus.get());
            }
            Err(err) => log::error!("failed to count online CPUs: {err}"),
        }
    }
}
