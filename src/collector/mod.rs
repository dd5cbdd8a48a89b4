//! Collector registry and dispatch.
//!
//! A collector queries one category of OS state and appends its metric
//! families to the response buffer. The [`Registry`] holds one collector per
//! [`Slot`] and runs them in slot order; a slot runs only if its [`Part`] is
//! contained in the process-wide [`CollectorSet`].
//!
//! Collectors handle their own failures: an error inside one collector is
//! logged and results in fewer lines, never in an aborted scrape.

mod system;
pub mod vmstat;

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};

use crate::exposition::{MetricWriter, StaticLabels};

pub use system::{
    CpuCompatCollector, CpusCollector, CpusCompatCollector, DisksCollector, MemoryCollector,
    NetInterfacesCollector, PartitionCollector,
};
pub use vmstat::VmstatCollector;

/// A unit that appends the metrics of one OS subsystem.
pub trait Collect: Send + Sync {
    fn collect(&self, out: &mut MetricWriter<'_>);
}

/// Independently toggleable collector groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Part {
    /// node_exporter compatible CPU metrics.
    Compat,
    Cpu,
    DiskAdapter,
    DiskPath,
    MemPages,
    Mem,
    Disk,
    NetInterface,
    NetAdapter,
    NetBuffer,
    Partition,
    Filesystems,
    Vmstat,
    Fcstat,
    Mpio,
}

impl Part {
    pub const ALL: [Part; 15] = [
        Part::Compat,
        Part::Cpu,
        Part::DiskAdapter,
        Part::DiskPath,
        Part::MemPages,
        Part::Mem,
        Part::Disk,
        Part::NetInterface,
        Part::NetAdapter,
        Part::NetBuffer,
        Part::Partition,
        Part::Filesystems,
        Part::Vmstat,
        Part::Fcstat,
        Part::Mpio,
    ];
}

/// Registry positions. Declaration order is the output order of a scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    CpuCompat,
    CpusCompat,
    Cpus,
    DiskAdapters,
    DiskPaths,
    MemoryPages,
    Memory,
    Disks,
    NetInterfaces,
    NetAdapters,
    NetBuffers,
    Partition,
    Filesystems,
    Vmstat,
    Fcstat,
    Mpio,
}

impl Slot {
    /// The flag that enables this slot.
    pub fn part(self) -> Part {
        match self {
            Slot::CpuCompat | Slot::CpusCompat => Part::Compat,
            Slot::Cpus => Part::Cpu,
            Slot::DiskAdapters => Part::DiskAdapter,
            Slot::DiskPaths => Part::DiskPath,
            Slot::MemoryPages => Part::MemPages,
            Slot::Memory => Part::Mem,
            Slot::Disks => Part::Disk,
            Slot::NetInterfaces => Part::NetInterface,
            Slot::NetAdapters => Part::NetAdapter,
            Slot::NetBuffers => Part::NetBuffer,
            Slot::Partition => Part::Partition,
            Slot::Filesystems => Part::Filesystems,
            Slot::Vmstat => Part::Vmstat,
            Slot::Fcstat => Part::Fcstat,
            Slot::Mpio => Part::Mpio,
        }
    }
}

/// The set of enabled collector groups. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSet(BTreeSet<Part>);

impl CollectorSet {
    pub fn all() -> Self {
        Self(Part::ALL.into_iter().collect())
    }

    pub fn contains(&self, part: Part) -> bool {
        self.0.contains(&part)
    }

    pub fn iter(&self) -> impl Iterator<Item = Part> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Part> for CollectorSet {
    fn from_iter<I: IntoIterator<Item = Part>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fixed-order table of collectors.
#[derive(Default)]
pub struct Registry {
    collectors: BTreeMap<Slot, Box<dyn Collect>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `collector` at `slot`, replacing any previous one.
    pub fn register(&mut self, slot: Slot, collector: impl Collect + 'static) -> &mut Self {
        self.collectors.insert(slot, Box::new(collector));
        self
    }

    /// Enabled parts that have no collector registered in any of their slots.
    pub fn unbacked_parts(&self, enabled: &CollectorSet) -> Vec<Part> {
        enabled
            .iter()
            .filter(|part| !self.collectors.keys().any(|slot| slot.part() == *part))
            .collect()
    }

    /// Runs every enabled collector in slot order and returns the document.
    pub fn render(&self, enabled: &CollectorSet, static_labels: &StaticLabels) -> String {
        let mut buf = String::with_capacity(16 * 1024);

        for (slot, collector) in &self.collectors {
            if !enabled.contains(slot.part()) {
                continue;
            }
            let before = std::time::Instant::now();
            let mark = buf.len();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                collector.collect(&mut MetricWriter::new(&mut buf, static_labels));
            }));
            if outcome.is_err() {
                log::error!("collector {slot:?} panicked, dropping its partial output");
                buf.truncate(mark);
            }
            log::trace!(
                "collector {:?} took {} microseconds",
                slot,
                before.elapsed().as_micros()
            );
        }

        buf
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("slots", &self.collectors.keys().collect::<Vec<_>>())
            .finish()
    }
}
