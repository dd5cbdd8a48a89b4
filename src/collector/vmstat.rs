//! `vmstat -v` counters.
//!
//! Every output line has the shape `<value> <description>`, e.g.
//! `   4194304 memory pages` or `      3.0 minperm percentage`. Each line becomes
//! a gauge named `aix_vmstat_v_<description>`.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::Collect;
use crate::command::CommandRunner;
use crate::error::ResultOkLogExt;
use crate::exposition::{MetricType, MetricWriter};

pub const DEFAULT_COMMAND: &str = "vmstat";
const PREFIX: &str = "aix_vmstat_v_";

pub struct VmstatCollector {
    runner: Arc<dyn CommandRunner>,
    command: String,
}

impl VmstatCollector {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>) -> Self {
        Self {
            runner,
            command: command.into(),
        }
    }
}

impl Collect for VmstatCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let Some(output) = self.runner.output(&self.command, &["-v"]).ok_log() else {
            return;
        };

        let mut emitted = BTreeSet::new();
        for (description, value) in output.lines().filter_map(parse_line) {
            let name = format!("{PREFIX}{}", metric_suffix(description));
            if !emitted.insert(name.clone()) {
                log::debug!("skipping `{description}`: `{name}` already reported");
                continue;
            }
            out.header(&name, description, MetricType::Gauge);
            out.sample(&name, &[], value);
        }
    }
}

/// Splits a line into its description and numeric value.
fn parse_line(line: &str) -> Option<(&str, f64)> {
    let (value, description) = line.trim().split_once(char::is_whitespace)?;
    let value = value.parse().ok()?;
    let description = description.trim();
    if description.is_empty() {
        return None;
    }
    Some((description, value))
}

/// `pending disk I/Os blocked with no pbuf` -> `pending_disk_i_os_blocked_with_no_pbuf`
fn metric_suffix(description: &str) -> String {
    let mut out = String::with_capacity(description.len());
    for c in description.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_owned()
}
