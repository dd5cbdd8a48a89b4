//! MPIO path status collector.
//!
//! Runs `lspath` and reports every listed path as a gauge that is `1` when the
//! path is `Enabled` and `0` for any of the known inactive states.
//!
//! The header is only written once the command output has been captured, so an
//! empty family means "no paths" while a missing family means "`lspath` could
//! not be run".

mod parser;

use std::sync::Arc;

pub use parser::{ParseError, PathState, PathStatus, parse_path_status_line};

use crate::collector::Collect;
use crate::command::CommandRunner;
use crate::error::ResultOkLogExt;
use crate::exposition::{MetricType, MetricWriter};

pub const METRIC_NAME: &str = "aix_mpio_path_status";
const METRIC_HELP: &str = "MPIO path status (1=path exists, 0=path failed)";

/// Default path-listing command.
pub const DEFAULT_COMMAND: &str = "lspath";

pub struct MpioCollector {
    runner: Arc<dyn CommandRunner>,
    command: String,
}

impl MpioCollector {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>) -> Self {
        Self {
            runner,
            command: command.into(),
        }
    }
}

impl Collect for MpioCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let Some(output) = self.runner.output(&self.command, &[]).ok_log() else {
            return;
        };

        out.header(METRIC_NAME, METRIC_HELP, MetricType::Gauge);
        for path in parse_output(&output, |err| log::warn!("{err}")) {
            out.sample(
                METRIC_NAME,
                &[
                    ("device", path.device),
                    ("adapter", path.adapter),
                    ("status", path.status.as_str()),
                ],
                path.health_value(),
            );
        }
    }
}

/// Parses full `lspath` output.
///
/// Blank and malformed lines are skipped silently. Lines with an unknown state
/// are skipped and handed to `on_unknown`.
pub fn parse_output<'a>(
    output: &'a str,
    mut on_unknown: impl FnMut(&ParseError),
) -> Vec<PathStatus<'a>> {
    output
        .split('\n')
        .filter_map(|line| match parse_path_status_line(line) {
            Ok(path) => Some(path),
            Err(ParseError::Blank | ParseError::Malformed(_)) => None,
            Err(err @ ParseError::UnknownStatus(_)) => {
                on_unknown(&err);
                None
            }
        })
        .collect()
}
