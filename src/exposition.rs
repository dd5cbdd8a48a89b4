//! Writer for the Prometheus text exposition format (version 0.0.4).
//!
//! Every metric family is emitted as a `# HELP` and `# TYPE` header followed by
//! zero or more sample lines:
//!
//! ```text
//! # HELP aix_mpio_path_status MPIO path status (1=path exists, 0=path failed)
//! # TYPE aix_mpio_path_status gauge
//! aix_mpio_path_status{device="hdisk2",adapter="fscsi0",status="Enabled",hostname="lpar01"} 1
//! ```
//!
//! Each line additionally carries the per-request [`StaticLabels`] fragment.

use std::fmt::{self, Display, Write};

/// Content type announced for the exposition document.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Metric family type announced in the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        })
    }
}

/// Pre-formatted label fragment appended to every sample of one response,
/// e.g. `hostname="lpar01"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLabels(String);

impl StaticLabels {
    /// Builds the fragment from label pairs, escaping the values.
    pub fn new<'a>(labels: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut fragment = String::new();
        for (name, value) in labels {
            if !fragment.is_empty() {
                fragment.push(',');
            }
            push_label(&mut fragment, name, value);
        }
        Self(fragment)
    }

    /// Labels identifying this host.
    pub fn from_host() -> Self {
        let hostname = sysinfo::System::host_name().unwrap_or_default();
        Self::new([("hostname", hostname.as_str())])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Appends metric families to a response buffer.
#[derive(Debug)]
pub struct MetricWriter<'a> {
    buf: &'a mut String,
    static_labels: &'a StaticLabels,
}

impl<'a> MetricWriter<'a> {
    pub fn new(buf: &'a mut String, static_labels: &'a StaticLabels) -> Self {
        Self { buf, static_labels }
    }

    /// Writes the `# HELP` and `# TYPE` lines of a metric family.
    pub fn header(&mut self, name: &str, help: &str, kind: MetricType) {
        // Writing into a `String` cannot fail.
        let _ = writeln!(self.buf, "# HELP {name} {help}");
        let _ = writeln!(self.buf, "# TYPE {name} {kind}");
    }

    /// Writes one sample line; `labels` precede the static labels.
    pub fn sample(&mut self, name: &str, labels: &[(&str, &str)], value: impl Display) {
        self.buf.push_str(name);
        if !labels.is_empty() || !self.static_labels.is_empty() {
            self.buf.push('{');
            for (i, (label, label_value)) in labels.iter().enumerate() {
                if i > 0 {
                    self.buf.push(',');
                }
                push_label(self.buf, label, label_value);
            }
            if !self.static_labels.is_empty() {
                if !labels.is_empty() {
                    self.buf.push(',');
                }
                self.buf.push_str(self.static_labels.as_str());
            }
            self.buf.push('}');
        }
        let _ = writeln!(self.buf, " {value}");
    }
}

fn push_label(buf: &mut String, name: &str, value: &str) {
    buf.push_str(name);
    buf.push_str("=\"");
    for c in value.chars() {
        match c {
            '\\' => buf.push_str("\\\\"),
            '"' => buf.push_str("\\\""),
            '\n' => buf.push_str("\\n"),
            c => buf.push(c),
        }
    }
    buf.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lines() {
        let mut buf = String::new();
        let labels = StaticLabels::default();
        MetricWriter::new(&mut buf, &labels).header("aix_fs_files", "Inodes", MetricType::Gauge);
        assert_eq!(
            buf,
            "# HELP aix_fs_files Inodes\n# TYPE aix_fs_files gauge\n"
        );
    }

    #[test]
    fn test_sample_with_static_labels() {
        let mut buf = String::new();
        let labels = StaticLabels::new([("hostname", "lpar01")]);
        MetricWriter::new(&mut buf, &labels).sample(
            "aix_mpio_path_status",
            &[("device", "hdisk2"), ("adapter", "fscsi0")],
            1,
        );
        assert_eq!(
            buf,
            "aix_mpio_path_status{device=\"hdisk2\",adapter=\"fscsi0\",hostname=\"lpar01\"} 1\n"
        );
    }

    #[test]
    fn test_sample_without_any_labels() {
        let mut buf = String::new();
        let labels = StaticLabels::default();
        MetricWriter::new(&mut buf, &labels).sample("node_load1", &[], 0.5);
        assert_eq!(buf, "node_load1 0.5\n");
    }

    #[test]
    fn test_only_static_labels() {
        let mut buf = String::new();
        let labels = StaticLabels::new([("hostname", "a"), ("lpar", "b")]);
        MetricWriter::new(&mut buf, &labels).sample("aix_cpu_count", &[], 4);
        assert_eq!(buf, "aix_cpu_count{hostname=\"a\",lpar=\"b\"} 4\n");
    }

    #[test]
    fn test_label_values_are_escaped() {
        let labels = StaticLabels::new([("path", "C:\\dir \"x\"\nnext")]);
        assert_eq!(labels.as_str(), "path=\"C:\\\\dir \\\"x\\\"\\nnext\"");
    }

    #[test]
    fn test_counter_type() {
        assert_eq!(MetricType::Counter.to_string(), "counter");
    }
}
