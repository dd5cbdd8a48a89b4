mod common;

use std::sync::Arc;
use std::time::Duration;

use aix_node_exporter::api::ServerLimits;
use aix_node_exporter::collector::{Collect, CollectorSet, Part, Registry, Slot};
use aix_node_exporter::exposition::{MetricType, MetricWriter};
use aix_node_exporter::mpio::MpioCollector;
use common::Canned;

fn mpio_only() -> (Registry, CollectorSet) {
    let mut registry = Registry::new();
    registry.register(
        Slot::Mpio,
        MpioCollector::new(Arc::new(Canned("Enabled hdisk0 fscsi0\n")), "lspath"),
    );
    (registry, [Part::Mpio].into_iter().collect())
}

fn small_body_limit() -> ServerLimits {
    ServerLimits {
        max_request_size: 1024,
        ..ServerLimits::default()
    }
}

#[tokio::test]
async fn test_oversized_request_is_rejected() {
    let (registry, enabled) = mpio_only();
    let server = common::serve_with_limits(registry, enabled, small_body_limit()).await;

    let head = format!(
        "POST / HTTP/1.1\r\nHost: {}\r\nContent-Length: 200000\r\nConnection: close\r\n\r\n",
        server.addr
    );
    let response = common::send_raw(server.addr, head.as_bytes()).await;
    assert!(
        response.starts_with("HTTP/1.1 413"),
        "unexpected response: {response}"
    );
    assert!(!response.contains("aix_mpio_path_status"));

    server.shutdown.cancel();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_request_within_limit_is_served() {
    let (registry, enabled) = mpio_only();
    let server = common::serve_with_limits(registry, enabled, small_body_limit()).await;

    let body = "x".repeat(512);
    let request = format!(
        "POST / HTTP/1.1\r\nHost: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        server.addr,
        body.len()
    );
    let response = common::send_raw(server.addr, request.as_bytes()).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains("aix_mpio_path_status{device=\"hdisk0\""));

    server.shutdown.cancel();
    server.handle.await.unwrap().unwrap();
}

struct Slow(Duration);

impl Collect for Slow {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        std::thread::sleep(self.0);
        out.header("slow", "finishes late", MetricType::Gauge);
    }
}

#[tokio::test]
async fn test_slow_scrape_times_out() {
    let mut registry = Registry::new();
    registry.register(Slot::Partition, Slow(Duration::from_millis(800)));
    let enabled: CollectorSet = [Part::Partition].into_iter().collect();
    let limits = ServerLimits {
        request_timeout: Duration::from_millis(100),
        ..ServerLimits::default()
    };
    let server = common::serve_with_limits(registry, enabled, limits).await;

    let (head, body) = common::request(server.addr, "GET", "/").await;
    assert!(head.starts_with("HTTP/1.1 408"), "{head}");
    assert!(!body.contains("slow"));

    server.shutdown.cancel();
    server.handle.await.unwrap().unwrap();
}
