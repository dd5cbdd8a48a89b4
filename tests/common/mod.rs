#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use aix_node_exporter::api::{APIServer, ServerLimits};
use aix_node_exporter::collector::{CollectorSet, Registry};
use aix_node_exporter::command::{self, CommandRunner};
use aix_node_exporter::exporter::Exporter;
use aix_node_exporter::exposition::StaticLabels;
use aix_node_exporter::filesystem::{FsUsage, Statter};
use aix_node_exporter::mounts::{MountTable, QueryOutcome};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const MNT_J2: i32 = 0;
pub const MNT_NFS: i32 = 2;

/// Packs one `vmount` record carrying only the object and stub strings.
pub fn encode_vmount(gfstype: i32, object: &str, stub: &str) -> Vec<u8> {
    const HEADER_LEN: usize = 60;
    let mut data = Vec::new();
    let mut index = [(0i16, 0i16); 6];
    for (slot, value) in [(0, object), (1, stub)] {
        index[slot] = ((HEADER_LEN + data.len()) as i16, (value.len() + 1) as i16);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
    }
    while data.len() % 4 != 0 {
        data.push(0);
    }

    let mut record = vec![0u8; HEADER_LEN];
    record[4..8].copy_from_slice(&((HEADER_LEN + data.len()) as u32).to_ne_bytes());
    record[32..36].copy_from_slice(&gfstype.to_ne_bytes());
    for (i, (off, size)) in index.iter().enumerate() {
        let at = 36 + i * 4;
        record[at..at + 2].copy_from_slice(&off.to_ne_bytes());
        record[at + 2..at + 4].copy_from_slice(&size.to_ne_bytes());
    }
    record.extend_from_slice(&data);
    record
}

/// A mount table with fixed contents.
pub struct FixedTable {
    packed: Vec<u8>,
    count: usize,
}

impl FixedTable {
    pub fn new(mounts: &[(i32, &str, &str)]) -> Self {
        let packed = mounts
            .iter()
            .flat_map(|(gfstype, object, stub)| encode_vmount(*gfstype, object, stub))
            .collect();
        Self {
            packed,
            count: mounts.len(),
        }
    }
}

impl MountTable for FixedTable {
    fn query(&self, buf: &mut [u8]) -> std::io::Result<QueryOutcome> {
        if buf.len() < self.packed.len() {
            return Ok(QueryOutcome::TooSmall);
        }
        buf[..self.packed.len()].copy_from_slice(&self.packed);
        Ok(QueryOutcome::Entries(self.count))
    }
}

/// Reports the same usage for every path.
pub struct FixedStatter(pub FsUsage);

impl Statter for FixedStatter {
    fn stat(&self, _path: &Path) -> nix::Result<FsUsage> {
        Ok(self.0)
    }
}

/// Returns canned stdout for any command.
pub struct Canned(pub &'static str);

impl CommandRunner for Canned {
    fn output(&self, _program: &str, _args: &[&str]) -> command::Result<String> {
        Ok(self.0.to_owned())
    }
}

pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<std::io::Result<()>>,
}

pub async fn serve(registry: Registry, enabled: CollectorSet) -> RunningServer {
    serve_with_limits(registry, enabled, ServerLimits::default()).await
}

pub async fn serve_with_limits(
    registry: Registry,
    enabled: CollectorSet,
    limits: ServerLimits,
) -> RunningServer {
    let exporter = Arc::new(Exporter::new(registry, enabled, || {
        StaticLabels::new([("hostname", "lpar01")])
    }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = APIServer::new(exporter, limits);
    let handle = tokio::spawn(server.listen(listener, shutdown.clone()));
    RunningServer {
        addr,
        shutdown,
        handle,
    }
}

/// Sends one raw HTTP/1.1 request and returns `(head, body)`.
pub async fn request(addr: SocketAddr, method: &str, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    (head.to_owned(), body.to_owned())
}

pub fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

/// Writes `raw` as-is and returns everything the server sends back before it
/// closes the connection.
pub async fn send_raw(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => received.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&received).into_owned()
}
