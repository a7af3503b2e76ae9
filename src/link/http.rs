//! Route requests over plain HTTP POST.
//!
//! Each publish runs on a blocking worker; a non-empty reply body is queued as
//! an inbound response. At most one request is in flight at a time. A separate
//! monitor thread keeps the connectivity flag current so the tick loop never
//! touches the network itself.

use crate::error::AppError;
use crate::link::{RouteRequest, Transport};
use std::fmt;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(15);

pub struct HttpTransport {
    endpoint: String,
    timeout: Duration,
    connected: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
    inbound: mpsc::Sender<String>,
    runtime: Handle,
}

impl HttpTransport {
    pub fn new(
        endpoint: String,
        timeout: Duration,
        connected: Arc<AtomicBool>,
        inbound: mpsc::Sender<String>,
        runtime: Handle,
    ) -> Self {
        Self {
            endpoint,
            timeout,
            connected,
            in_flight: Arc::new(AtomicBool::new(false)),
            inbound,
            runtime,
        }
    }

    /// True while a published request is still waiting for its reply.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl Transport for HttpTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn publish(&mut self, request: &RouteRequest) -> Result<(), AppError> {
        let payload = request.to_payload()?;
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Previous route request still in flight, skipping");
            return Ok(());
        }

        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;
        let connected = Arc::clone(&self.connected);
        let in_flight = Arc::clone(&self.in_flight);
        let inbound = self.inbound.clone();

        self.runtime.spawn_blocking(move || {
            let reply =
                Endpoint::parse(&endpoint).and_then(|target| target.post_json(&payload, timeout));
            match reply {
                Ok(body) if body.trim().is_empty() => debug!("Route request accepted"),
                Ok(body) => {
                    if inbound.blocking_send(body).is_err() {
                        warn!("Inbound queue closed, dropping route reply");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Route request failed");
                    if matches!(err, HttpError::Connect(_) | HttpError::Dns(_)) {
                        connected.store(false, Ordering::Relaxed);
                    }
                }
            }
            in_flight.store(false, Ordering::Release);
        });
        Ok(())
    }
}

/// Probe `endpoint` with a TCP connect every `interval` until `stop` is set.
pub fn spawn_link_monitor(
    endpoint: String,
    interval: Duration,
    timeout: Duration,
    connected: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();
            let reachable = match probe(&endpoint, timeout) {
                Ok(()) => true,
                Err(err) => {
                    debug!(error = %err, "Link probe failed");
                    false
                }
            };
            let was = connected.swap(reachable, Ordering::Relaxed);
            if was != reachable {
                if reachable {
                    info!(endpoint = %endpoint, "Link up");
                } else {
                    warn!(endpoint = %endpoint, "Link down");
                }
            }
            sleep_with_stop(interval, &stop, cycle_start);
        }
    })
}

fn probe(endpoint: &str, timeout: Duration) -> Result<(), HttpError> {
    Endpoint::parse(endpoint)?.connect(timeout).map(drop)
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step.min(remaining - slept));
        slept += step;
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("dns error: {0}")]
    Dns(String),
    #[error("connect error: {0}")]
    Connect(#[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[source] std::io::Error),
    #[error("malformed reply: {0}")]
    Malformed(&'static str),
    #[error("http status {0}: {1}")]
    Status(u16, String),
}

/// Target of an `http://host[:port][/path]` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    fn parse(url: &str) -> Result<Self, HttpError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| HttpError::InvalidUrl(format!("{url}: only http:// is supported")))?;
        let (authority, path) = rest.find('/').map_or((rest, "/"), |at| rest.split_at(at));
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, "")) => (host, 80),
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| HttpError::InvalidUrl(format!("{url}: bad port {port:?}")))?;
                (host, port)
            }
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(HttpError::InvalidUrl(format!("{url}: missing host")));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    fn socket_addr(&self) -> Result<SocketAddr, HttpError> {
        let mut addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| HttpError::Dns(format!("{}: {err}", self.host)))?;
        addrs
            .next()
            .ok_or_else(|| HttpError::Dns(format!("{}: no addresses", self.host)))
    }

    fn connect(&self, timeout: Duration) -> Result<TcpStream, HttpError> {
        let stream =
            TcpStream::connect_timeout(&self.socket_addr()?, timeout).map_err(HttpError::Connect)?;
        stream.set_read_timeout(Some(timeout)).map_err(HttpError::Io)?;
        stream.set_write_timeout(Some(timeout)).map_err(HttpError::Io)?;
        Ok(stream)
    }

    /// POST `json` and return the reply body of a non-error status.
    fn post_json(&self, json: &str, timeout: Duration) -> Result<String, HttpError> {
        let mut stream = self.connect(timeout)?;
        let head = format!(
            "POST {path} HTTP/1.1\r\nHost: {host}\r\nContent-Type: application/json\r\n\
             Content-Length: {len}\r\nConnection: close\r\n\r\n",
            path = self.path,
            host = self.host,
            len = json.len(),
        );
        stream
            .write_all(head.as_bytes())
            .and_then(|()| stream.write_all(json.as_bytes()))
            .map_err(HttpError::Io)?;

        let mut raw = String::new();
        stream.read_to_string(&mut raw).map_err(HttpError::Io)?;
        let (status, body) = split_reply(&raw)?;
        if status >= 400 {
            return Err(HttpError::Status(status, body.trim().to_string()));
        }
        Ok(body.to_string())
    }
}

/// Status code and body of a raw HTTP/1.1 reply.
fn split_reply(raw: &str) -> Result<(u16, &str), HttpError> {
    let (head, body) = raw
        .split_once("\r\n\r\n")
        .ok_or(HttpError::Malformed("no end of headers"))?;
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or(HttpError::Malformed("no status code"))?;
    Ok((status, body))
}
