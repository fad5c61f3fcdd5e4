// TCP reachability probe
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Connect timeout used when none is configured
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Result of a single reachability probe
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "UPPERCASE")]
pub enum ProbeOutcome {
    Ok {
        /// Connect time in seconds
        elapsed: f64,
        port: u16,
    },
    Critical {
        error: String,
        host: String,
        port: u16,
    },
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Ok { .. })
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Ok { elapsed, port } => {
                write!(f, "TCP OK - {:.3} response on port {}", elapsed, port)
            }
            ProbeOutcome::Critical { error, host, port } => {
                write!(f, "Connection failed: {} to {}:{}", error, host, port)
            }
        }
    }
}

/// Host and optional port extracted from a URI-ish string
///
/// Accepts `scheme://host:port/path`, `host:port`, `host`, `[v6]:port`
/// and `:port`.
pub fn split_host_port(uri: &str) -> (Option<String>, Option<u16>) {
    let rest = uri.trim();
    let rest = rest.split_once("://").map_or(rest, |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, a)| a);

    let (host, port) = if let Some(v6) = authority.strip_prefix('[') {
        match v6.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':')),
            None => (v6, None),
        }
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    let host = (!host.is_empty()).then(|| host.to_string());
    let port = port.and_then(|p| p.parse::<u16>().ok());
    (host, port)
}

/// Checks whether a TCP endpoint accepts connections
#[derive(Debug, Clone)]
pub struct PortProbe {
    fallback_host: String,
    timeout: Duration,
}

impl PortProbe {
    /// # Arguments
    /// * `fallback_host` - Used when the URI carries no host
    /// * `timeout` - Connect timeout
    pub fn new(fallback_host: impl Into<String>, timeout: Duration) -> Self {
        Self {
            fallback_host: fallback_host.into(),
            timeout,
        }
    }

    /// Probe `uri`, using `default_port` when the URI has no port
    pub async fn check(&self, uri: &str, default_port: u16) -> ProbeOutcome {
        let (host, port) = split_host_port(uri);
        let host = host.unwrap_or_else(|| self.fallback_host.clone());
        let port = port.unwrap_or(default_port);

        debug!(host = %host, port, "Checking port");

        let started = Instant::now();
        let error = match timeout(self.timeout, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_stream)) => {
                return ProbeOutcome::Ok {
                    elapsed: started.elapsed().as_secs_f64(),
                    port,
                };
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "timed out".to_string(),
        };

        ProbeOutcome::Critical { error, host, port }
    }
}

impl Default for PortProbe {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PROBE_TIMEOUT)
    }
}
