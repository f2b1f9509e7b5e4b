use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, error, info, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::content;
use crate::request::{self, RawRequest};
use crate::resolver::{HardwareResolver, MAC_SENTINEL};
use crate::response::Response;

/// The decoy responder: owns the audit sink and the hardware-address
/// resolver, and handles every accepted connection for exactly one
/// request/response cycle.
pub struct DecoyServer {
    audit: Arc<AuditLog>,
    resolver: Arc<dyn HardwareResolver>,
    read_timeout: Option<Duration>,
}

impl DecoyServer {
    pub fn new(
        audit: Arc<AuditLog>,
        resolver: Arc<dyn HardwareResolver>,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            audit,
            resolver,
            read_timeout,
        }
    }

    /// Bind the listening socket. Address reuse is enabled so a restart after
    /// a crash does not trip over a lingering socket in TIME_WAIT.
    pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .context("failed to create listening socket")?;
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .with_context(|| format!("failed to bind {addr}"))?;
        socket
            .listen(128)
            .with_context(|| format!("failed to listen on {addr}"))
    }

    /// Accept connections until the process is killed. Each connection is
    /// handled in its own task; nothing a single peer does can take down the
    /// accept loop.
    pub async fn run(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            debug!(%peer, "connection accepted");
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                server.handle_connection(stream, peer).await;
            });
        }
    }

    /// One request/response cycle. Every failure is terminal for this
    /// connection only; the stream closes when it drops.
    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        let req = match self.read_request(&mut stream, peer).await {
            Some(req) => req,
            None => return,
        };

        if req.method != "GET" && req.method != "POST" {
            debug!(%peer, method = %req.method, "method rejected");
            Self::send(&mut stream, peer, &Response::method_not_allowed()).await;
            return;
        }

        let hardware_addr = self
            .resolver
            .resolve(peer.ip())
            .await
            .unwrap_or_else(|| MAC_SENTINEL.to_string());

        let entry = AuditEntry {
            peer_ip: peer.ip(),
            hardware_addr,
            user_agent: req.user_agent(),
            path: req.path.clone(),
            authorization: req.authorization(),
        };
        if let Err(e) = self.audit.record(&entry).await {
            warn!(%peer, error = %e, "audit append failed");
        }

        info!(%peer, method = %req.method, path = %req.path, "request handled");
        Self::send(&mut stream, peer, &dispatch(&req.path)).await;
    }

    async fn read_request(&self, stream: &mut TcpStream, peer: SocketAddr) -> Option<RawRequest> {
        match self.read_timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, request::read_request(stream, peer)).await {
                    Ok(req) => req,
                    Err(_) => {
                        debug!(%peer, "read deadline expired");
                        None
                    }
                }
            }
            None => request::read_request(stream, peer).await,
        }
    }

    async fn send(stream: &mut TcpStream, peer: SocketAddr, response: &Response) {
        if let Err(e) = response.write_to(stream).await {
            debug!(%peer, error = %e, "failed to write response");
        }
    }
}

/// Path policy of the emulated management interface. Keyed on the requested
/// path only; requests share no state.
pub fn dispatch(path: &str) -> Response {
    match path {
        "/sys.b" => Response::auth_challenge(),
        "/index.html" => match content::decoy_page() {
            Ok(html) => Response::login_page(html),
            Err(e) => {
                error!(error = %e, "error serving index.html");
                Response::internal_error()
            }
        },
        _ => Response::redirect_to_login(),
    }
}
