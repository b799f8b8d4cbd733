//! OCPP WebSocket server
//!
//! Accepts charge-point connections at `wss://<host>:<port>/ocpp/{charger_id}`
//! (plain `ws://` without certificates), observers at `/master` and the
//! authenticated live view at `/dashboard`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::WebSocketStream;
use tracing::{error, info, warn};

use crate::application::commands::retry::SharedRetryEngine;
use crate::application::events::SharedEventBus;
use crate::application::projector::SharedSessionProjector;
use crate::application::registry::SharedConnectionRegistry;
use crate::application::services::ChargePointService;
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig};
use crate::support::shutdown::ShutdownSignal;

use super::negotiator::ProtocolNegotiator;
use super::tls::load_tls_config;
use super::{charger, dashboard, master};

/// Deadline for completing the TLS + WebSocket handshake.
const HANDSHAKE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct WsServerConfig {
    pub host: String,
    pub port: u16,
    /// Offered subprotocols, preference order.
    pub subprotocols: Vec<String>,
    pub ssl_certfile: Option<PathBuf>,
    pub ssl_keyfile: Option<PathBuf>,
}

impl WsServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared dependencies handed to each connection task.
pub(super) struct ServerContext {
    pub registry: SharedConnectionRegistry,
    pub service: Arc<ChargePointService>,
    pub engine: SharedRetryEngine,
    pub event_bus: SharedEventBus,
    pub projector: SharedSessionProjector,
    pub jwt: JwtConfig,
}

/// What the handshake callback resolved the connection to.
enum Route {
    Charger {
        charger_id: String,
        subprotocol: Option<String>,
    },
    Master,
    Dashboard {
        token: Option<String>,
    },
    Invalid,
}

pub struct OcppServer {
    config: WsServerConfig,
    context: Arc<ServerContext>,
    shutdown: ShutdownSignal,
}

impl OcppServer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: WsServerConfig,
        registry: SharedConnectionRegistry,
        service: Arc<ChargePointService>,
        engine: SharedRetryEngine,
        event_bus: SharedEventBus,
        projector: SharedSessionProjector,
        jwt: JwtConfig,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            config,
            context: Arc::new(ServerContext {
                registry,
                service,
                engine,
                event_bus,
                projector,
                jwt,
            }),
            shutdown,
        }
    }

    /// Bind and serve until shutdown. A bind failure propagates so the
    /// process exits non-zero.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let tls = match (&self.config.ssl_certfile, &self.config.ssl_keyfile) {
            (Some(cert), Some(key)) => Some(load_tls_config(cert, key)?),
            _ => {
                info!("TLS disabled for charge-point listener (no certificate configured)");
                None
            }
        };

        let addr = self.config.address();
        let listener = TcpListener::bind(&addr).await?;
        let scheme = if tls.is_some() { "wss" } else { "ws" };
        info!(
            "OCPP central system listening on {scheme}://{addr}/ocpp/{{charger_id}} \
             (observers: /master, dashboard: /dashboard)"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer, tls.clone()),
                        Err(e) => error!(error = %e, "Accept failed"),
                    }
                }
                _ = self.shutdown.notified().wait() => {
                    info!("WebSocket server received shutdown signal, refusing new connections");
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, tls: Option<TlsAcceptor>) {
        let context = Arc::clone(&self.context);
        let negotiator = ProtocolNegotiator::from_subprotocols(&self.config.subprotocols);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let result = match tls {
                Some(acceptor) => {
                    match tokio::time::timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                        Ok(Ok(tls_stream)) => {
                            handle_stream(tls_stream, peer, context, negotiator, shutdown).await
                        }
                        Ok(Err(e)) => {
                            warn!(peer = %peer, error = %e, "TLS handshake failed");
                            return;
                        }
                        Err(_) => {
                            warn!(peer = %peer, "TLS handshake timed out");
                            return;
                        }
                    }
                }
                None => handle_stream(stream, peer, context, negotiator, shutdown).await,
            };

            if let Err(e) = result {
                warn!(peer = %peer, error = %e, "Connection ended with error");
            }
        });
    }
}

async fn handle_stream<S>(
    stream: S,
    peer: SocketAddr,
    context: Arc<ServerContext>,
    negotiator: ProtocolNegotiator,
    shutdown: ShutdownSignal,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut route = Route::Invalid;

    let handshake = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, mut response: Response| {
        let path = req.uri().path().to_string();
        let requested_protocols = req
            .headers()
            .get("Sec-WebSocket-Protocol")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        route = resolve_route(&path, req);

        if let Route::Charger { subprotocol, .. } = &mut route {
            if let Some(version) = negotiator.negotiate(&requested_protocols) {
                *subprotocol = Some(version.subprotocol().to_string());
                if let Ok(value) = version.subprotocol().parse() {
                    response
                        .headers_mut()
                        .insert("Sec-WebSocket-Protocol", value);
                }
            }
        }

        Ok(response)
    });
    let ws_stream = tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake)
        .await
        .map_err(|_| "WebSocket handshake timed out")??;

    match route {
        Route::Charger {
            charger_id,
            subprotocol: None,
        } => {
            warn!(peer = %peer, charger_id, "No mutually supported subprotocol, closing 1002");
            close(ws_stream, CloseCode::Protocol, "Unsupported subprotocol").await;
            Ok(())
        }
        Route::Charger {
            charger_id,
            subprotocol: Some(subprotocol),
        } => {
            charger::run(ws_stream, charger_id, peer, subprotocol, context, shutdown).await
        }
        Route::Master => master::run(ws_stream, context).await,
        Route::Dashboard { token } => {
            let principal = token
                .as_deref()
                .and_then(|t| verify_token(t, &context.jwt).ok());
            match principal {
                Some(claims) => dashboard::run(ws_stream, claims.sub, context).await,
                None => {
                    warn!(peer = %peer, "Dashboard authentication failed, closing 1008");
                    close(ws_stream, CloseCode::Policy, "Authentication failed").await;
                    Ok(())
                }
            }
        }
        Route::Invalid => {
            warn!(peer = %peer, "Invalid WebSocket path, closing 1002");
            close(ws_stream, CloseCode::Protocol, "Invalid path").await;
            Ok(())
        }
    }
}

fn resolve_route(path: &str, req: &Request) -> Route {
    if let Some(rest) = path.strip_prefix("/ocpp/") {
        let charger_id = rest.trim_matches('/');
        if !charger_id.is_empty() && !charger_id.contains('/') {
            return Route::Charger {
                charger_id: charger_id.to_string(),
                subprotocol: None,
            };
        }
        return Route::Invalid;
    }

    match path {
        "/master" => Route::Master,
        "/dashboard" => Route::Dashboard {
            token: extract_bearer(req),
        },
        _ => Route::Invalid,
    }
}

/// Dashboard clients pass the JWT as `Authorization: Bearer <token>` or as a
/// `?token=` query parameter (browsers cannot set WebSocket headers).
fn extract_bearer(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get("Authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }
    req.uri().query().and_then(|query| {
        query.split('&').find_map(|pair| {
            pair.strip_prefix("token=").map(|t| t.to_string())
        })
    })
}

pub(super) async fn close<S>(
    mut ws_stream: WebSocketStream<S>,
    code: CloseCode,
    reason: &'static str,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let _ = ws_stream
        .close(Some(CloseFrame {
            code,
            reason: reason.into(),
        }))
        .await;
}
