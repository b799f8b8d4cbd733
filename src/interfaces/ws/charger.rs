//! Charge-point connection handling
//!
//! One receive task per charge point; all writes for the socket go through
//! one writer task fed by the registry's channel, so handler responses and
//! outbound commands never race on the sink.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{error, info, warn};

use crate::application::events::{
    ChargerConnectedEvent, ChargerDisconnectedEvent, Event,
};
use crate::application::handlers::OcppHandler;
use crate::application::registry::ForwardDirection;
use crate::domain::connection_event::{ConnectionEvent, ConnectionEventType};
use crate::support::ocpp_frame::MAX_FRAME_SIZE;
use crate::support::shutdown::ShutdownSignal;

use super::ocpp_server::ServerContext;

/// Idle ping cadence and allowed silence before the socket is dropped.
const PING_INTERVAL: Duration = Duration::from_secs(120);
const PONG_TIMEOUT: Duration = Duration::from_secs(30);

pub(super) async fn run<S>(
    ws_stream: WebSocketStream<S>,
    charger_id: String,
    peer: SocketAddr,
    subprotocol: String,
    context: Arc<ServerContext>,
    shutdown: ShutdownSignal,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // At most one live socket per charger id.
    let connection_id = match context.registry.accept_cp(&charger_id, tx) {
        Ok(connection_id) => connection_id,
        Err(reason) => {
            warn!(charger_id, peer = %peer, reason, "Rejecting duplicate connection");
            let _ = ws_sender
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Unsupported,
                    reason: "Charger ID already connected".into(),
                })))
                .await;
            return Ok(());
        }
    };

    info!(charger_id, connection_id, peer = %peer, subprotocol, "Charge point connected");

    if let Err(e) = context.service.mark_connected(&charger_id).await {
        error!(charger_id, error = %e, "Failed to persist connect");
    }
    context
        .service
        .repos()
        .connection_events()
        .append(
            ConnectionEvent::new(&charger_id, ConnectionEventType::Connect)
                .with_connection_id(&connection_id)
                .with_remote_address(peer.to_string())
                .with_subprotocol(&subprotocol),
        )
        .await;
    context
        .event_bus
        .publish(Event::ChargerConnected(ChargerConnectedEvent {
            charger_id: charger_id.clone(),
            connection_id: connection_id.clone(),
            remote_address: Some(peer.to_string()),
            subprotocol: Some(subprotocol),
        }));

    let handler = OcppHandler::new(
        charger_id.clone(),
        connection_id.clone(),
        context.service.clone(),
        context.engine.clone(),
        context.event_bus.clone(),
    );

    // Writer task: the single owner of the socket sink.
    let writer_charger_id = charger_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if let Err(e) = ws_sender.send(message).await {
                error!(charger_id = writer_charger_id.as_str(), error = %e, "Write failed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Receive loop: strictly sequential receive → handle → respond.
    let mut disconnect_reason: Option<String> = None;
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // first tick is immediate
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => {
                let Some(incoming) = incoming else {
                    disconnect_reason = Some("Stream ended".to_string());
                    break;
                };
                match incoming {
                    Ok(Message::Text(text)) => {
                        last_activity = Instant::now();
                        if text.len() > MAX_FRAME_SIZE {
                            warn!(charger_id, len = text.len(), "Dropping oversized frame");
                            continue;
                        }
                        let started = Instant::now();
                        context.registry.record_received();

                        if let Ok(raw) = serde_json::from_str::<serde_json::Value>(&text) {
                            context
                                .registry
                                .forward_to_masters(
                                    &charger_id,
                                    &connection_id,
                                    &raw,
                                    ForwardDirection::Incoming,
                                    started.elapsed().as_secs_f64() * 1000.0,
                                )
                                .await;
                        }

                        if let Some(response) = handler.handle(&text).await {
                            if !context.registry.send_to_cp(&charger_id, &response).await {
                                disconnect_reason = Some("Response write failed".to_string());
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(_)) => {
                        // tungstenite queues the pong automatically
                        last_activity = Instant::now();
                    }
                    Ok(Message::Pong(_)) => {
                        last_activity = Instant::now();
                    }
                    Ok(Message::Close(frame)) => {
                        info!(charger_id, ?frame, "Close frame received");
                        disconnect_reason = Some("Close frame received".to_string());
                        break;
                    }
                    Ok(Message::Binary(data)) => {
                        warn!(charger_id, len = data.len(), "Ignoring binary message");
                    }
                    Ok(Message::Frame(_)) => {}
                    Err(e) => {
                        error!(charger_id, error = %e, "WebSocket error");
                        disconnect_reason = Some(e.to_string());
                        break;
                    }
                }
            }
            _ = ping_interval.tick() => {
                if last_activity.elapsed() > PING_INTERVAL + PONG_TIMEOUT {
                    warn!(charger_id, "Pong timeout, dropping connection");
                    disconnect_reason = Some("Pong timeout".to_string());
                    break;
                }
                // Ping through the writer channel to keep write ordering
                // with responses.
                context.registry.send_ping(&charger_id);
            }
            _ = shutdown.notified().wait() => {
                info!(charger_id, "Closing connection for shutdown");
                disconnect_reason = Some("Server shutdown".to_string());
                context.registry.send_close(&charger_id, CloseCode::Away, "Server shutting down");
                break;
            }
        }
    }

    // Cleanup: runs on every exit path of the receive loop.
    let deregistered = context.registry.deregister_cp(&charger_id);
    if let Err(e) = context.service.mark_disconnected(&charger_id).await {
        error!(charger_id, error = %e, "Failed to persist disconnect");
    }
    let duration = deregistered.as_ref().map(|(_, d)| *d);
    context
        .service
        .repos()
        .connection_events()
        .append({
            let mut event = ConnectionEvent::new(&charger_id, ConnectionEventType::Disconnect)
                .with_connection_id(&connection_id)
                .with_remote_address(peer.to_string());
            if let Some(reason) = &disconnect_reason {
                event = event.with_reason(reason.clone());
            }
            if let Some(duration) = duration {
                event = event.with_duration(duration);
            }
            event
        })
        .await;

    context.engine.on_charger_disconnected(&charger_id).await;
    context
        .event_bus
        .publish(Event::ChargerDisconnected(ChargerDisconnectedEvent {
            charger_id: charger_id.clone(),
            connection_id: Some(connection_id),
            reason: disconnect_reason,
            session_duration_s: duration,
        }));

    // Deregistration dropped the writer's sender; give it a moment to flush
    // any queued close frame before the socket goes away.
    let _ = tokio::time::timeout(Duration::from_secs(1), writer).await;
    info!(charger_id, "Charge point disconnected");
    Ok(())
}

