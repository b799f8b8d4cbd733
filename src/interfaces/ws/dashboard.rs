//! Dashboard connection handling
//!
//! Authenticated observers of the session projector's live view. The core
//! only emits on this socket; inbound frames are consumed for liveness.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};

use super::ocpp_server::ServerContext;

pub(super) async fn run<S>(
    ws_stream: WebSocketStream<S>,
    principal: String,
    context: Arc<ServerContext>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Initial snapshot goes out before the socket joins the broadcast set.
    let initial = context.projector.initial_data().to_string();
    ws_sender.send(Message::Text(initial)).await?;

    let dashboard_id = context.registry.register_dashboard(tx, principal.clone());
    info!(dashboard_id, principal, "Dashboard connected");

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if ws_sender.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(incoming) = ws_receiver.next().await {
        match incoming {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(_)) | Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Dashboards are write-only from the core's perspective.
            }
            Ok(_) => {}
            Err(e) => {
                warn!(dashboard_id, error = %e, "Dashboard socket error");
                break;
            }
        }
    }

    context.registry.deregister_dashboard(dashboard_id);
    writer.abort();
    info!(dashboard_id, "Dashboard disconnected");
    Ok(())
}
