//! Master observer connection handling
//!
//! Masters receive the observer envelope for every OCPP frame in both
//! directions across all charge points. A text frame sent by a master is
//! broadcast verbatim to every connected charge point and the master is
//! answered with a delivery summary.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};

use super::ocpp_server::ServerContext;

pub(super) async fn run<S>(
    ws_stream: WebSocketStream<S>,
    context: Arc<ServerContext>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let master_id = context.registry.register_master(tx.clone());

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if ws_sender.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(incoming) = ws_receiver.next().await {
        match incoming {
            Ok(Message::Text(text)) => {
                let (sent, failed) = context.registry.broadcast_to_cps(&text).await;
                let feedback = if failed == 0 && sent > 0 {
                    json!({
                        "status": "success",
                        "message": format!("Message broadcast to {sent} charge point(s)"),
                    })
                } else {
                    json!({
                        "status": "warning",
                        "message": format!("Broadcast reached {sent} charge point(s), {failed} failed"),
                    })
                };
                if tx.send(Message::Text(feedback.to_string())).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(other) => {
                warn!(master_id, "Ignoring non-text master message: {other:?}");
            }
            Err(e) => {
                warn!(master_id, error = %e, "Master socket error");
                break;
            }
        }
    }

    context.registry.deregister_master(master_id);
    writer.abort();
    info!(master_id, "Master observer disconnected");
    Ok(())
}
