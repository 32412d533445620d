//! Peer transport - WebSocket connection to the gateway peer
//!
//! Opens one connection per invocation to the peer endpoint named by the
//! profile, enrolls the session identity, and exchanges request/response
//! frames. There is no reconnection: the session lives and dies with the
//! invocation. No commit-event subscription is ever issued; the only
//! frames awaited are direct responses, each bounded by the caller.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, warn};

use crate::gateway::{GatewayOptions, LedgerConnector, LedgerTransport};
use crate::identity::Identity;
use crate::types::{Result, WicketError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production connector: one WebSocket session per invocation.
#[derive(Debug, Default)]
pub struct PeerConnector;

impl PeerConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LedgerConnector for PeerConnector {
    async fn open(
        &self,
        endpoint: &str,
        identity: &Identity,
        options: &GatewayOptions,
    ) -> Result<Arc<dyn LedgerTransport>> {
        if options.discovery_enabled {
            // The profile is the only peer source for this transport.
            warn!("Peer discovery requested but unsupported; using profile peers only");
        }
        let transport = PeerTransport::connect(endpoint, identity).await?;
        Ok(Arc::new(transport))
    }
}

/// Request/response channel over one peer WebSocket.
pub struct PeerTransport {
    tx: mpsc::Sender<(Vec<u8>, oneshot::Sender<Vec<u8>>)>,
}

impl PeerTransport {
    /// Connect to the peer and enroll the session identity.
    pub async fn connect(endpoint: &str, identity: &Identity) -> Result<Self> {
        let (mut ws, _) = connect_async(endpoint)
            .await
            .map_err(|e| WicketError::Ledger(format!("peer connect failed: {e}")))?;

        send_enrollment(&mut ws, identity).await?;
        debug!(endpoint = %endpoint, msp_id = %identity.msp_id, "Peer session enrolled");

        let (tx, rx) = mpsc::channel::<(Vec<u8>, oneshot::Sender<Vec<u8>>)>(64);
        tokio::spawn(async move {
            session_loop(ws, rx).await;
        });

        Ok(Self { tx })
    }
}

#[async_trait]
impl LedgerTransport for PeerTransport {
    async fn request(&self, payload: Vec<u8>, timeout_ms: u64) -> Result<Vec<u8>> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send((payload, response_tx))
            .await
            .map_err(|_| WicketError::Ledger("peer session closed".to_string()))?;

        match timeout(Duration::from_millis(timeout_ms), response_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(WicketError::Ledger("response channel closed".to_string())),
            Err(_) => Err(WicketError::Ledger(format!(
                "no response from peer within {timeout_ms}ms"
            ))),
        }
    }
}

/// Enrollment frame sent once after connect, identifying the session.
///
/// Carries the membership id and certificate only; the private key never
/// leaves the invocation.
async fn send_enrollment(ws: &mut WsStream, identity: &Identity) -> Result<()> {
    let frame = json!({
        "type": "enroll",
        "msp_id": identity.msp_id,
        "certificate": identity.certificate,
        "kind": identity.kind,
    });

    let buf = serde_json::to_vec(&frame)
        .map_err(|e| WicketError::Ledger(format!("failed to encode enrollment: {e}")))?;

    ws.send(Message::Binary(buf))
        .await
        .map_err(|e| WicketError::Ledger(format!("failed to send enrollment: {e}")))
}

/// Pump requests out and responses back until either side closes.
///
/// Responses from the peer arrive in request order, so pending reply
/// channels form a simple queue.
async fn session_loop(ws: WsStream, mut rx: mpsc::Receiver<(Vec<u8>, oneshot::Sender<Vec<u8>>)>) {
    let (mut sink, mut stream) = ws.split();
    let mut pending: VecDeque<oneshot::Sender<Vec<u8>>> = VecDeque::new();

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some((data, response_tx)) = outbound else {
                    // All handles dropped; the invocation is over.
                    break;
                };
                pending.push_back(response_tx);
                if let Err(e) = sink.send(Message::Binary(data)).await {
                    error!("Failed to send to peer: {e}");
                    pending.pop_back();
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Binary(data))) => {
                        if let Some(sender) = pending.pop_front() {
                            let _ = sender.send(data.to_vec());
                        } else {
                            warn!("Peer response with no pending request");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Peer closed session: {frame:?}");
                        break;
                    }
                    Some(Err(e)) => {
                        error!("Peer session error: {e}");
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
        }
    }
    // Dropping `pending` wakes every waiter with a closed-channel error.
}
