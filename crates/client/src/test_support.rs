//! In-process mock of the agent backend's WebSocket endpoint, used by the
//! transport and client tests.

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use zenith_core::Config;

use crate::transport::ConnectionState;

pub(crate) enum CloseMode {
    /// Send a WebSocket close frame, then drop.
    Graceful,
    /// Drop the TCP stream without a close frame.
    Abrupt,
}

/// One accepted client connection.
pub(crate) struct BackendConn {
    pub accepted_at: Instant,
    to_client: mpsc::UnboundedSender<String>,
    pub from_client: mpsc::UnboundedReceiver<String>,
    close_tx: Option<oneshot::Sender<CloseMode>>,
}

impl BackendConn {
    /// Queue a text frame for the client.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.to_client.send(frame.into());
    }

    /// Terminate the connection. Dropping the handle instead closes it
    /// abruptly.
    pub fn close(&mut self, mode: CloseMode) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(mode);
        }
    }

    /// Wait for the next text frame from the client.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("timed out waiting for a client frame")
    }
}

pub(crate) struct MockBackend {
    addr: SocketAddr,
    pub accepts: mpsc::UnboundedReceiver<BackendConn>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock backend");
        let addr = listener.local_addr().expect("mock backend has no addr");
        let (accept_tx, accepts) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let accepted_at = Instant::now();
                let Ok(ws) = accept_async(stream).await else {
                    continue;
                };
                let (to_client_tx, to_client_rx) = mpsc::unbounded_channel::<String>();
                let (from_client_tx, from_client_rx) = mpsc::unbounded_channel::<String>();
                let (close_tx, close_rx) = oneshot::channel::<CloseMode>();

                if accept_tx
                    .send(BackendConn {
                        accepted_at,
                        to_client: to_client_tx,
                        from_client: from_client_rx,
                        close_tx: Some(close_tx),
                    })
                    .is_err()
                {
                    break;
                }

                tokio::spawn(serve_conn(ws, to_client_rx, from_client_tx, close_rx));
            }
        });

        Self {
            addr,
            accepts,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_conn(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    mut to_client: mpsc::UnboundedReceiver<String>,
    from_client: mpsc::UnboundedSender<String>,
    mut close_rx: oneshot::Receiver<CloseMode>,
) {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            frame = to_client.recv() => match frame {
                Some(text) => {
                    if write.send(WsMessage::Text(text)).await.is_err() {
                        break;
                    }
                }
                // The test dropped its BackendConn handle: abrupt close.
                None => break,
            },
            msg = read.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = from_client.send(text);
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    if write.send(WsMessage::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Err(_)) => break,
                _ => {}
            },
            mode = &mut close_rx => {
                if let Ok(CloseMode::Graceful) = mode {
                    // SinkExt::close runs the WebSocket close handshake.
                    let _ = write.close().await;
                }
                break;
            }
        }
    }
}

pub(crate) fn test_config(endpoint: &str, reconnect_delay_ms: u64) -> Config {
    let mut config = Config::default();
    config.backend.endpoint = endpoint.to_string();
    config.backend.reconnect_delay_ms = reconnect_delay_ms;
    // Keepalive noise is irrelevant to most tests.
    config.backend.ping_interval_secs = 0;
    config
}

pub(crate) async fn wait_for_state(
    rx: &mut watch::Receiver<ConnectionState>,
    want: ConnectionState,
) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            if *rx.borrow() == want {
                return;
            }
            rx.changed().await.expect("state channel closed");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {:?}", want));
}
