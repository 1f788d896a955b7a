use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};
use zenith_core::{ClientMessage, Config, Error, Result, ServerMessage};

type WsSink = futures::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    WsMessage,
>;

/// Connectivity signal published by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// The write half of the active connection, tagged with the generation of
/// the attempt that installed it. Teardown checks the tag so a stale
/// connection can never clear a newer connection's sink.
struct SinkSlot {
    generation: u64,
    sink: WsSink,
}

struct Shared {
    endpoint: String,
    reconnect_delay: Duration,
    ping_interval: Option<Duration>,
    state_tx: watch::Sender<ConnectionState>,
    inbound_tx: mpsc::Sender<ServerMessage>,
    sink: Mutex<Option<SinkSlot>>,
    generation: AtomicU64,
}

/// Owns the single logical connection to the agent backend.
///
/// One background task dials the configured endpoint, forwards parsed frames
/// to the consumer in wire-arrival order, and on any disconnect (transport
/// error and graceful close identically) retries after a fixed delay until
/// [`Transport::close`] or drop. Scoped: dropping the handle aborts the loop,
/// so no reconnect timer outlives the owning UI surface.
pub struct Transport {
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Transport {
    pub fn new(config: &Config, inbound_tx: mpsc::Sender<ServerMessage>) -> Self {
        let backend = &config.backend;
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, _) = broadcast::channel(1);
        let ping_interval = match backend.ping_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            shared: Arc::new(Shared {
                endpoint: backend.endpoint.clone(),
                reconnect_delay: Duration::from_millis(backend.reconnect_delay_ms),
                ping_interval,
                state_tx,
                inbound_tx,
                sink: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            shutdown_tx,
            handle: std::sync::Mutex::new(None),
        }
    }

    /// Start the connection loop. Idempotent: a second call while the loop
    /// is running is a no-op.
    pub fn connect(&self) {
        let mut handle = self.handle.lock().expect("transport handle lock poisoned");
        if handle.is_some() {
            return;
        }
        let shared = self.shared.clone();
        let shutdown = self.shutdown_tx.subscribe();
        *handle = Some(tokio::spawn(run_loop(shared, shutdown)));
    }

    /// Subscribe to the connectivity signal.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Serialize and write one frame. Best effort: when no connection is
    /// open the frame is dropped and `false` is returned; nothing is queued.
    pub async fn send(&self, message: &ClientMessage) -> bool {
        self.shared.send(message).await
    }

    /// Stop the connection loop and release the socket.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }
}

async fn run_loop(shared: Arc<Shared>, mut shutdown: broadcast::Receiver<()>) {
    info!(endpoint = %shared.endpoint, "Transport starting");

    loop {
        tokio::select! {
            result = shared.connect_and_run() => {
                match result {
                    Ok(()) => info!("Backend connection closed"),
                    Err(e) => warn!(error = %e, "Backend connection failed"),
                }
                shared.state_tx.send_replace(ConnectionState::Disconnected);
                // Graceful close and transport error take the same
                // fixed-delay retry path.
                tokio::select! {
                    _ = tokio::time::sleep(shared.reconnect_delay) => {}
                    _ = shutdown.recv() => break,
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    shared.state_tx.send_replace(ConnectionState::Disconnected);
    shared.sink.lock().await.take();
    info!("Transport stopped");
}

impl Shared {
    async fn connect_and_run(&self) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state_tx.send_replace(ConnectionState::Connecting);

        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::Transport(format!("Invalid endpoint: {}", e)))?;
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::Transport(format!("WebSocket connection failed: {}", e)))?;

        info!(generation, "Connected to agent backend");
        self.state_tx.send_replace(ConnectionState::Connected);

        let (write, mut read) = ws_stream.split();
        *self.sink.lock().await = Some(SinkSlot {
            generation,
            sink: write,
        });

        let mut ping = self.ping_interval.map(tokio::time::interval);
        if let Some(interval) = ping.as_mut() {
            // First tick of a fresh interval fires immediately; push it out
            // one full period past the handshake.
            interval.reset();
        }

        let result = loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(msg) = ServerMessage::parse(&text) {
                            if self.inbound_tx.send(msg).await.is_err() {
                                debug!("Frame consumer gone, closing connection");
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        self.pong(generation, data).await;
                    }
                    Some(Ok(WsMessage::Close(_))) => break Ok(()),
                    Some(Err(e)) => {
                        break Err(Error::Transport(format!("WebSocket error: {}", e)))
                    }
                    None => break Ok(()),
                    _ => {}
                },
                _ = ping_tick(&mut ping) => {
                    if !self.send(&ClientMessage::Ping).await {
                        break Err(Error::Transport("Keepalive write failed".to_string()));
                    }
                }
            }
        };

        self.release_sink(generation).await;
        result
    }

    async fn send(&self, message: &ClientMessage) -> bool {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize outbound frame");
                return false;
            }
        };

        let mut guard = self.sink.lock().await;
        let Some(slot) = guard.as_mut() else {
            debug!("No active connection, dropping outbound frame");
            return false;
        };
        match slot.sink.send(WsMessage::Text(json)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Write failed, dropping outbound frame");
                false
            }
        }
    }

    async fn pong(&self, generation: u64, data: Vec<u8>) {
        let mut guard = self.sink.lock().await;
        if let Some(slot) = guard.as_mut() {
            if slot.generation == generation {
                if let Err(e) = slot.sink.send(WsMessage::Pong(data)).await {
                    warn!(error = %e, "Failed to send pong");
                }
            }
        }
    }

    /// Clear the shared sink, but only if it still belongs to `generation`;
    /// a newer connection may already have installed its own.
    async fn release_sink(&self, generation: u64) {
        let mut guard = self.sink.lock().await;
        if guard.as_ref().map(|slot| slot.generation) == Some(generation) {
            *guard = None;
        }
    }
}

async fn ping_tick(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
