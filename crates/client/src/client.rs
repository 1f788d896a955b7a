use tokio::sync::{mpsc, watch};
use tracing::debug;
use zenith_core::{ClientMessage, Config, ServerMessage};

use crate::session::Session;
use crate::transport::{ConnectionState, Transport};
use crate::view::ViewModel;

/// What the event pump surfaced: either the session changed because a frame
/// was folded in, or the connectivity signal moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    Updated,
    Connectivity(ConnectionState),
}

/// One UI surface's session client: the transport, the reducer, and the
/// single-threaded event pump between them.
///
/// All reducer transitions, inbound frames and submissions alike, are serialized
/// through `&mut self`, so each frame is fully folded into the session before
/// the next one is looked at, in wire-arrival order.
pub struct SessionClient {
    transport: Transport,
    session: Session,
    inbound_rx: mpsc::Receiver<ServerMessage>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl SessionClient {
    pub fn new(config: &Config) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(100);
        let transport = Transport::new(config, inbound_tx);
        let state_rx = transport.state();
        Self {
            transport,
            session: Session::new(),
            inbound_rx,
            state_rx,
        }
    }

    pub fn connect(&self) {
        self.transport.connect();
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Project the current display state.
    pub fn view(&self) -> ViewModel {
        ViewModel::project(&self.session, self.connection_state())
    }

    /// Submit a new intent. Gated: ignored unless connected, and blank
    /// intents never reach the transport. Clears the previous task's
    /// history, result, and error *before* the outbound frame is sent.
    pub async fn submit(&mut self, intent: &str) -> bool {
        let intent = intent.trim();
        if intent.is_empty() {
            debug!("Blank intent, nothing to submit");
            return false;
        }
        if self.connection_state() != ConnectionState::Connected {
            debug!("Not connected, ignoring submission");
            return false;
        }

        self.session.reset();
        self.transport
            .send(&ClientMessage::Intent {
                payload: intent.to_string(),
            })
            .await
    }

    /// Ask the backend to cancel the running task. Best effort: the backend
    /// acknowledges but keeps working; tracking simply stops at the next
    /// submission.
    pub async fn cancel(&self) -> bool {
        if self.connection_state() != ConnectionState::Connected {
            return false;
        }
        self.transport.send(&ClientMessage::Cancel).await
    }

    /// Wait for the next frame or connectivity change and fold it in.
    /// Returns `None` once the transport is gone for good.
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        tokio::select! {
            frame = self.inbound_rx.recv() => match frame {
                Some(frame) => {
                    self.session.apply(frame);
                    Some(ClientEvent::Updated)
                }
                None => None,
            },
            changed = self.state_rx.changed() => match changed {
                Ok(()) => Some(ClientEvent::Connectivity(*self.state_rx.borrow_and_update())),
                Err(_) => None,
            },
        }
    }

    /// Block until the transport reports Connected, up to `timeout`.
    pub async fn wait_until_connected(&mut self, timeout: std::time::Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while *self.state_rx.borrow_and_update() != ConnectionState::Connected {
                if self.state_rx.changed().await.is_err() {
                    return false;
                }
            }
            true
        })
        .await
        .unwrap_or(false)
    }

    pub fn close(&self) {
        self.transport.close();
    }
}
