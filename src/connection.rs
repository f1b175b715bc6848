use std::sync::Arc;

use anyhow::{Context, Result};
use futures::prelude::*;
use log::{debug, info, warn};
use tokio::sync::{broadcast, mpsc};
use warp::ws::{Message, WebSocket};

use crate::room::{ConnectionId, Payload, Registry};

/// One client's session in a room. Lives from upgrade until the socket is
/// gone and leaves the room exactly once, when dropped.
pub struct Connection {
    id: ConnectionId,
    room_id: String,
    registry: Arc<Registry>,
    inbox: mpsc::UnboundedReceiver<Payload>,
}

impl Connection {
    /// Joins `room_id`. The outbox is registered before any frame is read,
    /// so the connection sees every broadcast sent after this returns.
    pub fn join(registry: Arc<Registry>, room_id: String) -> Self {
        let id = ConnectionId::new();
        let (outbox, inbox) = mpsc::unbounded_channel();
        registry.join(&room_id, id, outbox);
        Self {
            id,
            room_id,
            registry,
            inbox,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Relays frames until the peer closes, the transport fails, or
    /// `shutdown` fires.
    pub async fn run(mut self, socket: WebSocket, mut shutdown: broadcast::Receiver<()>) {
        match self.handle_connection(socket, &mut shutdown).await {
            Ok(()) => debug!("connection {} in room {} closed", self.id, self.room_id),
            Err(e) => warn!("connection {} terminated because of {e:#}", self.id),
        }
    }

    async fn handle_connection(
        &mut self,
        mut socket: WebSocket,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                result = socket.next() => {
                    match result {
                        None => break,
                        Some(message) => {
                            let message = message.context("failed to read frame")?;
                            if message.is_close() {
                                break;
                            }
                            self.handle_message(message);
                        }
                    }
                }
                Some(payload) = self.inbox.recv() => {
                    socket
                        .send(Message::text(&*payload))
                        .await
                        .context("failed to deliver frame")?;
                }
                _ = shutdown.recv() => {
                    info!("closing connection {} for shutdown", self.id);
                    socket.close().await.ok();
                    break;
                }
            }
        }
        Ok(())
    }

    fn handle_message(&self, message: Message) {
        match message.to_str() {
            Ok(text) => {
                self.registry
                    .broadcast(&self.room_id, &Payload::from(text), self.id);
            }
            Err(()) => {
                if message.is_binary() {
                    debug!("ignoring binary frame from connection {}", self.id);
                }
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.registry.leave(&self.room_id, self.id);
    }
}
