use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;
use tracing::{info, warn};

/// Event channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// `connect` was called on a channel that already has a live connection.
    #[error("event channel already connected")]
    AlreadyConnected,

    /// Underlying connection failure. Surfaced through the `error` lifecycle
    /// kind; the channel does not auto-reconnect.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Bidirectional framed connection owned exclusively by one event channel.
#[async_trait]
pub trait Transport: Send {
    /// Transmit one frame.
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), ChannelError>;

    /// Receive the next inbound frame. `None` means the connection closed.
    async fn recv(&mut self) -> Option<Vec<u8>>;

    /// Close the connection. Idempotent.
    async fn close(&mut self);
}

/// NATS-backed transport addressed by a session identifier.
///
/// Inbound push frames arrive on `session.{id}.events`; outbound frames are
/// published to `session.{id}.client`.
pub struct NatsTransport {
    client: async_nats::Client,
    subscriber: Option<async_nats::Subscriber>,
    outbound_subject: String,
}

impl NatsTransport {
    pub async fn connect(url: &str, session_id: &str) -> Result<Self, ChannelError> {
        info!(url, session_id, "connecting to NATS");

        let client = async_nats::connect(url)
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let inbound_subject = format!("session.{session_id}.events");
        let subscriber = client
            .subscribe(inbound_subject.clone())
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        info!(subject = inbound_subject, "subscribed to session events");

        Ok(Self {
            client,
            subscriber: Some(subscriber),
            outbound_subject: format!("session.{session_id}.client"),
        })
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), ChannelError> {
        if self.subscriber.is_none() {
            return Err(ChannelError::Transport("connection closed".to_string()));
        }

        self.client
            .publish(self.outbound_subject.clone(), frame.into())
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        let subscriber = self.subscriber.as_mut()?;
        subscriber.next().await.map(|msg| msg.payload.to_vec())
    }

    async fn close(&mut self) {
        if let Some(mut subscriber) = self.subscriber.take() {
            if let Err(e) = subscriber.unsubscribe().await {
                warn!("NATS unsubscribe failed: {e}");
            }
        }
    }
}
