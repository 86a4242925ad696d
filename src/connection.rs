use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::errors::{NetworkError, NetworkResult};
use crate::protocol::ServerMessage;

/// Outbound half of a client connection.
///
/// Sessions hold connections as `Arc<dyn Connection>` and never call into
/// them while a state lock is held.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn send(&self, message: &ServerMessage) -> NetworkResult<()>;

    /// Closes the connection. Later sends fail with `ConnectionClosed`.
    async fn close(&self);
}

/// In-process connection that delivers messages to an unbounded channel.
pub struct ChannelConnection {
    sender: Mutex<Option<mpsc::UnboundedSender<ServerMessage>>>,
}

impl ChannelConnection {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ChannelConnection {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    pub async fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .await
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    async fn send(&self, message: &ServerMessage) -> NetworkResult<()> {
        let sender = self.sender.lock().await;
        let tx = sender.as_ref().ok_or(NetworkError::ConnectionClosed)?;
        tx.send(message.clone())
            .map_err(|e| NetworkError::send_failed(e.to_string()))
    }

    async fn close(&self) {
        self.sender.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_connection_delivers_until_closed() {
        let (conn, mut rx) = ChannelConnection::new();
        let msg = ServerMessage::error("s", "boom");

        conn.send(&msg).await.unwrap();
        assert_eq!(rx.recv().await, Some(msg.clone()));

        conn.close().await;
        assert!(conn.is_closed().await);
        assert_eq!(conn.send(&msg).await, Err(NetworkError::ConnectionClosed));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_send_fails_when_receiver_dropped() {
        let (conn, rx) = ChannelConnection::new();
        drop(rx);
        assert!(matches!(
            conn.send(&ServerMessage::error("s", "x")).await,
            Err(NetworkError::SendFailed { .. })
        ));
    }
}
