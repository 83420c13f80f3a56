use std::time::Duration;

use futures::{SinkExt, StreamExt};
use heliograph_core::model::SignalMessage;
use tokio::sync::mpsc;
use tokio::time;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::SessionError;

/// The session's one signaling connection. Outbound messages are queued on
/// an unbounded channel and written by a dedicated task; inbound frames are
/// parsed and handed to the session actor. Either task ending means the
/// signaling channel is lost, which the actor observes as a closed inbound
/// stream.
#[derive(Clone)]
pub struct SignalingChannel {
    outbound: mpsc::UnboundedSender<SignalMessage>,
}

impl SignalingChannel {
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>), SessionError> {
        let (ws, _response) = time::timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| SessionError::ConnectTimeout(connect_timeout))??;
        debug!(url, "signaling socket connected");

        let (mut sink, mut stream) = ws.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<SignalMessage>();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("failed to serialize signal message: {e}");
                        continue;
                    }
                };
                if sink.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(msg) => {
                            if inbound_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("dropping malformed signal message: {e}"),
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            // inbound_tx drops here; the session sees the channel close.
        });

        Ok((
            Self {
                outbound: outbound_tx,
            },
            inbound_rx,
        ))
    }

    /// An in-process channel with no socket behind it: everything sent is
    /// handed straight to the returned receiver. Used by the test suite and
    /// by collaborators that embed the relay in the same process.
    pub fn loopback() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: outbound_tx,
            },
            outbound_rx,
        )
    }

    pub fn send(&self, message: SignalMessage) -> Result<(), SessionError> {
        self.outbound
            .send(message)
            .map_err(|_| SessionError::SignalingClosed)
    }
}
