use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use heliograph_core::model::{ParticipantInfo, RoomId, SignalMessage, SignalPayload};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::room::{RoomCommand, RoomRegistry};

#[derive(Debug, Error)]
enum HandshakeError {
    #[error("socket closed before joining")]
    SocketClosed,
    #[error("malformed signal message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected join, got {0}")]
    NotJoin(&'static str),
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<RoomRegistry>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

async fn handle_socket(socket: WebSocket, registry: RoomRegistry) {
    let (mut sender, mut receiver) = socket.split();

    // The first frame must announce the room; anything else is fatal to
    // this socket and touches nothing shared.
    let (room_id, info) = match await_join(&mut receiver).await {
        Ok(join) => join,
        Err(e) => {
            warn!("rejecting signaling socket: {e}");
            return;
        }
    };
    let participant_id = info.participant_id.clone();
    info!(room = %room_id, participant = %participant_id, "signaling socket joined");

    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<SignalMessage>();
    if !registry
        .submit(
            &room_id,
            RoomCommand::Join {
                info,
                outbox: outbox_tx,
            },
        )
        .await
    {
        warn!(room = %room_id, "room unavailable, dropping socket");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!("failed to serialize signal message: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let registry = registry.clone();
        let room_id = room_id.clone();
        let participant_id = participant_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => {
                            if matches!(signal.payload, SignalPayload::Join {}) {
                                warn!(
                                    room = %room_id,
                                    participant = %participant_id,
                                    "duplicate join on one socket, closing"
                                );
                                break;
                            }
                            let cmd = RoomCommand::Route {
                                sender: participant_id.clone(),
                                message: signal,
                            };
                            if !registry.submit(&room_id, cmd).await {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(
                                room = %room_id,
                                participant = %participant_id,
                                "malformed signal message, closing: {e}"
                            );
                            break;
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = registry
                .submit(
                    &room_id,
                    RoomCommand::Leave {
                        participant_id: participant_id.clone(),
                    },
                )
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!(room = %room_id, participant = %participant_id, "signaling socket closed");
}

async fn await_join(
    receiver: &mut SplitStream<WebSocket>,
) -> Result<(RoomId, ParticipantInfo), HandshakeError> {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let signal: SignalMessage = serde_json::from_str(&text)?;
                return match signal.payload {
                    SignalPayload::Join {} => Ok((signal.room_id, signal.from)),
                    other => Err(HandshakeError::NotJoin(other.kind())),
                };
            }
            Message::Close(_) => break,
            // Ping/pong and binary noise before the join are tolerated.
            _ => {}
        }
    }
    Err(HandshakeError::SocketClosed)
}
