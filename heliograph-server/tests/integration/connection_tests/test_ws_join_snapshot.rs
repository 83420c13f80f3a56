use futures::{SinkExt, StreamExt};
use heliograph_core::model::{
    ParticipantId, ParticipantInfo, RoomId, SignalMessage, SignalPayload,
};
use heliograph_server::{RelayConfig, RoomRegistry, router};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::integration::init_tracing;

/// Full socket-level handshake: join over a real WebSocket, receive the
/// snapshot, and observe a peer's member-joined.
#[tokio::test]
async fn ws_join_receives_snapshot_and_member_joined() {
    init_tracing();
    let registry = RoomRegistry::new(RelayConfig::default());
    let app = router(registry.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = format!("ws://{addr}/ws");
    let room = RoomId::from("ws-room");

    let alice = ParticipantInfo::new(ParticipantId::new(), "alice");
    let (mut alice_ws, _) = connect_async(url.as_str()).await.expect("alice connect");
    let join = SignalMessage::new(room.clone(), alice.clone(), SignalPayload::Join {});
    alice_ws
        .send(Message::Text(serde_json::to_string(&join).unwrap()))
        .await
        .unwrap();

    let snapshot = next_signal(&mut alice_ws).await;
    match snapshot.payload {
        SignalPayload::MembershipSnapshot { members } => assert!(members.is_empty()),
        other => panic!("expected snapshot, got {}", other.kind()),
    }

    let bob = ParticipantInfo::new(ParticipantId::new(), "bob");
    let (mut bob_ws, _) = connect_async(url.as_str()).await.expect("bob connect");
    let join = SignalMessage::new(room.clone(), bob.clone(), SignalPayload::Join {});
    bob_ws
        .send(Message::Text(serde_json::to_string(&join).unwrap()))
        .await
        .unwrap();

    let snapshot = next_signal(&mut bob_ws).await;
    match snapshot.payload {
        SignalPayload::MembershipSnapshot { members } => {
            assert_eq!(members.len(), 1);
            assert_eq!(members[0].participant_id, alice.participant_id);
        }
        other => panic!("expected snapshot, got {}", other.kind()),
    }

    let joined = next_signal(&mut alice_ws).await;
    assert_eq!(joined.payload, SignalPayload::MemberJoined {});
    assert_eq!(joined.from.participant_id, bob.participant_id);
}

async fn next_signal<S>(ws: &mut S) -> SignalMessage
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(std::time::Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("malformed signal");
        }
    }
}
