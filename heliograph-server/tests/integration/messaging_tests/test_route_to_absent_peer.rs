use heliograph_core::model::{MediaKind, ParticipantId, RoomId, SignalPayload};

use crate::integration::{init_tracing, test_registry};
use crate::utils::{TestMember, media_state, offer};

/// A targeted message for a peer that already left is dropped silently:
/// no error, no delivery, and the sender is unaffected.
#[tokio::test]
async fn message_for_departed_peer_is_dropped() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("absent-room");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;
    alice.expect().await; // member-joined(bob)

    let ghost = ParticipantId::new();
    alice
        .send(&registry, &room, offer(&room, &alice.info, &ghost))
        .await;

    alice.assert_silent();
    bob.assert_silent();

    // The sender is still a member in good standing.
    alice
        .send(
            &registry,
            &room,
            media_state(&room, &alice.info, MediaKind::Audio, false),
        )
        .await;
    let broadcast = bob.expect().await;
    assert!(matches!(
        broadcast.payload,
        SignalPayload::MediaState { enabled: false, .. }
    ));
}
