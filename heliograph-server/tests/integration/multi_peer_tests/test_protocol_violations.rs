use heliograph_core::model::{ParticipantInfo, RoomId, SignalMessage, SignalPayload};

use crate::integration::{init_tracing, test_registry};
use crate::utils::{TestMember, offer};

/// A client has no business sending relay-originated kinds; doing so is
/// fatal to that socket only.
#[tokio::test]
async fn relay_only_kind_disconnects_the_sender() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("violation-room");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;
    alice.expect().await; // member-joined(bob)

    bob.send(
        &registry,
        &room,
        SignalMessage::new(room.clone(), bob.info.clone(), SignalPayload::RoomClosed {}),
    )
    .await;

    // bob is gone; alice hears a member-left and stays connected.
    let left = alice.expect().await;
    assert_eq!(left.payload, SignalPayload::MemberLeft {});
    assert_eq!(left.from.participant_id, bob.info.participant_id);
    assert!(bob.wait_disconnected().await);
    alice.assert_silent();
}

/// The envelope identity must match the socket's; spoofing is fatal to the
/// spoofer.
#[tokio::test]
async fn spoofed_sender_identity_disconnects_the_sender() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("spoof-room");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;
    let (mut carol, _) = TestMember::join(&registry, &room, "carol").await;
    alice.expect().await;
    alice.expect().await;
    bob.expect().await;

    // carol forges an offer that claims to come from alice.
    let forged = offer(&room, &alice.info, &bob.info.participant_id);
    carol.send(&registry, &room, forged).await;

    assert!(carol.wait_disconnected().await);

    // The forged offer was never delivered.
    let left = bob.expect().await;
    assert_eq!(left.payload, SignalPayload::MemberLeft {});
    assert_eq!(left.from.participant_id, carol.info.participant_id);
    bob.assert_silent();

    let left = alice.expect().await;
    assert_eq!(left.payload, SignalPayload::MemberLeft {});
    alice.assert_silent();

    // The room itself is unaffected.
    let (_dave, snapshot) = TestMember::join(&registry, &room, "dave").await;
    assert_eq!(snapshot.len(), 2);
}
