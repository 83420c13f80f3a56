use heliograph_core::model::{ParticipantId, ParticipantInfo, RoomId, SignalPayload};

use crate::integration::{init_tracing, test_registry};
use crate::utils::{TestMember, offer};

/// A second join with the same participant id must replace the earlier
/// socket and orphan it; the room keeps exactly one live socket per member.
#[tokio::test]
async fn rejoin_orphans_the_previous_socket() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("rejoin-room");
    let identity = ParticipantInfo::new(ParticipantId::new(), "alice");

    let (mut first, _) = TestMember::join_as(&registry, &room, identity.clone()).await;
    let (mut second, snapshot) = TestMember::join_as(&registry, &room, identity.clone()).await;

    // The replacement never sees itself in the snapshot.
    assert!(snapshot.is_empty());

    // The first socket's outbox was dropped by the relay.
    assert!(first.wait_disconnected().await, "old socket should be orphaned");

    // Traffic lands on the surviving socket only.
    let (bob, _) = TestMember::join(&registry, &room, "bob").await;
    bob.send(&registry, &room, offer(&room, &bob.info, &identity.participant_id))
        .await;

    // member-joined(bob), then the offer.
    assert_eq!(second.expect().await.payload, SignalPayload::MemberJoined {});
    let routed = second.expect().await;
    assert!(matches!(routed.payload, SignalPayload::Offer { .. }));
    assert_eq!(routed.from.participant_id, bob.info.participant_id);
}
