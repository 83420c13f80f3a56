use heliograph_core::model::{RoomId, SignalPayload};

use crate::integration::{init_tracing, test_registry};
use crate::utils::TestMember;

#[tokio::test]
async fn first_member_gets_empty_snapshot() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("snapshot-room");

    let (_alice, snapshot) = TestMember::join(&registry, &room, "alice").await;

    assert!(snapshot.is_empty(), "first member should see nobody");
    assert!(registry.has_room(&room));
}

#[tokio::test]
async fn second_member_sees_first_and_triggers_member_joined() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("snapshot-room-2");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (_bob, snapshot) = TestMember::join(&registry, &room, "bob").await;

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].display_name, "alice");

    let joined = alice.expect().await;
    assert_eq!(joined.payload, SignalPayload::MemberJoined {});
    assert_eq!(joined.from.display_name, "bob");
}

#[tokio::test]
async fn snapshot_never_includes_the_joiner() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("snapshot-room-3");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;
    let (_carol, snapshot) = TestMember::join(&registry, &room, "carol").await;

    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|m| m.display_name != "carol"));

    // Alice heard about bob and carol, in join order; bob only about carol.
    let first = alice.expect().await;
    assert_eq!(first.payload, SignalPayload::MemberJoined {});
    assert_eq!(first.from.display_name, "bob");
    let second = alice.expect().await;
    assert_eq!(second.payload, SignalPayload::MemberJoined {});
    assert_eq!(second.from.display_name, "carol");

    let only = bob.expect().await;
    assert_eq!(only.from.display_name, "carol");

    alice.assert_silent();
    bob.assert_silent();
}
