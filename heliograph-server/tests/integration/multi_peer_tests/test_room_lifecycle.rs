use std::time::Duration;

use heliograph_core::model::{RoomId, SignalPayload};

use crate::integration::{init_tracing, test_registry};
use crate::utils::TestMember;

/// Rooms exist only while they have members.
#[tokio::test]
async fn empty_room_is_dropped_from_the_registry() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("lifecycle-room");

    let (alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (bob, _) = TestMember::join(&registry, &room, "bob").await;
    assert!(registry.has_room(&room));

    alice.leave(&registry, &room).await;
    bob.leave(&registry, &room).await;

    assert!(
        wait_until(|| !registry.has_room(&room)).await,
        "room should remove itself once empty"
    );
    assert_eq!(registry.room_count(), 0);
}

/// Closing a room notifies every member and then drops their sockets.
#[tokio::test]
async fn close_room_notifies_members_and_shuts_down() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("close-room");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;
    alice.expect().await; // member-joined(bob)

    registry.close_room(&room).await;

    for member in [&mut alice, &mut bob] {
        let closed = member.expect().await;
        assert_eq!(closed.payload, SignalPayload::RoomClosed {});
        assert!(closed.from.participant_id.is_relay());
        assert!(member.wait_disconnected().await);
    }

    assert!(
        wait_until(|| !registry.has_room(&room)).await,
        "closed room should leave the registry"
    );
}

/// A fresh join after the room died spins up a new room transparently.
#[tokio::test]
async fn room_is_recreated_after_going_empty() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("phoenix-room");

    let (alice, _) = TestMember::join(&registry, &room, "alice").await;
    alice.leave(&registry, &room).await;
    assert!(wait_until(|| !registry.has_room(&room)).await);

    let (_bob, snapshot) = TestMember::join(&registry, &room, "bob").await;
    assert!(snapshot.is_empty());
    assert!(registry.has_room(&room));
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
