use heliograph_core::model::{MediaKind, RoomId, SignalPayload};

use crate::integration::{init_tracing, test_registry};
use crate::utils::{TestMember, media_state};

/// media-state fans out to every other member, never back to the sender,
/// and consecutive updates from one sender arrive in order so the last
/// writer wins at each receiver.
#[tokio::test]
async fn media_state_fans_out_in_sender_order() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("media-room");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;
    let (mut carol, _) = TestMember::join(&registry, &room, "carol").await;
    alice.expect().await;
    alice.expect().await;
    bob.expect().await;

    alice
        .send(
            &registry,
            &room,
            media_state(&room, &alice.info, MediaKind::Audio, false),
        )
        .await;
    alice
        .send(
            &registry,
            &room,
            media_state(&room, &alice.info, MediaKind::Audio, true),
        )
        .await;

    for member in [&mut bob, &mut carol] {
        let mut last_enabled = None;
        for _ in 0..2 {
            match member.expect().await.payload {
                SignalPayload::MediaState {
                    track_kind: MediaKind::Audio,
                    enabled,
                } => last_enabled = Some(enabled),
                other => panic!("expected media-state, got {}", other.kind()),
            }
        }
        assert_eq!(last_enabled, Some(true), "last writer must win");
        member.assert_silent();
    }

    alice.assert_silent();
}
