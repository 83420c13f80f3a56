use heliograph_core::model::{RoomId, SignalPayload};
use heliograph_server::{RelayConfig, RoomRegistry};

use crate::integration::init_tracing;
use crate::utils::{TestMember, heartbeat_reply};

/// Relies on the paused tokio clock: time auto-advances to the heartbeat
/// interval whenever the test is otherwise idle, so the 30s probes fire
/// instantly and deterministically.
#[tokio::test(start_paused = true)]
async fn silent_member_is_evicted_after_one_missed_interval() {
    init_tracing();
    let registry = RoomRegistry::new(RelayConfig::default());
    let room = RoomId::from("heartbeat-room");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;

    // alice's member-joined(bob).
    assert_eq!(alice.inbox.recv().await.unwrap().payload, SignalPayload::MemberJoined {});

    // First tick: both get probed.
    let probe = alice.inbox.recv().await.unwrap();
    assert_eq!(probe.payload, SignalPayload::Heartbeat {});
    assert!(probe.from.participant_id.is_relay());
    assert_eq!(bob.inbox.recv().await.unwrap().payload, SignalPayload::Heartbeat {});

    // Only alice answers.
    alice
        .send(&registry, &room, heartbeat_reply(&room, &alice.info))
        .await;

    // Second tick: bob missed his pong and is removed; alice survives and
    // hears about it, then gets the next probe.
    let left = alice.inbox.recv().await.unwrap();
    assert_eq!(left.payload, SignalPayload::MemberLeft {});
    assert_eq!(left.from.participant_id, bob.info.participant_id);

    assert_eq!(alice.inbox.recv().await.unwrap().payload, SignalPayload::Heartbeat {});

    // bob's outbox is gone.
    assert!(bob.wait_disconnected().await);
}
