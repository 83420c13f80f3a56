use heliograph_core::model::{RoomId, SignalPayload};

use crate::integration::{init_tracing, test_registry};
use crate::utils::{TestMember, answer, candidate, offer};

/// A targeted message reaches its target and nobody else, whatever the
/// room size.
#[tokio::test]
async fn offer_reaches_only_its_target() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("routing-room");

    let (mut alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;
    let (mut carol, _) = TestMember::join(&registry, &room, "carol").await;

    // Drain the join chatter.
    alice.expect().await; // member-joined(bob)
    alice.expect().await; // member-joined(carol)
    bob.expect().await; // member-joined(carol)

    alice
        .send(&registry, &room, offer(&room, &alice.info, &bob.info.participant_id))
        .await;

    let routed = bob.expect().await;
    assert!(matches!(routed.payload, SignalPayload::Offer { .. }));
    assert_eq!(routed.from.participant_id, alice.info.participant_id);
    assert_eq!(
        routed.target_participant_id.as_ref(),
        Some(&bob.info.participant_id)
    );

    carol.assert_silent();
    alice.assert_silent();

    // The answer goes back to alice alone.
    bob.send(&registry, &room, answer(&room, &bob.info, &alice.info.participant_id))
        .await;

    let routed = alice.expect().await;
    assert!(matches!(routed.payload, SignalPayload::Answer { .. }));
    carol.assert_silent();
}

/// Candidates from one sender to one target arrive in send order.
#[tokio::test]
async fn candidates_keep_sender_order() {
    init_tracing();
    let registry = test_registry();
    let room = RoomId::from("candidate-order-room");

    let (alice, _) = TestMember::join(&registry, &room, "alice").await;
    let (mut bob, _) = TestMember::join(&registry, &room, "bob").await;

    for n in 0..8 {
        alice
            .send(
                &registry,
                &room,
                candidate(&room, &alice.info, &bob.info.participant_id, n),
            )
            .await;
    }

    for n in 0..8 {
        let msg = bob.expect().await;
        match msg.payload {
            SignalPayload::IceCandidate { candidate } => {
                assert!(
                    candidate.candidate.starts_with(&format!("candidate:{n} ")),
                    "candidate {n} out of order: {}",
                    candidate.candidate
                );
            }
            other => panic!("expected ice-candidate, got {}", other.kind()),
        }
    }
}
