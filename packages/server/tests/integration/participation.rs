use std::sync::Arc;

use futures::future::join_all;
use server::domain::ContentKind;
use server::services::{CreateRequest, ServiceError};
use uuid::Uuid;

use crate::common::{Harness, event_fields, user};

async fn create_event(h: &Harness, capacity: i32) -> Uuid {
    h.coordinator
        .create(
            Some(&user("host")),
            ContentKind::Event,
            CreateRequest {
                fields: event_fields("Campfire night", capacity),
                ..Default::default()
            },
        )
        .await
        .expect("create event failed")
        .record
        .id
}

#[tokio::test]
async fn second_user_is_turned_away_from_full_event() {
    let h = Harness::new();
    let event_id = create_event(&h, 1).await;

    let entry = h.ledger.join(Some(&user("user-1")), event_id).await.unwrap();
    assert_eq!(entry.user_id, "user-1");
    assert_eq!(entry.event_id, event_id);

    let err = h
        .ledger
        .join(Some(&user("user-2")), event_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CapacityExceeded { capacity: 1 }));

    let roster = h.ledger.roster(event_id).await.unwrap();
    assert_eq!(roster.participant_count, 1);
    assert_eq!(roster.entries[0].user_id, "user-1");
}

#[tokio::test]
async fn joining_twice_is_rejected() {
    let h = Harness::new();
    let event_id = create_event(&h, 5).await;

    h.ledger.join(Some(&user("user-1")), event_id).await.unwrap();
    let err = h
        .ledger
        .join(Some(&user("user-1")), event_id)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::AlreadyJoined));
    assert_eq!(h.ledger.roster(event_id).await.unwrap().participant_count, 1);
}

#[tokio::test]
async fn full_check_comes_before_duplicate_check() {
    let h = Harness::new();
    let event_id = create_event(&h, 1).await;

    h.ledger.join(Some(&user("user-1")), event_id).await.unwrap();
    let err = h
        .ledger
        .join(Some(&user("user-1")), event_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CapacityExceeded { .. }));
}

const ROUNDS: usize = 10;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_joins_never_exceed_capacity() {
    let h = Harness::new();

    for round in 0..ROUNDS {
        let event_id = create_event(&h, 5).await;

        let handles = (0..20).map(|i| {
            let ledger = Arc::clone(&h.ledger);
            tokio::spawn(
                async move { ledger.join(Some(&user(&format!("user-{i}"))), event_id).await },
            )
        });
        let results: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.expect("join task panicked"))
            .collect();

        let joined = results.iter().filter(|r| r.is_ok()).count();
        let full = results
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::CapacityExceeded { capacity: 5 })))
            .count();
        assert_eq!(joined, 5, "round {round}");
        assert_eq!(full, 15, "round {round}");
        assert_eq!(h.ledger.roster(event_id).await.unwrap().participant_count, 5);
        assert_eq!(h.repo.inner.participant_count(event_id), 5);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_duplicate_joins_insert_once() {
    let h = Harness::new();

    for round in 0..ROUNDS {
        let event_id = create_event(&h, 0).await;

        let handles = (0..10).map(|_| {
            let ledger = Arc::clone(&h.ledger);
            tokio::spawn(async move { ledger.join(Some(&user("user-1")), event_id).await })
        });
        let results: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.expect("join task panicked"))
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "round {round}");
        assert!(
            results
                .iter()
                .filter(|r| r.is_err())
                .all(|r| matches!(r, Err(ServiceError::AlreadyJoined)))
        );
        assert_eq!(h.repo.inner.participant_count(event_id), 1);
    }
}

#[tokio::test]
async fn zero_capacity_is_unbounded() {
    let h = Harness::new();
    let event_id = create_event(&h, 0).await;

    for i in 0..25 {
        h.ledger
            .join(Some(&user(&format!("user-{i}"))), event_id)
            .await
            .unwrap();
    }
    let roster = h.ledger.roster(event_id).await.unwrap();
    assert_eq!(roster.participant_count, 25);
    assert_eq!(roster.capacity, Some(0));
}

#[tokio::test]
async fn join_requires_identity_and_event() {
    let h = Harness::new();
    let event_id = create_event(&h, 3).await;

    assert!(matches!(
        h.ledger.join(None, event_id).await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        h.ledger.join(Some(&user("user-1")), Uuid::now_v7()).await,
        Err(ServiceError::NotFound("Event"))
    ));
}

#[tokio::test]
async fn activities_cannot_be_joined() {
    let h = Harness::new();
    let activity = h
        .coordinator
        .create(
            Some(&user("host")),
            ContentKind::Activity,
            CreateRequest {
                fields: crate::common::fields("Sunrise hike"),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .record;

    assert!(matches!(
        h.ledger.join(Some(&user("user-1")), activity.id).await,
        Err(ServiceError::NotFound("Event"))
    ));
}

#[tokio::test]
async fn leave_frees_the_seat() {
    let h = Harness::new();
    let event_id = create_event(&h, 1).await;

    h.ledger.join(Some(&user("user-1")), event_id).await.unwrap();
    h.ledger.leave(Some(&user("user-1")), event_id).await.unwrap();
    h.ledger.join(Some(&user("user-2")), event_id).await.unwrap();

    let roster = h.ledger.roster(event_id).await.unwrap();
    assert_eq!(roster.participant_count, 1);
    assert_eq!(roster.entries[0].user_id, "user-2");
}

#[tokio::test]
async fn leaving_without_a_seat_is_rejected() {
    let h = Harness::new();
    let event_id = create_event(&h, 3).await;

    assert!(matches!(
        h.ledger.leave(Some(&user("user-1")), event_id).await,
        Err(ServiceError::NotParticipating)
    ));

    h.ledger.join(Some(&user("user-1")), event_id).await.unwrap();
    h.ledger.leave(Some(&user("user-1")), event_id).await.unwrap();
    assert!(matches!(
        h.ledger.leave(Some(&user("user-1")), event_id).await,
        Err(ServiceError::NotParticipating)
    ));
}

#[tokio::test]
async fn leave_requires_identity_and_event() {
    let h = Harness::new();
    let event_id = create_event(&h, 3).await;

    assert!(matches!(
        h.ledger.leave(None, event_id).await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        h.ledger.leave(Some(&user("user-1")), Uuid::now_v7()).await,
        Err(ServiceError::NotFound("Event"))
    ));
}

#[tokio::test]
async fn roster_is_ordered_by_join_time() {
    let h = Harness::new();
    let event_id = create_event(&h, 0).await;

    for name in ["carol", "alice", "bob"] {
        h.ledger.join(Some(&user(name)), event_id).await.unwrap();
    }
    let roster = h.ledger.roster(event_id).await.unwrap();
    let order: Vec<_> = roster.entries.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(order, ["carol", "alice", "bob"]);
}

#[tokio::test]
async fn deleting_event_drops_its_roster() {
    let h = Harness::new();
    let event_id = create_event(&h, 3).await;
    h.ledger.join(Some(&user("user-1")), event_id).await.unwrap();

    h.coordinator
        .delete(Some(&user("host")), ContentKind::Event, event_id)
        .await
        .unwrap();

    assert!(matches!(
        h.ledger.roster(event_id).await,
        Err(ServiceError::NotFound("Event"))
    ));
    assert_eq!(h.repo.inner.participant_count(event_id), 0);
}

#[tokio::test]
async fn lowering_capacity_keeps_existing_seats() {
    let h = Harness::new();
    let event_id = create_event(&h, 3).await;
    for name in ["a", "b", "c"] {
        h.ledger.join(Some(&user(name)), event_id).await.unwrap();
    }

    h.coordinator
        .update(
            Some(&user("host")),
            ContentKind::Event,
            event_id,
            server::services::UpdateRequest {
                patch: server::domain::ContentPatch {
                    capacity: Some(Some(1)),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let roster = h.ledger.roster(event_id).await.unwrap();
    assert_eq!(roster.participant_count, 3);
    assert!(matches!(
        h.ledger.join(Some(&user("d")), event_id).await,
        Err(ServiceError::CapacityExceeded { capacity: 1 })
    ));
}
