//! Submission through assignment, fan-out and enrichment

use std::sync::Arc;
use std::time::Duration;

use siren_dispatch::SubmitAlert;
use siren_domain::{AlertStatus, MedicalProfile};
use siren_gateway::{EnrichmentGateway, MedicalContext, MemoryProfileStore};
use siren_stream::distributor::{RealtimeDistributor, SubscriptionEvent};
use siren_stream::scope::Scope;

use crate::test_utils::*;

async fn next_event(
    subscription: &mut siren_stream::distributor::Subscription,
) -> SubscriptionEvent {
    tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("subscription event within a second")
        .expect("subscription still open")
}

#[tokio::test]
async fn submission_reaches_a_live_dispatcher_screen() {
    let lifecycle = memory_lifecycle();
    let distributor = RealtimeDistributor::new(lifecycle.clone());

    let mut subscription = distributor.subscribe(Scope::AllAlerts);
    assert_eq!(next_event(&mut subscription).await, SubscriptionEvent::Snapshot(vec![]));

    let alert = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();
    assert_eq!(alert.status, AlertStatus::Assigned);
    assert_eq!(alert.unit.as_ref().unwrap().id, "amb-1");

    match next_event(&mut subscription).await {
        SubscriptionEvent::Upserted(seen) => {
            assert_eq!(seen.id, alert.id);
            assert_eq!(seen.station.as_ref().unwrap().id, "st-central");
        }
        other => panic!("expected upsert, got {other:?}"),
    }
}

#[tokio::test]
async fn resolved_mission_leaves_the_unit_scope() {
    let lifecycle = memory_lifecycle();
    let distributor = RealtimeDistributor::new(lifecycle.clone());
    let alert = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();

    let mut subscription =
        distributor.subscribe(Scope::UnitMission { unit_id: "amb-1".to_string() });
    match next_event(&mut subscription).await {
        SubscriptionEvent::Snapshot(alerts) => assert_eq!(alerts.len(), 1),
        other => panic!("expected snapshot, got {other:?}"),
    }

    let crew = unit("amb-1");
    for target in [AlertStatus::EnRoute, AlertStatus::OnScene, AlertStatus::Resolved] {
        lifecycle.update_status(&crew, alert.id, target, None).unwrap();
    }

    // The en-route and on-scene changes are upserts; resolution removes the
    // mission from the crew's screen.
    assert!(matches!(next_event(&mut subscription).await, SubscriptionEvent::Upserted(_)));
    assert!(matches!(next_event(&mut subscription).await, SubscriptionEvent::Upserted(_)));
    assert_eq!(next_event(&mut subscription).await, SubscriptionEvent::Removed(alert.id));
}

#[tokio::test]
async fn reporter_scope_only_carries_their_reports() {
    let lifecycle = memory_lifecycle();
    let distributor = RealtimeDistributor::new(lifecycle.clone());

    let mut subscription =
        distributor.subscribe(Scope::OwnAlerts { reporter_id: "user-1".to_string() });
    assert_eq!(next_event(&mut subscription).await, SubscriptionEvent::Snapshot(vec![]));

    lifecycle.submit(&reporter("user-2"), downtown_incident()).unwrap();
    let own = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();

    match next_event(&mut subscription).await {
        SubscriptionEvent::Upserted(seen) => assert_eq!(seen.id, own.id),
        other => panic!("expected own upsert, got {other:?}"),
    }
}

#[test]
fn dispatcher_list_is_enriched_but_anonymity_holds() {
    let lifecycle = memory_lifecycle();
    let profiles = Arc::new(MemoryProfileStore::new());
    profiles.upsert(MedicalProfile {
        reporter_id: "user-1".to_string(),
        full_name: "Ana Morales".to_string(),
        blood_type: Some("O-".to_string()),
        age: Some(34),
        conditions: vec!["asthma".to_string()],
        medications: vec![],
        emergency_contacts: vec![],
        notes: None,
    });
    let gateway = EnrichmentGateway::new(profiles);

    lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();
    lifecycle
        .submit(
            &reporter("user-1"),
            SubmitAlert { anonymous: true, ..downtown_incident() },
        )
        .unwrap();

    let alerts = lifecycle.store().list_recent().unwrap();
    let views = gateway.enrich_all(&alerts, &dispatch());
    assert_eq!(views.len(), 2);

    for view in views {
        if view.anonymous {
            assert!(view.reporter_id.is_none());
            assert_eq!(view.medical, MedicalContext::Omitted);
        } else {
            assert!(matches!(view.medical, MedicalContext::Present { .. }));
        }
    }
}
