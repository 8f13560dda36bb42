//! The sqlite store must behave exactly like the memory store

use siren_domain::{AlertStatus, ErrorKind};

use crate::test_utils::*;

/// Drives one full mission through both stores and compares every
/// observation along the way.
#[test]
fn both_stores_agree_on_a_full_mission() {
    for lifecycle in [memory_lifecycle(), sqlite_lifecycle()] {
        let alert = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();
        assert_eq!(alert.status, AlertStatus::Assigned);
        assert_eq!(alert.revision, 0);

        let crew = unit("amb-1");
        for (step, target) in [
            AlertStatus::EnRoute,
            AlertStatus::OnScene,
            AlertStatus::Attending,
            AlertStatus::Transporting,
            AlertStatus::PatientAttended,
        ]
        .into_iter()
        .enumerate()
        {
            let updated = lifecycle.update_status(&crew, alert.id, target, None).unwrap();
            assert_eq!(updated.status, target);
            assert_eq!(updated.revision, step as u64 + 1);
        }

        let stored = lifecycle.store().get(alert.id).unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::PatientAttended);
        assert!(stored.status.is_terminal());

        // Terminal in both stores: the mission no longer shows as active.
        assert!(lifecycle.store().active_for_unit("amb-1").unwrap().is_none());
    }
}

#[test]
fn both_stores_reject_the_losing_writer() {
    for lifecycle in [memory_lifecycle(), sqlite_lifecycle()] {
        let alert = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();
        let stale_revision = alert.revision;

        lifecycle
            .update_status(&unit("amb-1"), alert.id, AlertStatus::EnRoute, None)
            .unwrap();

        let mut losing = lifecycle.store().get(alert.id).unwrap().unwrap();
        losing.status = AlertStatus::OnScene;
        losing.revision = stale_revision + 1;
        let err = lifecycle.store().update_if(&losing, stale_revision).unwrap_err();
        assert!(matches!(
            err,
            siren_dispatch::StoreError::RevisionMismatch { .. }
        ));

        let stored = lifecycle.store().get(alert.id).unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::EnRoute);
    }
}

#[test]
fn both_stores_order_and_filter_reads_identically() {
    for lifecycle in [memory_lifecycle(), sqlite_lifecycle()] {
        let first = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();
        // A second incident near the north station goes to the other crew.
        let second = lifecycle
            .submit(
                &reporter("user-2"),
                siren_dispatch::SubmitAlert {
                    location: siren_domain::GeoPoint { lat: 14.7001, lon: -90.5001 },
                    ..downtown_incident()
                },
            )
            .unwrap();
        assert_eq!(second.unit.as_ref().unwrap().id, "amb-2");

        let recent = lifecycle.store().list_recent().unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].created_at >= recent[1].created_at);

        let own = lifecycle.store().list_by_reporter("user-1").unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, first.id);

        let mission = lifecycle.store().active_for_unit("amb-1").unwrap().unwrap();
        assert_eq!(mission.id, first.id);
    }
}

#[test]
fn both_stores_round_trip_cancellation_fields() {
    // No unit in service: the alert stays `new`, the only state a reporter
    // may cancel from.
    for lifecycle in pending_lifecycles() {
        let alert = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();
        assert_eq!(alert.status, AlertStatus::New);

        let err = lifecycle
            .update_status(&reporter("user-2"), alert.id, AlertStatus::Cancelled, Some("nope"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let cancelled = lifecycle.cancel(&reporter("user-1"), alert.id, "handled on scene").unwrap();
        let stored = lifecycle.store().get(alert.id).unwrap().unwrap();
        assert_eq!(stored, cancelled);
        assert_eq!(stored.cancellation_reason.as_deref(), Some("handled on scene"));
    }
}

#[test]
fn reporter_cannot_cancel_once_assigned() {
    for lifecycle in [memory_lifecycle(), sqlite_lifecycle()] {
        let alert = lifecycle.submit(&reporter("user-1"), downtown_incident()).unwrap();
        assert_eq!(alert.status, AlertStatus::Assigned);

        let err = lifecycle
            .cancel(&reporter("user-1"), alert.id, "changed my mind")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        // Dispatch still can.
        let cancelled = lifecycle.cancel(&dispatch(), alert.id, "stand down").unwrap();
        assert_eq!(cancelled.status, AlertStatus::Cancelled);
    }
}
