//! Role-scoped status transition table
//!
//! The transition rules live in one auditable allow-list instead of being
//! scattered through request handlers. [`allowed_targets`] answers "which
//! statuses may this actor set on this alert right now"; [`check_transition`]
//! layers the terminal-state and cancellation-reason checks on top and maps
//! every rejection onto the error taxonomy.
//!
//! The dispatch role is deliberately permissive: real incidents do not
//! progress monotonically, so an operator may move any non-terminal alert to
//! any other defined state, including backwards (e.g. `on_scene` back to
//! `en_route` after a redirect).

#![warn(missing_docs)]

use crate::actor::Actor;
use crate::alert::{Alert, AlertStatus};
use crate::error::{AlertError, Result};

/// Statuses the given actor may set on the given alert
///
/// Empty for terminal alerts, for actors outside the alert's scope, and for
/// roles with no transition rights over it. The current status is never a
/// permitted target.
pub fn allowed_targets(actor: &Actor, alert: &Alert) -> Vec<AlertStatus> {
    if alert.status.is_terminal() {
        return Vec::new();
    }

    let base: &[AlertStatus] = match actor {
        // Full manual override from any non-terminal state.
        Actor::Dispatch { .. } => &AlertStatus::ALL,

        // A reporter may only cancel their own alert, and only from `new`.
        Actor::Reporter { reporter_id } => {
            if alert.reporter_id == *reporter_id && alert.status == AlertStatus::New {
                &[AlertStatus::Cancelled]
            } else {
                &[]
            }
        }

        // A unit may only work the single alert assigned to it, within the
        // operational subset.
        Actor::Unit { unit_id } => {
            if alert.is_assigned_to_unit(unit_id) {
                &AlertStatus::OPERATIONAL
            } else {
                &[]
            }
        }
    };

    base.iter()
        .copied()
        .filter(|s| *s != alert.status)
        .collect()
}

/// Validate a status transition attempt
///
/// Check order: terminal state (conflict), role scope (authorization),
/// cancellation-reason coupling (validation). A rejection leaves the alert
/// untouched; callers must not apply any part of a rejected transition.
pub fn check_transition(
    actor: &Actor,
    alert: &Alert,
    target: AlertStatus,
    reason: Option<&str>,
) -> Result<()> {
    if alert.status.is_terminal() {
        return Err(AlertError::Conflict(format!(
            "alert {} is already {}",
            alert.id, alert.status
        )));
    }

    if target == alert.status {
        return Err(AlertError::Validation(format!(
            "alert {} is already in status {}",
            alert.id, target
        )));
    }

    if !allowed_targets(actor, alert).contains(&target) {
        return Err(authorization_denial(actor, alert, target));
    }

    // Cancellation reason is present iff the target is cancelled.
    match (target, reason) {
        (AlertStatus::Cancelled, None) => Err(AlertError::Validation(
            "cancellation requires a reason".to_string(),
        )),
        (AlertStatus::Cancelled, Some(r)) if r.trim().is_empty() => Err(AlertError::Validation(
            "cancellation requires a non-empty reason".to_string(),
        )),
        (_, Some(_)) if target != AlertStatus::Cancelled => Err(AlertError::Validation(format!(
            "a reason may only accompany a cancellation, not {target}"
        ))),
        _ => Ok(()),
    }
}

fn authorization_denial(actor: &Actor, alert: &Alert, target: AlertStatus) -> AlertError {
    let detail = match actor {
        Actor::Dispatch { .. } => format!("dispatch may not set {target} here"),
        Actor::Reporter { reporter_id } => {
            if alert.reporter_id != *reporter_id {
                "reporters may only cancel their own alert".to_string()
            } else {
                format!(
                    "reporters may only cancel a new alert, not set {} from {}",
                    target, alert.status
                )
            }
        }
        Actor::Unit { unit_id } => {
            if !alert.is_assigned_to_unit(unit_id) {
                format!("unit {unit_id} is not assigned to alert {}", alert.id)
            } else {
                format!("units may only set operational statuses, not {target}")
            }
        }
    };
    AlertError::Authorization(format!("{} denied: {detail}", actor.audit_label()))
}
