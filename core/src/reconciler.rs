//! Reconciliation sweeps
//!
//! Periodic repair jobs for state that drifted from the invariants:
//!
//! - **Stale rides**: rides stuck in Requested or Accepted past the staleness
//!   threshold (the passenger walked away, the driver never moved). The sweep
//!   cancels them as the system actor and purges their history and payment
//!   stub; the ride row itself survives as the Cancelled record.
//! - **Inconsistent settlements**: Completed rides whose payment is missing
//!   or still Pending. The sweep re-runs settlement for them.
//!
//! Both sweeps are idempotent and skip individual failures rather than
//! aborting the batch.

use crate::lifecycle;
use crate::models::ids::RideId;
use crate::models::ride::{Actor, RideStatus};
use crate::models::state::DispatchState;
use crate::settlement::{self, SettlementResult};
use chrono::{DateTime, Duration, Utc};

/// Result of one stale-ride sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaleSweepOutcome {
    /// Rides that matched the staleness criteria, oldest first.
    pub candidates: Vec<RideId>,
    /// Rides actually cancelled (empty on a dry run).
    pub cancelled: Vec<RideId>,
    /// Candidates whose cancellation failed and were left untouched.
    pub skipped: Vec<RideId>,
}

/// Result of one settlement-repair sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Completed rides whose payment was missing or Pending.
    pub examined: usize,
    /// Rides whose payment is Paid after the sweep.
    pub repaired: usize,
    /// Rides left unpaid (awaiting confirmation, insufficient funds).
    pub skipped: usize,
}

/// The moment a ride last made progress: its latest history record, or its
/// creation time when history was never written.
fn last_activity(state: &DispatchState, ride_id: &RideId, created_at: DateTime<Utc>) -> DateTime<Utc> {
    state
        .history()
        .events_for_ride(ride_id)
        .last()
        .map_or(created_at, |e| e.occurred_at)
}

/// Rides stuck in Requested or Accepted for longer than `max_age_minutes`,
/// ordered oldest first (ride id breaks ties, so sweeps are deterministic).
pub fn find_stale(
    state: &DispatchState,
    now: DateTime<Utc>,
    max_age_minutes: i64,
) -> Vec<RideId> {
    let cutoff = now - Duration::minutes(max_age_minutes);
    let mut stale: Vec<(DateTime<Utc>, RideId)> = state
        .rides()
        .values()
        .filter(|ride| {
            matches!(ride.status(), RideStatus::Requested | RideStatus::Accepted)
        })
        .filter_map(|ride| {
            let seen = last_activity(state, ride.id(), ride.created_at());
            (seen <= cutoff).then(|| (seen, ride.id().clone()))
        })
        .collect();
    stale.sort();
    stale.into_iter().map(|(_, id)| id).collect()
}

/// Cancel abandoned rides and clean up their traces.
///
/// With `force == false` this is a dry run: candidates are reported but
/// nothing changes. With `force == true` each candidate is cancelled as the
/// system actor, its history purged, and its payment stub removed. A
/// candidate that fails to cancel (for example it progressed between find
/// and apply) is skipped and reported, never retried within the sweep.
pub fn sweep_stale(
    state: &mut DispatchState,
    now: DateTime<Utc>,
    max_age_minutes: i64,
    force: bool,
) -> StaleSweepOutcome {
    let candidates = find_stale(state, now, max_age_minutes);
    let mut outcome = StaleSweepOutcome {
        candidates: candidates.clone(),
        ..Default::default()
    };
    if !force {
        return outcome;
    }

    for ride_id in candidates {
        match lifecycle::cancel_ride(state, &ride_id, Actor::System, now) {
            Ok(()) => {
                let purged = state.history_mut().purge_ride(&ride_id);
                state.remove_payment(&ride_id);
                tracing::info!(ride = %ride_id, purged_events = purged, "stale ride cancelled");
                outcome.cancelled.push(ride_id);
            }
            Err(err) => {
                tracing::warn!(ride = %ride_id, %err, "stale candidate not cancelled");
                outcome.skipped.push(ride_id);
            }
        }
    }
    outcome
}

/// Completed rides whose payment is missing or not yet Paid, in a stable
/// order.
pub fn find_inconsistent_settlements(state: &DispatchState) -> Vec<RideId> {
    let mut rides: Vec<RideId> = state
        .rides()
        .values()
        .filter(|ride| ride.status() == RideStatus::Completed)
        .filter(|ride| lifecycle::payment_outstanding(state, ride.id()))
        .map(|ride| ride.id().clone())
        .collect();
    rides.sort();
    rides
}

/// Re-run settlement for every inconsistent Completed ride.
///
/// Rides that legitimately cannot settle yet — cash/card waiting on the
/// driver, wallets still short of funds — are counted as skipped, not
/// treated as errors; the next sweep picks them up again.
pub fn repair_settlements(
    state: &mut DispatchState,
    now: DateTime<Utc>,
    fee_rate_bps: i64,
) -> SweepReport {
    let targets = find_inconsistent_settlements(state);
    let mut report = SweepReport {
        examined: targets.len(),
        ..Default::default()
    };

    for ride_id in targets {
        match settlement::settle_ride(state, &ride_id, fee_rate_bps, now) {
            Ok(SettlementResult::Settled { .. }) | Ok(SettlementResult::AlreadySettled) => {
                report.repaired += 1;
            }
            Ok(SettlementResult::AwaitingDriverConfirmation) => {
                report.skipped += 1;
            }
            Err(err) => {
                tracing::warn!(ride = %ride_id, %err, "settlement repair skipped");
                report.skipped += 1;
            }
        }
    }
    tracing::info!(
        examined = report.examined,
        repaired = report.repaired,
        skipped = report.skipped,
        "settlement repair sweep finished"
    );
    report
}
