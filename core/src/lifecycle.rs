//! Ride lifecycle transitions
//!
//! Each function here is one edge of the state machine declared in
//! `models::ride`. The shared discipline:
//!
//! 1. Validate the acting role for the trigger (driver vs. passenger).
//! 2. Validate the persisted status equals the expected source state — a
//!    mismatch is a lost race and fails with `StaleState`; the current state
//!    is never silently overwritten. The caller re-fetches and decides.
//! 3. Apply the ride mutation, the driver flag changes, and the history
//!    append together. Nothing is written before all checks pass, so a
//!    failed transition leaves no partial state.
//!
//! Entering Accepted holds the driver (`is_available=false,
//! is_active_trip=true`); entering a terminal state releases them. Entering
//! Completed prices the trip and creates the Pending payment row.

use crate::models::ids::{DriverId, RideId};
use crate::models::payment::Payment;
use crate::models::ride::{Actor, Ride, RideError, RideStatus};
use crate::models::state::DispatchState;
use crate::models::{event::RideEvent, payment::PaymentStatus};
use crate::pricing::PricingPolicy;
use chrono::{DateTime, Utc};

fn ride_or_err<'a>(state: &'a DispatchState, ride_id: &RideId) -> Result<&'a Ride, RideError> {
    state
        .get_ride(ride_id)
        .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))
}

fn expect_status(ride: &Ride, expected: RideStatus) -> Result<(), RideError> {
    if ride.status() != expected {
        return Err(RideError::StaleState {
            expected,
            actual: ride.status(),
        });
    }
    Ok(())
}

fn expect_assigned_driver(ride: &Ride, driver_id: &DriverId) -> Result<(), RideError> {
    match ride.driver_id() {
        Some(assigned) if assigned == driver_id => Ok(()),
        Some(_) => Err(RideError::WrongActor),
        None => Err(RideError::MissingDriver),
    }
}

fn append_history(
    state: &mut DispatchState,
    ride_id: &RideId,
    from: Option<RideStatus>,
    to: RideStatus,
    actor: Actor,
    at: DateTime<Utc>,
) {
    state.history_mut().log(RideEvent {
        ride_id: ride_id.clone(),
        from,
        to,
        actor,
        occurred_at: at,
    });
}

/// Record the creation of a ride in the history log.
pub(crate) fn record_requested(state: &mut DispatchState, ride_id: &RideId, at: DateTime<Utc>) {
    let passenger = state
        .get_ride(ride_id)
        .map(|r| r.passenger_id().clone());
    if let Some(passenger) = passenger {
        append_history(
            state,
            ride_id,
            None,
            RideStatus::Requested,
            Actor::Passenger(passenger),
            at,
        );
    }
}

/// Requested -> Accepted. The driver must be dispatchable; losing the race
/// for either the ride or the driver fails without side effects.
pub fn accept_ride(
    state: &mut DispatchState,
    ride_id: &RideId,
    driver_id: &DriverId,
    now: DateTime<Utc>,
) -> Result<(), RideError> {
    let ride = ride_or_err(state, ride_id)?;
    expect_status(ride, RideStatus::Requested)?;

    let driver = state
        .get_driver(driver_id)
        .ok_or_else(|| RideError::DriverNotFound(driver_id.clone()))?;
    if !driver.is_dispatchable() {
        return Err(RideError::DriverUnavailable(driver_id.clone()));
    }

    // All checks passed; apply.
    let ride = state
        .get_ride_mut(ride_id)
        .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
    ride.set_status(RideStatus::Accepted);
    ride.assign_driver(driver_id.clone(), now);
    state
        .get_driver_mut(driver_id)
        .ok_or_else(|| RideError::DriverNotFound(driver_id.clone()))?
        .hold_for_trip();
    append_history(
        state,
        ride_id,
        Some(RideStatus::Requested),
        RideStatus::Accepted,
        Actor::Driver(driver_id.clone()),
        now,
    );
    tracing::debug!(ride = %ride_id, driver = %driver_id, "ride accepted");
    Ok(())
}

/// Accepted -> Arrived. Only the assigned driver may report arrival.
pub fn mark_arrived(
    state: &mut DispatchState,
    ride_id: &RideId,
    driver_id: &DriverId,
    now: DateTime<Utc>,
) -> Result<(), RideError> {
    let ride = ride_or_err(state, ride_id)?;
    expect_assigned_driver(ride, driver_id)?;
    expect_status(ride, RideStatus::Accepted)?;

    let ride = state
        .get_ride_mut(ride_id)
        .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
    ride.set_status(RideStatus::Arrived);
    ride.mark_arrived(now);
    append_history(
        state,
        ride_id,
        Some(RideStatus::Accepted),
        RideStatus::Arrived,
        Actor::Driver(driver_id.clone()),
        now,
    );
    Ok(())
}

/// Arrived -> InProgress. Only the assigned driver may start the trip.
pub fn start_trip(
    state: &mut DispatchState,
    ride_id: &RideId,
    driver_id: &DriverId,
    now: DateTime<Utc>,
) -> Result<(), RideError> {
    let ride = ride_or_err(state, ride_id)?;
    expect_assigned_driver(ride, driver_id)?;
    expect_status(ride, RideStatus::Arrived)?;

    let ride = state
        .get_ride_mut(ride_id)
        .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
    ride.set_status(RideStatus::InProgress);
    ride.mark_started(now);
    append_history(
        state,
        ride_id,
        Some(RideStatus::Arrived),
        RideStatus::InProgress,
        Actor::Driver(driver_id.clone()),
        now,
    );
    Ok(())
}

/// InProgress -> Completed. The assigned driver supplies the actual trip
/// distance and duration; the fare comes from the pricing collaborator,
/// computed before any state is touched so the external call never sits
/// inside the atomic write.
///
/// Returns the final price in cents.
pub fn complete_trip(
    state: &mut DispatchState,
    ride_id: &RideId,
    driver_id: &DriverId,
    distance_km: f64,
    duration_min: f64,
    pricing: &dyn PricingPolicy,
    now: DateTime<Utc>,
) -> Result<i64, RideError> {
    let ride = ride_or_err(state, ride_id)?;
    expect_assigned_driver(ride, driver_id)?;
    expect_status(ride, RideStatus::InProgress)?;

    let final_price = pricing.price(
        ride.ride_type(),
        distance_km,
        duration_min,
        ride.surge_multiplier(),
    );
    let payment_method = ride.payment_method();

    let ride = state
        .get_ride_mut(ride_id)
        .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
    ride.set_status(RideStatus::Completed);
    ride.mark_completed(final_price, now);
    state
        .get_driver_mut(driver_id)
        .ok_or_else(|| RideError::DriverNotFound(driver_id.clone()))?
        .release_from_trip();
    if state.get_payment(ride_id).is_none() {
        state.add_payment(Payment::pending(ride_id.clone(), payment_method, final_price));
    }
    append_history(
        state,
        ride_id,
        Some(RideStatus::InProgress),
        RideStatus::Completed,
        Actor::Driver(driver_id.clone()),
        now,
    );
    tracing::info!(ride = %ride_id, driver = %driver_id, final_price, "trip completed");
    Ok(final_price)
}

/// Any non-terminal state -> Cancelled.
///
/// Role policy: the passenger may cancel up to and including Arrived; the
/// assigned driver may cancel once assigned; the system (reconciler) may
/// cancel anything non-terminal. A passenger cannot abort a moving trip.
pub fn cancel_ride(
    state: &mut DispatchState,
    ride_id: &RideId,
    actor: Actor,
    now: DateTime<Utc>,
) -> Result<(), RideError> {
    let ride = ride_or_err(state, ride_id)?;
    let from = ride.status();
    if !from.can_transition_to(RideStatus::Cancelled) {
        return Err(RideError::InvalidTransition {
            from,
            to: RideStatus::Cancelled,
        });
    }

    let allowed = match &actor {
        Actor::System => true,
        Actor::Passenger(user_id) => {
            user_id == ride.passenger_id() && from != RideStatus::InProgress
        }
        Actor::Driver(driver_id) => ride.driver_id() == Some(driver_id),
    };
    if !allowed {
        return Err(RideError::WrongActor);
    }

    let released_driver = ride.driver_id().cloned();
    let ride = state
        .get_ride_mut(ride_id)
        .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
    ride.set_status(RideStatus::Cancelled);
    ride.mark_cancelled(now);
    if let Some(driver_id) = &released_driver {
        if let Some(driver) = state.get_driver_mut(driver_id) {
            driver.release_from_trip();
        }
    }
    append_history(state, ride_id, Some(from), RideStatus::Cancelled, actor, now);
    tracing::info!(ride = %ride_id, ?from, "ride cancelled");
    Ok(())
}

/// Whether a completed ride still has settlement work outstanding.
pub fn payment_outstanding(state: &DispatchState, ride_id: &RideId) -> bool {
    match state.get_payment(ride_id) {
        Some(payment) => payment.status() != PaymentStatus::Paid,
        None => true,
    }
}
