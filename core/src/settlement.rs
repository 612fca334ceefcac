//! Ride settlement
//!
//! Runs after a ride reaches Completed: compute the platform fee, move money
//! (wallet rides) or wait for the driver's confirmation (cash/card rides),
//! and flip the payment to Paid. All checks run before any write, so a
//! failed settlement leaves the payment Pending and retryable.
//!
//! Settlement is idempotent: a Paid payment short-circuits to
//! `AlreadySettled` without touching the ledger again.
//!
//! CRITICAL: All money values are i64 (cents)

use crate::models::ids::{DriverId, RideId, UserId};
use crate::models::ledger::LedgerError;
use crate::models::payment::Payment;
use crate::models::ride::{PaymentMethod, RideStatus};
use crate::models::state::DispatchState;
use crate::models::wallet::WalletError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Outcome of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementResult {
    /// Funds moved and the payment is now Paid.
    Settled { fare: i64, fee: i64, net: i64 },
    /// The payment was already Paid; nothing was done.
    AlreadySettled,
    /// Cash/card ride: money moves outside the ledger, so the payment stays
    /// Pending until the driver confirms receipt.
    AwaitingDriverConfirmation,
}

/// Errors from settlement operations.
#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("ride {0} not found")]
    RideNotFound(RideId),

    #[error("ride is in {status:?}; only Completed rides settle")]
    NotCompleted { status: RideStatus },

    #[error("completed ride has no final price")]
    MissingFinalPrice,

    #[error("ride has no assigned driver")]
    MissingDriver,

    #[error("driver {0} is not the driver of this ride")]
    WrongDriver(DriverId),

    #[error("payment method {method:?} cannot be confirmed by the driver")]
    WrongMethod { method: PaymentMethod },

    #[error("wallet balance too low: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for SettlementError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Wallet(WalletError::InsufficientFunds { required, available }) => {
                SettlementError::InsufficientFunds { required, available }
            }
            other => SettlementError::Ledger(other),
        }
    }
}

struct SettlementContext {
    passenger_id: UserId,
    driver_id: DriverId,
    driver_user_id: UserId,
    method: PaymentMethod,
    fare: i64,
}

/// Completion already released the driver; re-assert it here so a crash
/// between completion and settlement cannot strand them.
fn release_driver_if_held(state: &mut DispatchState, driver_id: &DriverId) {
    if let Some(driver) = state.get_driver_mut(driver_id) {
        if driver.is_active_trip() {
            driver.release_from_trip();
        }
    }
}

/// Load and validate everything settlement needs, without writing.
fn settlement_context(
    state: &DispatchState,
    ride_id: &RideId,
) -> Result<SettlementContext, SettlementError> {
    let ride = state
        .get_ride(ride_id)
        .ok_or_else(|| SettlementError::RideNotFound(ride_id.clone()))?;
    if ride.status() != RideStatus::Completed {
        return Err(SettlementError::NotCompleted {
            status: ride.status(),
        });
    }
    let fare = ride.final_price().ok_or(SettlementError::MissingFinalPrice)?;
    let driver_id = ride.driver_id().ok_or(SettlementError::MissingDriver)?;
    let driver_user_id = state
        .get_driver(driver_id)
        .map(|d| d.user_id().clone())
        .ok_or(SettlementError::MissingDriver)?;
    Ok(SettlementContext {
        passenger_id: ride.passenger_id().clone(),
        driver_id: driver_id.clone(),
        driver_user_id,
        method: ride.payment_method(),
        fare,
    })
}

/// Settle a completed ride.
///
/// Wallet rides transfer fare through the ledger and mark the payment Paid.
/// Cash and card rides return `AwaitingDriverConfirmation`; money for those
/// moves outside the system and the payment flips on
/// [`confirm_external_payment`]. The fee is `fare * fee_rate_bps / 10_000`.
pub fn settle_ride(
    state: &mut DispatchState,
    ride_id: &RideId,
    fee_rate_bps: i64,
    now: DateTime<Utc>,
) -> Result<SettlementResult, SettlementError> {
    if let Some(payment) = state.get_payment(ride_id) {
        if payment.is_paid() {
            return Ok(SettlementResult::AlreadySettled);
        }
    }

    let ctx = settlement_context(state, ride_id)?;

    // Completion creates the payment row; recreate it here if a crash between
    // completion and settlement lost it.
    if state.get_payment(ride_id).is_none() {
        state.add_payment(Payment::pending(ride_id.clone(), ctx.method, ctx.fare));
    }

    match ctx.method {
        PaymentMethod::Wallet => {
            let fee = ctx.fare * fee_rate_bps / 10_000;
            let transfer = state.ledger_mut().transfer_ride_payment(
                ride_id,
                &ctx.passenger_id,
                &ctx.driver_user_id,
                ctx.fare,
                fee,
                now,
            )?;
            if let Some(payment) = state.get_payment_mut(ride_id) {
                payment.mark_paid(now, None);
            }
            release_driver_if_held(state, &ctx.driver_id);
            tracing::info!(
                ride = %ride_id,
                fare = transfer.fare,
                fee = transfer.fee,
                net = transfer.net,
                "wallet ride settled"
            );
            Ok(SettlementResult::Settled {
                fare: transfer.fare,
                fee: transfer.fee,
                net: transfer.net,
            })
        }
        PaymentMethod::Cash | PaymentMethod::Card => {
            tracing::debug!(ride = %ride_id, method = ?ctx.method, "awaiting driver confirmation");
            Ok(SettlementResult::AwaitingDriverConfirmation)
        }
    }
}

/// Driver confirms receipt of a cash or card payment.
///
/// Only the ride's assigned driver may confirm, and only for methods whose
/// money moves outside the ledger: a Wallet ride is rejected with
/// `WrongMethod` — its payment clears exclusively through [`settle_ride`],
/// which actually moves the funds. Confirming an already Paid payment is an
/// idempotent no-op.
pub fn confirm_external_payment(
    state: &mut DispatchState,
    ride_id: &RideId,
    driver_id: &DriverId,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<SettlementResult, SettlementError> {
    let ride = state
        .get_ride(ride_id)
        .ok_or_else(|| SettlementError::RideNotFound(ride_id.clone()))?;
    if ride.status() != RideStatus::Completed {
        return Err(SettlementError::NotCompleted {
            status: ride.status(),
        });
    }
    match ride.driver_id() {
        Some(assigned) if assigned == driver_id => {}
        Some(_) => return Err(SettlementError::WrongDriver(driver_id.clone())),
        None => return Err(SettlementError::MissingDriver),
    }
    let method = ride.payment_method();
    if method == PaymentMethod::Wallet {
        return Err(SettlementError::WrongMethod { method });
    }
    let fare = ride.final_price().ok_or(SettlementError::MissingFinalPrice)?;

    if state.get_payment(ride_id).is_none() {
        state.add_payment(Payment::pending(ride_id.clone(), method, fare));
    }
    let payment = state
        .get_payment_mut(ride_id)
        .ok_or_else(|| SettlementError::RideNotFound(ride_id.clone()))?;
    if payment.is_paid() {
        return Ok(SettlementResult::AlreadySettled);
    }
    payment.mark_paid(now, notes);
    release_driver_if_held(state, driver_id);
    tracing::info!(ride = %ride_id, driver = %driver_id, "external payment confirmed");
    Ok(SettlementResult::Settled {
        fare,
        fee: 0,
        net: fare,
    })
}
