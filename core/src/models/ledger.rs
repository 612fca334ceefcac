//! Wallet ledger
//!
//! The ledger is the append-only record of all wallet-affecting entries plus
//! the mutable wallet balances themselves. Entries are immutable once
//! Completed; corrections are new entries, never edits.
//!
//! The one compound operation, `transfer_ride_payment`, is the financial leg
//! of settlement: it validates everything first and then applies the two
//! wallet movements and three entries together, so no partial transfer can
//! ever be observed.
//!
//! CRITICAL: All money values are i64 (cents)

use crate::models::ids::{EntryId, RideId, UserId, WalletId};
use crate::models::wallet::{Wallet, WalletError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Business meaning of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Fare moving between passenger and driver.
    RidePayment,
    /// The platform's cut, withheld from the driver's gross share.
    PlatformFee,
    /// Correction entry returning funds to a passenger.
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
}

/// Errors that can occur during ledger operations
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("invalid transfer amounts: fare {fare}, fee {fee}")]
    InvalidAmounts { fare: i64, fee: i64 },

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// One immutable row in the transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: EntryId,
    wallet_id: WalletId,
    user_id: UserId,
    kind: EntryKind,
    /// Signed amount: negative leaves the wallet, positive enters it (cents).
    amount: i64,
    status: EntryStatus,
    ride_id: Option<RideId>,
    description: String,
    processed_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    fn completed(
        wallet_id: WalletId,
        user_id: UserId,
        kind: EntryKind,
        amount: i64,
        ride_id: Option<RideId>,
        description: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            wallet_id,
            user_id,
            kind,
            amount,
            status: EntryStatus::Completed,
            ride_id,
            description,
            processed_at: Some(at),
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn wallet_id(&self) -> &WalletId {
        &self.wallet_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn ride_id(&self) -> Option<&RideId> {
        self.ride_id.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }
}

/// Amounts moved by one ride settlement (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideTransfer {
    /// Gross fare debited from the passenger.
    pub fare: i64,
    /// Platform cut withheld from the driver's share.
    pub fee: i64,
    /// Net amount credited to the driver (`fare - fee`).
    pub net: i64,
}

/// Append-only transaction log plus wallet balances.
///
/// # Example
/// ```
/// use dispatch_core::models::ledger::Ledger;
/// use dispatch_core::models::ids::{RideId, UserId};
/// use chrono::Utc;
///
/// let mut ledger = Ledger::new();
/// ledger.wallet_or_create(&UserId::from("rider")).credit(50_000);
///
/// let transfer = ledger
///     .transfer_ride_payment(
///         &RideId::from("ride-1"),
///         &UserId::from("rider"),
///         &UserId::from("driver"),
///         10_000,
///         1_000,
///         Utc::now(),
///     )
///     .unwrap();
///
/// assert_eq!(transfer.net, 9_000);
/// assert_eq!(ledger.balance(&UserId::from("rider")), 40_000);
/// assert_eq!(ledger.balance(&UserId::from("driver")), 9_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    wallets: HashMap<UserId, Wallet>,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wallet(&self, user_id: &UserId) -> Option<&Wallet> {
        self.wallets.get(user_id)
    }

    /// Fetch a user's wallet, creating it at zero balance on first touch.
    pub fn wallet_or_create(&mut self, user_id: &UserId) -> &mut Wallet {
        self.wallets
            .entry(user_id.clone())
            .or_insert_with(|| Wallet::new(user_id.clone(), 0))
    }

    /// Balance for a user; zero when no wallet exists yet.
    pub fn balance(&self, user_id: &UserId) -> i64 {
        self.wallets.get(user_id).map_or(0, Wallet::balance)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn entries_for_ride(&self, ride_id: &RideId) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.ride_id() == Some(ride_id))
            .collect()
    }

    /// Sum of all wallet balances — conserved by every transfer except for
    /// the platform fee leaving the driver's share.
    pub fn total_balance(&self) -> i64 {
        self.wallets.values().map(Wallet::balance).sum()
    }

    /// Atomic settlement transfer for one completed ride.
    ///
    /// Validates first, then applies everything: debit the passenger by the
    /// gross fare, credit the driver by the net amount (creating the driver
    /// wallet if absent), and append three Completed entries sharing the
    /// ride id — passenger RidePayment `-fare`, driver RidePayment `+net`,
    /// driver PlatformFee `-fee`. On any error no state changes occur.
    pub fn transfer_ride_payment(
        &mut self,
        ride_id: &RideId,
        passenger_id: &UserId,
        driver_user_id: &UserId,
        fare: i64,
        fee: i64,
        now: DateTime<Utc>,
    ) -> Result<RideTransfer, LedgerError> {
        if fare <= 0 || fee < 0 || fee > fare {
            return Err(LedgerError::InvalidAmounts { fare, fee });
        }
        let net = fare - fee;

        // Validate before any write.
        let passenger_wallet = self.wallet_or_create(passenger_id);
        if !passenger_wallet.can_pay(fare) {
            return Err(WalletError::InsufficientFunds {
                required: fare,
                available: passenger_wallet.balance(),
            }
            .into());
        }

        // Apply in a fixed order: passenger debit, then driver credit.
        let passenger_wallet_id = {
            let wallet = self.wallet_or_create(passenger_id);
            wallet.debit(fare)?;
            wallet.id().clone()
        };
        let driver_wallet_id = {
            let wallet = self.wallet_or_create(driver_user_id);
            wallet.credit(net);
            wallet.id().clone()
        };

        self.entries.push(LedgerEntry::completed(
            passenger_wallet_id,
            passenger_id.clone(),
            EntryKind::RidePayment,
            -fare,
            Some(ride_id.clone()),
            format!("ride fare {ride_id}"),
            now,
        ));
        self.entries.push(LedgerEntry::completed(
            driver_wallet_id.clone(),
            driver_user_id.clone(),
            EntryKind::RidePayment,
            net,
            Some(ride_id.clone()),
            format!("ride earnings {ride_id}"),
            now,
        ));
        self.entries.push(LedgerEntry::completed(
            driver_wallet_id,
            driver_user_id.clone(),
            EntryKind::PlatformFee,
            -fee,
            Some(ride_id.clone()),
            format!("platform fee {ride_id}"),
            now,
        ));

        Ok(RideTransfer { fare, fee, net })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    fn ledger_with_rider_balance(balance: i64) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.wallet_or_create(&uid("rider")).credit(balance);
        ledger
    }

    #[test]
    fn transfer_moves_funds_and_appends_three_entries() {
        let mut ledger = ledger_with_rider_balance(50_000);
        let now = Utc::now();

        let transfer = ledger
            .transfer_ride_payment(&RideId::from("r1"), &uid("rider"), &uid("driver"), 10_000, 1_000, now)
            .unwrap();

        assert_eq!(transfer, RideTransfer { fare: 10_000, fee: 1_000, net: 9_000 });
        assert_eq!(ledger.balance(&uid("rider")), 40_000);
        assert_eq!(ledger.balance(&uid("driver")), 9_000);

        let entries = ledger.entries_for_ride(&RideId::from("r1"));
        assert_eq!(entries.len(), 3);
        let amounts: Vec<i64> = entries.iter().map(|e| e.amount()).collect();
        assert_eq!(amounts, vec![-10_000, 9_000, -1_000]);
        assert!(entries.iter().all(|e| e.status() == EntryStatus::Completed));
        assert!(entries.iter().all(|e| e.processed_at() == Some(now)));
    }

    #[test]
    fn fare_splits_into_net_plus_fee() {
        let mut ledger = ledger_with_rider_balance(100_000);
        let transfer = ledger
            .transfer_ride_payment(&RideId::from("r1"), &uid("rider"), &uid("driver"), 9_999, 999, Utc::now())
            .unwrap();
        assert_eq!(transfer.fare, transfer.net + transfer.fee);
    }

    #[test]
    fn insufficient_funds_leaves_no_trace() {
        let mut ledger = ledger_with_rider_balance(5_000);

        let err = ledger
            .transfer_ride_payment(&RideId::from("r1"), &uid("rider"), &uid("driver"), 10_000, 1_000, Utc::now())
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::Wallet(WalletError::InsufficientFunds {
                required: 10_000,
                available: 5_000
            })
        );
        assert_eq!(ledger.balance(&uid("rider")), 5_000);
        assert_eq!(ledger.balance(&uid("driver")), 0);
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn invalid_amounts_are_rejected() {
        let mut ledger = ledger_with_rider_balance(50_000);
        let ride = RideId::from("r1");
        assert!(ledger
            .transfer_ride_payment(&ride, &uid("rider"), &uid("driver"), 0, 0, Utc::now())
            .is_err());
        assert!(ledger
            .transfer_ride_payment(&ride, &uid("rider"), &uid("driver"), 1_000, 2_000, Utc::now())
            .is_err());
        assert!(ledger
            .transfer_ride_payment(&ride, &uid("rider"), &uid("driver"), 1_000, -1, Utc::now())
            .is_err());
    }

    #[test]
    fn driver_wallet_is_created_lazily_at_zero() {
        let mut ledger = ledger_with_rider_balance(20_000);
        assert!(ledger.wallet(&uid("driver")).is_none());

        ledger
            .transfer_ride_payment(&RideId::from("r1"), &uid("rider"), &uid("driver"), 10_000, 1_000, Utc::now())
            .unwrap();

        assert_eq!(ledger.wallet(&uid("driver")).unwrap().balance(), 9_000);
    }

    #[test]
    fn zero_fee_transfer_conserves_total_balance() {
        let mut ledger = ledger_with_rider_balance(20_000);
        let before = ledger.total_balance();
        ledger
            .transfer_ride_payment(&RideId::from("r1"), &uid("rider"), &uid("driver"), 10_000, 0, Utc::now())
            .unwrap();
        assert_eq!(ledger.total_balance(), before);
    }
}
