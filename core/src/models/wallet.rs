//! Wallet model
//!
//! One wallet per user, created lazily on first use. The balance is i64
//! cents and never goes negative: a debit that would overdraw fails with
//! `InsufficientFunds` and leaves the balance untouched.
//!
//! CRITICAL: All money values are i64 (cents)

use crate::models::ids::{UserId, WalletId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during wallet operations
#[derive(Debug, Error, PartialEq)]
pub enum WalletError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },
}

/// A user's internal wallet.
///
/// # Example
/// ```
/// use dispatch_core::models::wallet::Wallet;
/// use dispatch_core::models::ids::UserId;
///
/// let mut wallet = Wallet::new(UserId::from("rider-1"), 50_000);
/// wallet.debit(10_000).unwrap(); // pay $100.00
/// assert_eq!(wallet.balance(), 40_000);
/// assert!(wallet.debit(100_000).is_err()); // would overdraw
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    id: WalletId,
    user_id: UserId,
    /// Current balance (i64 cents, never negative).
    balance: i64,
}

impl Wallet {
    /// Create a wallet with an opening balance.
    pub fn new(user_id: UserId, balance: i64) -> Self {
        assert!(balance >= 0, "balance must be non-negative");
        Self {
            id: WalletId::new(),
            user_id,
            balance,
        }
    }

    pub fn id(&self) -> &WalletId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Whether a debit of `amount` would succeed.
    pub fn can_pay(&self, amount: i64) -> bool {
        amount <= self.balance
    }

    /// Decrease the balance. Fails without mutation when funds are short.
    pub fn debit(&mut self, amount: i64) -> Result<(), WalletError> {
        assert!(amount >= 0, "amount must be non-negative");
        if !self.can_pay(amount) {
            return Err(WalletError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Increase the balance.
    pub fn credit(&mut self, amount: i64) {
        assert!(amount >= 0, "amount must be non-negative");
        self.balance += amount;
    }
}
