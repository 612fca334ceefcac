//! Domain types: rides, drivers, wallets, ledger, payments, state.

pub mod driver;
pub mod event;
pub mod ids;
pub mod ledger;
pub mod payment;
pub mod ride;
pub mod state;
pub mod wallet;
