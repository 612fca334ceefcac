//! # Ride dispatch and settlement engine
//!
//! Core library for matching ride requests to nearby drivers, driving each
//! ride through its lifecycle, and settling the money when the trip ends.
//!
//! ## Architecture
//!
//! - **models**: domain entities (rides, drivers, wallets, the ledger, the
//!   status history) plus `DispatchState`, the in-memory repository every
//!   operation runs against
//! - **geo**: haversine distance and the cell-sharded driver index
//! - **matching**: nearest-first dispatch with ride-type eligibility
//! - **lifecycle**: the ride state machine transitions
//! - **settlement**: fee computation, wallet transfers, driver confirmation
//!   of cash/card payments
//! - **reconciler**: sweeps for stale rides and unsettled completed rides
//! - **engine**: the facade wiring the above together behind pluggable
//!   clock, pricing, eligibility, and notification collaborators
//!
//! ## Critical invariants
//!
//! - All money values are i64 cents; fee rates are i64 basis points.
//!   Binary floating point never touches a balance.
//! - Ride transitions are monotonic along the declared graph; a mismatch
//!   between expected and persisted status fails with `StaleState` instead
//!   of overwriting.
//! - Every mutating operation validates before it writes: a failed
//!   operation leaves no partial state.
//! - All timestamps come from the injected [`core::clock::Clock`].
//!
//! ## Example
//!
//! ```
//! use dispatch_core::engine::{DispatchEngine, DispatchOutcome, RideRequest};
//! use dispatch_core::geo::GeoPoint;
//! use dispatch_core::models::driver::VehicleProfile;
//! use dispatch_core::models::ids::UserId;
//! use dispatch_core::models::ride::{PaymentMethod, RideType};
//! use dispatch_core::EngineConfig;
//!
//! let mut engine = DispatchEngine::new(EngineConfig::default());
//! let driver_id = engine
//!     .register_driver(
//!         UserId::new(),
//!         GeoPoint::new(-23.5505, -46.6333),
//!         VehicleProfile::default(),
//!     )
//!     .unwrap();
//! engine.set_driver_online(&driver_id, true).unwrap();
//!
//! let outcome = engine
//!     .request_ride(RideRequest {
//!         passenger_id: UserId::new(),
//!         origin: GeoPoint::new(-23.5510, -46.6330),
//!         origin_address: "Av. Paulista, 1000".into(),
//!         destination: GeoPoint::new(-23.5605, -46.6433),
//!         destination_address: "Rua Augusta, 500".into(),
//!         ride_type: RideType::Standard,
//!         payment_method: PaymentMethod::Wallet,
//!         surge_multiplier: 1.0,
//!     })
//!     .unwrap();
//! assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod geo;
pub mod lifecycle;
pub mod matching;
pub mod models;
pub mod notify;
pub mod pricing;
pub mod reconciler;
pub mod settlement;

pub use config::EngineConfig;
pub use engine::{
    DispatchEngine, DispatchOutcome, DriverDecision, EngineError, PostCompletionSettlement,
    RideRequest, RideTrigger, TransitionOutcome,
};
pub use models::ride::{Actor, PaymentMethod, RideStatus, RideType};
pub use models::state::DispatchState;
pub use settlement::{SettlementError, SettlementResult};
