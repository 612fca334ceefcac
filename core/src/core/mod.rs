//! Core utilities: time management.

pub mod clock;
