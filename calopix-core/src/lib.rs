//! calopix-core: Core types and traits for calorimeter hit-cloud reduction.
//!
//! This crate provides the per-event data model, the reduction strategy
//! abstraction, strategy configuration and the observable calculator.
//!

pub mod config;
pub mod error;
pub mod hit;
pub mod observables;
pub mod reduced;
pub mod strategy;

pub use config::{BinningMode, ReductionConfig};
pub use error::{Error, ObservableError, ReductionError, Result};
pub use hit::{HitCloud, Position};
pub use observables::ObservableSet;
pub use reduced::{EnergyPolicy, ReducedCloud};
pub use strategy::ReductionStrategy;
