//! Discrete plant models for host-side testing
//!
//! Small, allocation-free process models that close the loop around the
//! autotuner in tests and bench setups:
//!
//! - First-order lag (`y += α·(u − y)` per sample)
//! - First-order lag behind a fixed dead time
//! - Closed-form relay limit cycle of a first-order-plus-dead-time plant

#![no_std]
#![deny(unsafe_code)]

pub mod analytic;
pub mod plant;

pub use analytic::{relay_limit_cycle_amplitude, relay_limit_cycle_period};
pub use plant::{DeadTimePlant, FirstOrderLag, Plant, SimError};
