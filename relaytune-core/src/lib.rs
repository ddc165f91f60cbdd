//! Board-agnostic relay-feedback PID autotuner
//!
//! This crate contains the complete tuning algorithm and nothing that
//! depends on specific hardware:
//!
//! - Tuner configuration and validation
//! - Relay switch with running extremum tracking
//! - Per-cycle period/amplitude accumulation
//! - Ziegler-Nichols gain calculation
//! - The autotune state machine tying these together
//! - Hardware abstraction traits (sensor, actuator, clock)
//!
//! The caller owns the control loop. Each sample it hands the tuner the
//! measured process value and a monotonic timestamp, and applies the
//! returned output before the next sample.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod accumulator;
pub mod config;
pub mod gains;
pub mod relay;
pub mod traits;
pub mod tuner;

pub use config::{ConfigError, TunerConfig, ZnMode, DEFAULT_TUNING_CYCLES};
pub use gains::{PidGains, UltimateParams, ZnConstants};
pub use tuner::{AutotuneState, Autotuner, TuneError, TuneResult};
