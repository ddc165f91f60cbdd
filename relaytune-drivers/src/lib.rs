//! Hardware bindings for the relay autotuner
//!
//! This crate wires the traits defined in relaytune-core to a running
//! relay test:
//!
//! - Autotune session (sensor → tuner → actuator, once per update)
//! - GPIO relay actuator for on/off outputs (SSR, MOSFET, contactor)

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod session;

pub use gpio::GpioRelay;
pub use session::{AutotuneSession, SessionError, SessionStatus};
