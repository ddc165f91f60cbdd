//! Hardware abstraction traits
//!
//! These traits define the interface between the autotuner and the
//! hardware it runs against. The tuner itself never calls them; they are
//! implemented by board crates and consumed by `relaytune-drivers`.

pub mod process;

pub use process::{ActuatorError, Clock, ProcessSensor, RelayActuator, SensorError};
