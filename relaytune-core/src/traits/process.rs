//! Process sensor, actuator and timebase traits

/// Errors that can occur reading the process value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor disconnected (open circuit)
    OpenCircuit,
    /// Sensor shorted
    ShortCircuit,
    /// Reading out of expected range
    OutOfRange,
    /// ADC or bus conversion error
    ConversionError,
}

/// Errors that can occur driving the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// Pin or bus write failed
    WriteFailed,
    /// Output value outside what the actuator accepts
    OutOfRange,
}

/// Source of the measured process value
///
/// Takes `&mut self` because ADC and bus reads typically need mutable
/// access.
pub trait ProcessSensor {
    /// Read the current process value in the same units as the target
    fn read(&mut self) -> Result<f32, SensorError>;
}

/// Sink for the relay output
pub trait RelayActuator {
    /// Apply an output value
    fn apply(&mut self, output: f32) -> Result<(), ActuatorError>;
}

/// Monotonic timebase
///
/// Any unit works as long as it is used consistently; the measured
/// ultimate period and therefore `Ki`/`Kd` come out in the same unit.
/// Wraparound of the counter is handled.
pub trait Clock {
    /// Current time
    fn now(&self) -> u32;
}
