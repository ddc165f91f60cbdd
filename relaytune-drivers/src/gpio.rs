//! GPIO relay output
//!
//! Drives an on/off actuator from a single pin. Relay outputs above the
//! midpoint of the configured range switch the load on.

use embedded_hal::digital::OutputPin;
use relaytune_core::traits::{ActuatorError, RelayActuator};

/// GPIO relay actuator
///
/// The pin can be configured as active-high (default) or active-low.
pub struct GpioRelay<P> {
    pin: P,
    /// If true, load ON = pin LOW
    inverted: bool,
    /// Outputs above this switch the load on
    threshold: f32,
    /// Current logical state (true = load on)
    on: bool,
}

impl<P: OutputPin> GpioRelay<P> {
    /// Create a new GPIO relay for outputs in `output_min..=output_max`
    ///
    /// The load is switched off before returning.
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to control
    /// - `output_min`, `output_max`: the tuner's relay levels
    /// - `inverted`: If true, the load is ON when the pin is LOW
    pub fn new(
        pin: P,
        output_min: f32,
        output_max: f32,
        inverted: bool,
    ) -> Result<Self, ActuatorError> {
        let mut relay = Self {
            pin,
            inverted,
            threshold: (output_min + output_max) / 2.0,
            on: false,
        };
        relay.set_on(false)?;
        Ok(relay)
    }

    /// Create an active-high relay
    pub fn new_active_high(pin: P, output_min: f32, output_max: f32) -> Result<Self, ActuatorError> {
        Self::new(pin, output_min, output_max, false)
    }

    /// Create an active-low relay
    pub fn new_active_low(pin: P, output_min: f32, output_max: f32) -> Result<Self, ActuatorError> {
        Self::new(pin, output_min, output_max, true)
    }

    /// Is the load currently on?
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Switch the load directly
    pub fn set_on(&mut self, on: bool) -> Result<(), ActuatorError> {
        let result = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| ActuatorError::WriteFailed)?;
        self.on = on;
        Ok(())
    }

    /// Release the pin
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> RelayActuator for GpioRelay<P> {
    fn apply(&mut self, output: f32) -> Result<(), ActuatorError> {
        if !output.is_finite() {
            return Err(ActuatorError::OutOfRange);
        }
        self.set_on(output > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Mock GPIO pin for testing
    struct MockPin {
        high: bool,
    }

    impl MockPin {
        fn new() -> Self {
            Self { high: false }
        }
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }
    }

    /// Pin whose writes always fail
    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn test_active_high_relay() {
        let mut relay = GpioRelay::new_active_high(MockPin::new(), 0.0, 255.0).unwrap();

        // Initially off
        assert!(!relay.is_on());
        assert!(!relay.pin.high);

        relay.apply(255.0).unwrap();
        assert!(relay.is_on());
        assert!(relay.pin.high);

        relay.apply(0.0).unwrap();
        assert!(!relay.is_on());
        assert!(!relay.pin.high);
    }

    #[test]
    fn test_active_low_relay() {
        let mut relay = GpioRelay::new_active_low(MockPin::new(), 0.0, 1.0).unwrap();

        // Initially off (pin is high for active-low)
        assert!(!relay.is_on());
        assert!(relay.pin.high);

        relay.apply(1.0).unwrap();
        assert!(relay.is_on());
        assert!(!relay.pin.high);
    }

    #[test]
    fn test_threshold_is_range_midpoint() {
        let mut relay = GpioRelay::new_active_high(MockPin::new(), -10.0, 30.0).unwrap();

        relay.apply(10.0).unwrap();
        assert!(!relay.is_on());
        relay.apply(10.5).unwrap();
        assert!(relay.is_on());
    }

    #[test]
    fn test_non_finite_output_rejected() {
        let mut relay = GpioRelay::new_active_high(MockPin::new(), 0.0, 1.0).unwrap();
        assert_eq!(relay.apply(f32::NAN), Err(ActuatorError::OutOfRange));
        assert!(!relay.is_on());
    }

    #[test]
    fn test_pin_failure_reported() {
        assert!(matches!(
            GpioRelay::new_active_high(BrokenPin, 0.0, 1.0),
            Err(ActuatorError::WriteFailed)
        ));
    }
}
