//! Autotune session
//!
//! Owns a sensor, an actuator and a clock and runs the relay test against
//! them. Call [`AutotuneSession::update`] at the control loop rate; every
//! call reads the sensor, steps the tuner and applies the new output.
//!
//! Whenever the test stops (completion, tuner failure, sensor or
//! actuator fault, cancel) the actuator is driven to `output_min`.

use relaytune_core::traits::{ActuatorError, Clock, ProcessSensor, RelayActuator, SensorError};
use relaytune_core::{AutotuneState, Autotuner, TuneError, TuneResult};

/// Session errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Reading the process value failed
    Sensor(SensorError),
    /// Driving the output failed
    Actuator(ActuatorError),
    /// The tuner aborted the test
    Tune(TuneError),
}

impl From<SensorError> for SessionError {
    fn from(err: SensorError) -> Self {
        SessionError::Sensor(err)
    }
}

impl From<ActuatorError> for SessionError {
    fn from(err: ActuatorError) -> Self {
        SessionError::Actuator(err)
    }
}

impl From<TuneError> for SessionError {
    fn from(err: TuneError) -> Self {
        SessionError::Tune(err)
    }
}

/// Progress after one update
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionStatus {
    /// Test still running
    Running {
        /// Averaged cycles so far
        cycle: u16,
        /// Output applied this update
        output: f32,
    },
    /// Test finished; actuator parked
    Complete(TuneResult),
}

/// Relay test bound to hardware
pub struct AutotuneSession<S, A, C> {
    sensor: S,
    actuator: A,
    clock: C,
    tuner: Autotuner,
}

impl<S: ProcessSensor, A: RelayActuator, C: Clock> AutotuneSession<S, A, C> {
    /// Create a session around a configured tuner
    pub fn new(sensor: S, actuator: A, clock: C, tuner: Autotuner) -> Self {
        Self {
            sensor,
            actuator,
            clock,
            tuner,
        }
    }

    /// Start the relay test and apply the initial (high) output
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.tuner.start_tuning_loop(self.clock.now());
        if let Err(err) = self.actuator.apply(self.tuner.output()) {
            self.tuner.cancel();
            return Err(err.into());
        }
        Ok(())
    }

    /// Cancel the test and park the actuator
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.tuner.cancel();
        self.park()
    }

    /// Run one sample of the relay test
    pub fn update(&mut self) -> Result<SessionStatus, SessionError> {
        match self.tuner.state() {
            AutotuneState::Finished => return self.complete(),
            AutotuneState::Failed(err) => return Err(err.into()),
            _ => {}
        }

        let input = match self.sensor.read() {
            Ok(input) => input,
            Err(err) => {
                self.tuner.cancel();
                // The sensor fault is the error worth reporting
                let _ = self.park();
                return Err(err.into());
            }
        };

        let output = match self.tuner.tune_pid(input, self.clock.now()) {
            Ok(output) => output,
            Err(err) => {
                let _ = self.park();
                return Err(err.into());
            }
        };

        if let Err(err) = self.actuator.apply(output) {
            self.tuner.cancel();
            let _ = self.park();
            return Err(err.into());
        }

        if self.tuner.is_finished() {
            return self.complete();
        }

        Ok(SessionStatus::Running {
            cycle: self.tuner.cycle(),
            output,
        })
    }

    fn complete(&self) -> Result<SessionStatus, SessionError> {
        match self.tuner.result() {
            Some(result) => Ok(SessionStatus::Complete(*result)),
            None => Err(SessionError::Tune(TuneError::NotStarted)),
        }
    }

    fn park(&mut self) -> Result<(), SessionError> {
        self.actuator.apply(self.tuner.config().output_min)?;
        Ok(())
    }

    /// Get the tuner
    pub fn tuner(&self) -> &Autotuner {
        &self.tuner
    }

    /// Get access to sensor
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Get access to actuator
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Tear the session down into its parts
    pub fn into_parts(self) -> (S, A, C, Autotuner) {
        (self.sensor, self.actuator, self.clock, self.tuner)
    }
}
