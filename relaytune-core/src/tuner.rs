//! Relay-feedback autotune state machine
//!
//! Drives the plant with a two-level relay around the setpoint, averages
//! the resulting limit cycle over the configured number of cycles, and
//! maps the measured ultimate gain and period to PID gains.
//!
//! ```text
//! Idle ──start──▶ Settling ──1st cycle──▶ Oscillating ──N cycles──▶ Finished
//!                    │                        │
//!                    └──────── fault ─────────┴──────────────────▶ Failed
//! ```
//!
//! The caller owns the loop: call [`Autotuner::start_tuning_loop`] right
//! before the first sample, then [`Autotuner::tune_pid`] once per sample,
//! applying the returned output before the next one.

use crate::accumulator::{CycleAccumulator, CycleEvent};
use crate::config::{ConfigError, TunerConfig, ZnMode};
use crate::gains::{PidGains, UltimateParams};
use crate::relay::RelaySwitch;

/// Autotune state as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AutotuneState {
    /// Not started
    Idle,
    /// First cycle in progress; measurements are discarded
    Settling,
    /// Collecting cycles
    Oscillating,
    /// Successfully completed, gains available
    Finished,
    /// Aborted; the output is parked at `output_min`
    Failed(TuneError),
}

/// Autotune failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TuneError {
    /// `tune_pid` called before `start_tuning_loop`
    NotStarted,
    /// Oscillation amplitude or period was zero
    NoOscillation,
    /// Input reached the configured safety limit
    OverLimit,
    /// Test exceeded the configured timeout
    Timeout,
    /// Input sample was NaN or infinite
    InvalidInput,
    /// Aborted by the caller
    Cancelled,
}

impl core::fmt::Display for TuneError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            TuneError::NotStarted => "tuning loop not started",
            TuneError::NoOscillation => "no oscillation detected",
            TuneError::OverLimit => "input exceeded safety limit",
            TuneError::Timeout => "tuning timed out",
            TuneError::InvalidInput => "input is not a finite number",
            TuneError::Cancelled => "tuning cancelled",
        };
        f.write_str(msg)
    }
}

/// Outcome of a completed relay test
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TuneResult {
    /// Gains for the configured mode
    pub gains: PidGains,
    /// Averaged ultimate gain and period
    pub ultimate: UltimateParams,
    /// Averaged oscillation amplitude (input units)
    pub amplitude: f32,
    /// Relay half-amplitude used for the test
    pub relay_amplitude: f32,
    /// Cycles the averages cover
    pub cycles: u16,
}

impl TuneResult {
    /// Gains for another Ziegler-Nichols table from the same measurements
    pub fn gains_for(&self, mode: ZnMode) -> PidGains {
        self.ultimate.gains(mode)
    }
}

/// Running portion of a relay test
#[derive(Debug, Clone)]
struct RelayTest {
    relay: RelaySwitch,
    accumulator: CycleAccumulator,
    started_at: u32,
    half_cycles: u32,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Running(RelayTest),
    Finished(TuneResult),
    Failed { error: TuneError, cycle: u16 },
}

/// What one sample did to a running test
enum Step {
    Continue,
    Finished(TuneResult),
}

/// Relay-feedback PID autotuner
#[derive(Debug, Clone)]
pub struct Autotuner {
    config: TunerConfig,
    phase: Phase,
    output: f32,
    /// Gains from the most recent successful test
    gains: PidGains,
}

impl Default for Autotuner {
    fn default() -> Self {
        Self::new()
    }
}

impl Autotuner {
    /// Create a tuner with the default configuration
    pub fn new() -> Self {
        let config = TunerConfig::default();
        Self {
            output: config.output_min,
            config,
            phase: Phase::Idle,
            gains: PidGains::ZERO,
        }
    }

    /// Create a tuner from a complete configuration
    pub fn with_config(config: TunerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            output: config.output_min,
            config,
            phase: Phase::Idle,
            gains: PidGains::ZERO,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Set the setpoint to oscillate around
    pub fn set_target_input_value(&mut self, target: f32) -> Result<(), ConfigError> {
        self.update_config(|c| c.target_input_value = target)
    }

    /// Set the relay output levels
    pub fn set_output_range(&mut self, min: f32, max: f32) -> Result<(), ConfigError> {
        self.update_config(|c| {
            c.output_min = min;
            c.output_max = max;
        })?;
        self.output = min;
        Ok(())
    }

    /// Select the Ziegler-Nichols table
    pub fn set_zn_mode(&mut self, mode: ZnMode) -> Result<(), ConfigError> {
        self.update_config(|c| c.zn_mode = mode)
    }

    /// Set how many cycles are averaged (default 10)
    pub fn set_tuning_cycles(&mut self, cycles: u16) -> Result<(), ConfigError> {
        self.update_config(|c| c.cycles = cycles)
    }

    /// Set or clear the input safety limit
    pub fn set_input_limit(&mut self, limit: Option<f32>) -> Result<(), ConfigError> {
        self.update_config(|c| c.input_limit = limit)
    }

    /// Set or clear the timeout (timestamp units)
    pub fn set_timeout(&mut self, timeout: Option<u32>) -> Result<(), ConfigError> {
        self.update_config(|c| c.timeout = timeout)
    }

    /// Apply a change to a copy of the config and keep it only if valid
    fn update_config(&mut self, change: impl FnOnce(&mut TunerConfig)) -> Result<(), ConfigError> {
        self.ensure_configurable()?;
        let mut candidate = self.config;
        change(&mut candidate);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    fn ensure_configurable(&self) -> Result<(), ConfigError> {
        match self.phase {
            Phase::Running(_) => Err(ConfigError::TuningInProgress),
            _ => Ok(()),
        }
    }

    /// Reset all running state and start driving the relay high
    ///
    /// Must be called immediately before the first [`tune_pid`] with the
    /// current time from the same clock. Calling it again restarts the
    /// test from scratch; gains from an earlier test stay readable until
    /// the new one finishes.
    ///
    /// [`tune_pid`]: Autotuner::tune_pid
    pub fn start_tuning_loop(&mut self, now: u32) {
        let relay = RelaySwitch::new(self.config.target_input_value, now);
        self.output = self.config.output_for(relay.level());
        self.phase = Phase::Running(RelayTest {
            relay,
            accumulator: CycleAccumulator::new(),
            started_at: now,
            half_cycles: 0,
        });

        info!(
            "autotune start: target={} output={}..{} cycles={}",
            self.config.target_input_value,
            self.config.output_min,
            self.config.output_max,
            self.config.cycles
        );
    }

    /// Process one sample and return the output to apply
    ///
    /// After the test finishes this is a no-op returning the last output
    /// (`output_min`). After a failure it keeps returning that failure;
    /// the output is parked at `output_min` and readable via [`output`].
    ///
    /// [`output`]: Autotuner::output
    pub fn tune_pid(&mut self, input: f32, now: u32) -> Result<f32, TuneError> {
        let test = match &mut self.phase {
            Phase::Idle => return Err(TuneError::NotStarted),
            Phase::Finished(_) => return Ok(self.output),
            Phase::Failed { error, .. } => return Err(*error),
            Phase::Running(test) => test,
        };

        match advance(&self.config, test, input, now) {
            Ok(Step::Continue) => {
                self.output = self.config.output_for(test.relay.level());
                Ok(self.output)
            }
            Ok(Step::Finished(result)) => {
                info!(
                    "autotune done: ku={} pu={} kp={} ki={} kd={}",
                    result.ultimate.ku,
                    result.ultimate.pu,
                    result.gains.kp,
                    result.gains.ki,
                    result.gains.kd
                );
                self.output = self.config.output_min;
                self.gains = result.gains;
                self.phase = Phase::Finished(result);
                Ok(self.output)
            }
            Err(error) => {
                self.abort(error);
                Err(error)
            }
        }
    }

    /// Abort a running test
    ///
    /// Parks the output at `output_min`. Has no effect unless a test is
    /// running.
    pub fn cancel(&mut self) {
        if matches!(self.phase, Phase::Running(_)) {
            self.abort(TuneError::Cancelled);
        }
    }

    fn abort(&mut self, error: TuneError) {
        let cycle = self.cycle();
        warn!("autotune failed at cycle {}: {}", cycle, error);
        self.output = self.config.output_min;
        self.phase = Phase::Failed { error, cycle };
    }

    /// Current state
    pub fn state(&self) -> AutotuneState {
        match &self.phase {
            Phase::Idle => AutotuneState::Idle,
            Phase::Running(test) if test.accumulator.is_primed() => AutotuneState::Oscillating,
            Phase::Running(_) => AutotuneState::Settling,
            Phase::Finished(_) => AutotuneState::Finished,
            Phase::Failed { error, .. } => AutotuneState::Failed(*error),
        }
    }

    /// Is the tuning finished?
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Completed (averaged) cycles so far
    pub fn cycle(&self) -> u16 {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Running(test) => test.accumulator.completed(),
            Phase::Finished(result) => result.cycles,
            Phase::Failed { cycle, .. } => *cycle,
        }
    }

    /// Relay flips seen in the running test (0 when none is running)
    pub fn half_cycle_count(&self) -> u32 {
        match &self.phase {
            Phase::Running(test) => test.half_cycles,
            _ => 0,
        }
    }

    /// Time since `start_tuning_loop`, if a test is running
    pub fn elapsed(&self, now: u32) -> Option<u32> {
        match &self.phase {
            Phase::Running(test) => Some(now.wrapping_sub(test.started_at)),
            _ => None,
        }
    }

    /// Output most recently commanded
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Result of the completed test
    pub fn result(&self) -> Option<&TuneResult> {
        match &self.phase {
            Phase::Finished(result) => Some(result),
            _ => None,
        }
    }

    /// Most recently computed gains (zero before any test completes)
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Proportional gain of the most recent result
    pub fn kp(&self) -> f32 {
        self.gains.kp
    }

    /// Integral gain of the most recent result
    pub fn ki(&self) -> f32 {
        self.gains.ki
    }

    /// Derivative gain of the most recent result
    pub fn kd(&self) -> f32 {
        self.gains.kd
    }
}

/// One sample through the relay/accumulator/gain pipeline
fn advance(
    config: &TunerConfig,
    test: &mut RelayTest,
    input: f32,
    now: u32,
) -> Result<Step, TuneError> {
    if !input.is_finite() {
        return Err(TuneError::InvalidInput);
    }
    if let Some(limit) = config.input_limit {
        if input >= limit {
            return Err(TuneError::OverLimit);
        }
    }
    if let Some(timeout) = config.timeout {
        if now.wrapping_sub(test.started_at) >= timeout {
            return Err(TuneError::Timeout);
        }
    }

    let half = match test.relay.observe(input, now) {
        Some(half) => half,
        None => return Ok(Step::Continue),
    };
    test.half_cycles = test.half_cycles.saturating_add(1);
    debug!(
        "relay flip: left {} after {} range={}..{}",
        half.level, half.duration, half.lowest, half.highest
    );

    match test.accumulator.push(half) {
        CycleEvent::Pending => Ok(Step::Continue),
        CycleEvent::Discarded => {
            debug!("settling cycle discarded");
            Ok(Step::Continue)
        }
        CycleEvent::Completed(sample) => {
            debug!(
                "cycle {}: period={} amplitude={}",
                test.accumulator.completed(),
                sample.period,
                sample.amplitude
            );
            if test.accumulator.completed() < config.cycles {
                return Ok(Step::Continue);
            }
            finish(config, &test.accumulator).map(Step::Finished)
        }
    }
}

/// Turn the averaged measurements into a result
fn finish(config: &TunerConfig, accumulator: &CycleAccumulator) -> Result<TuneResult, TuneError> {
    let (period, amplitude) = match (
        accumulator.average_period(),
        accumulator.average_amplitude(),
    ) {
        (Some(period), Some(amplitude)) => (period, amplitude),
        _ => return Err(TuneError::NoOscillation),
    };

    let relay_amplitude = config.relay_amplitude();
    let ultimate = UltimateParams::from_relay(relay_amplitude, amplitude, period)?;

    Ok(TuneResult {
        gains: ultimate.gains(config.zn_mode),
        ultimate,
        amplitude,
        relay_amplitude,
        cycles: accumulator.completed(),
    })
}
