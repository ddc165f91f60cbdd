//! Tuner configuration
//!
//! Everything the relay test needs to know before it starts. The
//! configuration is frozen for the duration of a test; the tuner rejects
//! changes while one is running.

use crate::relay::RelayLevel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of averaged oscillation cycles when none is configured
pub const DEFAULT_TUNING_CYCLES: u16 = 10;

/// Ziegler-Nichols gain table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ZnMode {
    /// Classic PID rule (fastest, most overshoot)
    BasicPid,
    /// "Some overshoot" rule
    LessOvershoot,
    /// "No overshoot" rule
    #[default]
    NoOvershoot,
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Output minimum is not strictly below output maximum
    InvalidOutputRange,
    /// Cycle count is zero
    InvalidCycleCount,
    /// A value is NaN or infinite
    NonFiniteValue,
    /// Safety limit does not lie above the target
    LimitBelowTarget,
    /// Timeout of zero ticks
    InvalidTimeout,
    /// A relay test is running; configuration is frozen
    TuningInProgress,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ConfigError::InvalidOutputRange => "output minimum must be below output maximum",
            ConfigError::InvalidCycleCount => "tuning cycles must be at least 1",
            ConfigError::NonFiniteValue => "configuration value is not finite",
            ConfigError::LimitBelowTarget => "input limit must be above the target value",
            ConfigError::InvalidTimeout => "timeout must be non-zero",
            ConfigError::TuningInProgress => "configuration is frozen while tuning",
        };
        f.write_str(msg)
    }
}

/// Relay test configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TunerConfig {
    /// Setpoint the relay oscillates around
    pub target_input_value: f32,
    /// Output applied while the relay is low
    pub output_min: f32,
    /// Output applied while the relay is high
    pub output_max: f32,
    /// Gain table used once the test completes
    pub zn_mode: ZnMode,
    /// Completed cycles averaged before the result is final
    pub cycles: u16,
    /// Abort the test if the input reaches this value
    ///
    /// Protects plants that must never overshoot far past the setpoint
    /// (heaters, end-stopped axes).
    pub input_limit: Option<f32>,
    /// Abort the test after this many timestamp units
    pub timeout: Option<u32>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            target_input_value: 0.0,
            output_min: 0.0,
            output_max: 255.0, // Full PWM duty
            zn_mode: ZnMode::NoOvershoot,
            cycles: DEFAULT_TUNING_CYCLES,
            input_limit: None,
            timeout: None,
        }
    }
}

impl TunerConfig {
    /// Check every field and cross-field constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_input_value.is_finite() {
            return Err(ConfigError::NonFiniteValue);
        }
        check_output_range(self.output_min, self.output_max)?;
        check_cycles(self.cycles)?;

        if let Some(limit) = self.input_limit {
            if !limit.is_finite() {
                return Err(ConfigError::NonFiniteValue);
            }
            if limit <= self.target_input_value {
                return Err(ConfigError::LimitBelowTarget);
            }
        }

        if self.timeout == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    /// Relay half-amplitude `d = (max - min) / 2`
    pub fn relay_amplitude(&self) -> f32 {
        (self.output_max - self.output_min) / 2.0
    }

    /// Output value commanded for a relay level
    pub fn output_for(&self, level: RelayLevel) -> f32 {
        match level {
            RelayLevel::High => self.output_max,
            RelayLevel::Low => self.output_min,
        }
    }
}

fn check_output_range(min: f32, max: f32) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ConfigError::NonFiniteValue);
    }
    if min >= max {
        return Err(ConfigError::InvalidOutputRange);
    }
    Ok(())
}

fn check_cycles(cycles: u16) -> Result<(), ConfigError> {
    if cycles < 1 {
        return Err(ConfigError::InvalidCycleCount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TunerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.cycles, 10);
        assert_eq!(config.zn_mode, ZnMode::NoOvershoot);
    }

    #[test]
    fn test_equal_output_range_rejected() {
        let config = TunerConfig {
            output_min: 5.0,
            output_max: 5.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidOutputRange));
    }

    #[test]
    fn test_inverted_output_range_rejected() {
        assert_eq!(
            check_output_range(10.0, -10.0),
            Err(ConfigError::InvalidOutputRange)
        );
        assert_eq!(
            check_output_range(f32::NAN, 1.0),
            Err(ConfigError::NonFiniteValue)
        );
    }

    #[test]
    fn test_zero_cycles_rejected() {
        let config = TunerConfig {
            cycles: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidCycleCount));
    }

    #[test]
    fn test_limit_must_exceed_target() {
        let config = TunerConfig {
            target_input_value: 45.0,
            input_limit: Some(45.0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::LimitBelowTarget));

        let config = TunerConfig {
            input_limit: Some(55.0),
            ..config
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = TunerConfig {
            timeout: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));
    }

    #[test]
    fn test_relay_amplitude_and_levels() {
        let config = TunerConfig {
            output_min: -20.0,
            output_max: 80.0,
            ..Default::default()
        };
        assert_eq!(config.relay_amplitude(), 50.0);
        assert_eq!(config.output_for(RelayLevel::High), 80.0);
        assert_eq!(config.output_for(RelayLevel::Low), -20.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_decoded_config_still_validated() {
        // Config arriving over a wire or from flash must not bypass checks
        let bad = TunerConfig {
            output_min: 100.0,
            output_max: 0.0,
            ..Default::default()
        };
        let bytes = postcard::to_allocvec(&bad).unwrap();
        let decoded: TunerConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, bad);
        assert_eq!(decoded.validate(), Err(ConfigError::InvalidOutputRange));
    }
}
