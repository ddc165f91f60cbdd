//! Ultimate gain estimate and Ziegler-Nichols gain tables
//!
//! The relay test measures the oscillation amplitude `a` and period `Pu`
//! it induces with a relay of half-amplitude `d`. The describing-function
//! approximation gives the ultimate gain
//!
//! ```text
//! Ku = 4d / (π·a)
//! ```
//!
//! and a Ziegler-Nichols table turns `(Ku, Pu)` into `Kp`, `Ti`, `Td`,
//! from which `Ki = Kp / Ti` and `Kd = Kp · Td`.

use core::f32::consts::PI;

use crate::config::ZnMode;
use crate::tuner::TuneError;

/// Multipliers for one row of the Ziegler-Nichols table
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZnConstants {
    /// `Kp = kp · Ku`
    pub kp: f32,
    /// `Ti = ti · Pu`
    pub ti: f32,
    /// `Td = td · Pu`
    pub td: f32,
}

impl ZnMode {
    /// Table row for this mode
    pub const fn constants(self) -> ZnConstants {
        match self {
            ZnMode::BasicPid => ZnConstants {
                kp: 0.6,
                ti: 0.5,
                td: 0.125,
            },
            ZnMode::LessOvershoot => ZnConstants {
                kp: 0.33,
                ti: 0.5,
                td: 0.33,
            },
            ZnMode::NoOvershoot => ZnConstants {
                kp: 0.2,
                ti: 0.5,
                td: 0.33,
            },
        }
    }
}

/// Relay-feedback ultimate gain `Ku = 4d / (π·a)`
///
/// Fails with [`TuneError::NoOscillation`] when the amplitude is not
/// positive, which is what a stuck or never-crossing process produces.
pub fn ultimate_gain(relay_amplitude: f32, oscillation_amplitude: f32) -> Result<f32, TuneError> {
    if !(oscillation_amplitude > 0.0) {
        return Err(TuneError::NoOscillation);
    }

    let ku = (4.0 * relay_amplitude) / (PI * oscillation_amplitude);
    if !ku.is_finite() {
        return Err(TuneError::NoOscillation);
    }
    Ok(ku)
}

/// Ultimate gain and period of the plant
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UltimateParams {
    /// Ultimate gain (Ku)
    pub ku: f32,
    /// Ultimate period (Pu), timestamp units
    pub pu: f32,
}

impl UltimateParams {
    /// Derive `Ku`/`Pu` from relay measurements
    pub fn from_relay(
        relay_amplitude: f32,
        oscillation_amplitude: f32,
        period: f32,
    ) -> Result<Self, TuneError> {
        let ku = ultimate_gain(relay_amplitude, oscillation_amplitude)?;

        // A zero period means every flip landed on the same timestamp
        if !(period > 0.0) || !period.is_finite() {
            return Err(TuneError::NoOscillation);
        }

        Ok(Self { ku, pu: period })
    }

    /// Map through a Ziegler-Nichols table
    pub fn gains(&self, mode: ZnMode) -> PidGains {
        PidGains::ziegler_nichols(mode, self)
    }
}

/// PID gains
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    /// Proportional gain (Kp)
    pub kp: f32,
    /// Integral gain (Ki), per timestamp unit
    pub ki: f32,
    /// Derivative gain (Kd), timestamp units
    pub kd: f32,
}

impl PidGains {
    /// All gains zero
    pub const ZERO: Self = Self {
        kp: 0.0,
        ki: 0.0,
        kd: 0.0,
    };

    /// Apply the Ziegler-Nichols table for `mode`
    pub fn ziegler_nichols(mode: ZnMode, ultimate: &UltimateParams) -> Self {
        let c = mode.constants();
        let kp = c.kp * ultimate.ku;
        let ti = c.ti * ultimate.pu;
        let td = c.td * ultimate.pu;

        Self {
            kp,
            ki: kp / ti,
            kd: kp * td,
        }
    }

    /// Rescale for a PID loop that runs every `interval` timestamp units
    ///
    /// Incremental controllers sum `error · Ki` and difference errors once
    /// per sample rather than integrating over time, so the integral gain
    /// is multiplied by the interval and the derivative gain divided by it.
    /// Returns `None` for a non-positive or non-finite interval.
    pub fn per_sample(&self, interval: f32) -> Option<Self> {
        if !(interval > 0.0) || !interval.is_finite() {
            return None;
        }
        Some(Self {
            kp: self.kp,
            ki: self.ki * interval,
            kd: self.kd / interval,
        })
    }

    /// Check if any gain is non-zero
    pub fn is_configured(&self) -> bool {
        self.kp != 0.0 || self.ki != 0.0 || self.kd != 0.0
    }
}
