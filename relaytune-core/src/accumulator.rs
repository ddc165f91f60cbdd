//! Period and amplitude accumulator
//!
//! Pairs half-cycles into full oscillation cycles and keeps the running
//! sums behind the average ultimate period and oscillation amplitude.
//! The relay always starts high, so a cycle closes on every low half.
//! The peak is taken from the low half and the trough from the high half,
//! where the process overshoots after each flip.

use crate::relay::{HalfCycle, RelayLevel};

/// Measurements from one full cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleSample {
    /// `t_high + t_low` in timestamp units
    pub period: u32,
    /// Half of peak-to-trough
    pub amplitude: f32,
}

/// What a half-cycle did to the accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleEvent {
    /// Half of a cycle is stored, waiting for its partner
    Pending,
    /// First full cycle; thrown away as the settling transient
    Discarded,
    /// A cycle was folded into the averages
    Completed(CycleSample),
}

/// Running sums over completed cycles
#[derive(Debug, Clone, Default)]
pub struct CycleAccumulator {
    pending_high: Option<HalfCycle>,
    primed: bool,
    completed: u16,
    period_sum: u64,
    amplitude_sum: f32,
}

impl CycleAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a finished half-cycle
    pub fn push(&mut self, half: HalfCycle) -> CycleEvent {
        let high = match half.level {
            RelayLevel::High => {
                self.pending_high = Some(half);
                return CycleEvent::Pending;
            }
            RelayLevel::Low => match self.pending_high.take() {
                Some(high) => high,
                // A low half with no high half before it cannot close a cycle
                None => return CycleEvent::Pending,
            },
        };

        if !self.primed {
            self.primed = true;
            return CycleEvent::Discarded;
        }

        let sample = CycleSample {
            period: high.duration.saturating_add(half.duration),
            amplitude: (half.highest - high.lowest) / 2.0,
        };

        self.period_sum += u64::from(sample.period);
        self.amplitude_sum += sample.amplitude;
        self.completed = self.completed.saturating_add(1);

        CycleEvent::Completed(sample)
    }

    /// Has the settling cycle been discarded yet?
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Number of cycles folded into the averages
    pub fn completed(&self) -> u16 {
        self.completed
    }

    /// Average period over completed cycles
    pub fn average_period(&self) -> Option<f32> {
        if self.completed == 0 {
            return None;
        }
        Some(self.period_sum as f32 / f32::from(self.completed))
    }

    /// Average amplitude over completed cycles
    pub fn average_amplitude(&self) -> Option<f32> {
        if self.completed == 0 {
            return None;
        }
        Some(self.amplitude_sum / f32::from(self.completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// High half that bottomed out at `trough` before rising to the setpoint
    fn high(duration: u32, trough: f32) -> HalfCycle {
        HalfCycle {
            level: RelayLevel::High,
            duration,
            lowest: trough,
            highest: 50.0,
        }
    }

    /// Low half that overshot to `peak` before falling to the setpoint
    fn low(duration: u32, peak: f32) -> HalfCycle {
        HalfCycle {
            level: RelayLevel::Low,
            duration,
            lowest: 50.0,
            highest: peak,
        }
    }

    #[test]
    fn test_first_cycle_discarded() {
        let mut acc = CycleAccumulator::new();
        assert!(!acc.is_primed());

        assert_eq!(acc.push(high(500, 20.0)), CycleEvent::Pending);
        assert_eq!(acc.push(low(100, 60.0)), CycleEvent::Discarded);

        assert!(acc.is_primed());
        assert_eq!(acc.completed(), 0);
        assert_eq!(acc.average_period(), None);
        assert_eq!(acc.average_amplitude(), None);
    }

    #[test]
    fn test_cycle_sample() {
        let mut acc = CycleAccumulator::new();
        acc.push(high(10, 50.0));
        acc.push(low(10, 50.0));

        acc.push(high(120, 46.0));
        let event = acc.push(low(80, 54.0));

        assert_eq!(
            event,
            CycleEvent::Completed(CycleSample {
                period: 200,
                amplitude: 4.0,
            })
        );
        assert_eq!(acc.completed(), 1);
    }

    #[test]
    fn test_running_averages() {
        let mut acc = CycleAccumulator::new();
        acc.push(high(1, 0.0));
        acc.push(low(1, 0.0));

        // Periods 100 and 300, amplitudes 1 and 3
        acc.push(high(50, 9.0));
        acc.push(low(50, 11.0));
        acc.push(high(150, 7.0));
        acc.push(low(150, 13.0));

        assert_eq!(acc.completed(), 2);
        assert_eq!(acc.average_period(), Some(200.0));
        assert_eq!(acc.average_amplitude(), Some(2.0));
    }

    #[test]
    fn test_amplitude_uses_overshoot_not_flip_samples() {
        let mut acc = CycleAccumulator::new();
        acc.push(high(10, 50.0));
        acc.push(low(10, 50.0));

        // Flips happen just past the setpoint; the process keeps going
        acc.push(HalfCycle {
            level: RelayLevel::High,
            duration: 80,
            lowest: 44.0,
            highest: 50.5,
        });
        let event = acc.push(HalfCycle {
            level: RelayLevel::Low,
            duration: 80,
            lowest: 49.5,
            highest: 56.0,
        });

        assert_eq!(
            event,
            CycleEvent::Completed(CycleSample {
                period: 160,
                amplitude: 6.0,
            })
        );
    }

    #[test]
    fn test_orphan_low_half_ignored() {
        let mut acc = CycleAccumulator::new();
        assert_eq!(acc.push(low(10, 1.0)), CycleEvent::Pending);
        assert!(!acc.is_primed());
    }
}
