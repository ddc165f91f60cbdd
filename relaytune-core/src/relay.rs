//! Relay switch and extremum tracker
//!
//! A pure zero-crossing relay: the output flips the moment the process
//! value reaches the setpoint. There is no hysteresis band; the plant's
//! own lag is what gives the limit cycle a finite amplitude.
//!
//! That lag also carries the process past the setpoint after every flip,
//! so the oscillation peak lands in the low half and the trough in the
//! high half. Each half-cycle therefore reports both of its extremes.

/// Forced output level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayLevel {
    /// Driving `output_max`
    High,
    /// Driving `output_min`
    Low,
}

impl RelayLevel {
    /// The opposite level
    pub const fn toggled(self) -> Self {
        match self {
            RelayLevel::High => RelayLevel::Low,
            RelayLevel::Low => RelayLevel::High,
        }
    }
}

/// One finished half-cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HalfCycle {
    /// Level the relay held during this half-cycle
    pub level: RelayLevel,
    /// Time spent at that level (timestamp units)
    pub duration: u32,
    /// Lowest input from the flip that started this half to the one that ended it
    pub lowest: f32,
    /// Highest input over the same span
    pub highest: f32,
}

/// Relay switch with running min/max since the last flip
#[derive(Debug, Clone)]
pub struct RelaySwitch {
    target: f32,
    level: RelayLevel,
    running_min: f32,
    running_max: f32,
    last_flip: u32,
}

impl RelaySwitch {
    /// Start a relay test at `now`, driving high
    ///
    /// Both extremes start at the target so the first half-cycle's peak
    /// is never below the setpoint.
    pub fn new(target: f32, now: u32) -> Self {
        Self {
            target,
            level: RelayLevel::High,
            running_min: target,
            running_max: target,
            last_flip: now,
        }
    }

    /// Current relay level
    pub fn level(&self) -> RelayLevel {
        self.level
    }

    /// Lowest input seen since the last flip
    pub fn running_min(&self) -> f32 {
        self.running_min
    }

    /// Highest input seen since the last flip
    pub fn running_max(&self) -> f32 {
        self.running_max
    }

    /// Timestamp of the last flip (or of the start)
    pub fn last_flip(&self) -> u32 {
        self.last_flip
    }

    /// Feed one sample
    ///
    /// Returns the half-cycle that just ended if this sample flipped the
    /// relay. Durations use wrapping subtraction, so a free-running `u32`
    /// microsecond counter may roll over mid-test.
    pub fn observe(&mut self, input: f32, now: u32) -> Option<HalfCycle> {
        self.running_min = self.running_min.min(input);
        self.running_max = self.running_max.max(input);

        let crossed = match self.level {
            RelayLevel::High => input >= self.target,
            RelayLevel::Low => input <= self.target,
        };
        if !crossed {
            return None;
        }

        let finished = HalfCycle {
            level: self.level,
            duration: now.wrapping_sub(self.last_flip),
            lowest: self.running_min,
            highest: self.running_max,
        };

        self.level = self.level.toggled();
        self.last_flip = now;
        self.running_min = input;
        self.running_max = input;

        Some(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_high_at_target() {
        let relay = RelaySwitch::new(50.0, 1000);
        assert_eq!(relay.level(), RelayLevel::High);
        assert_eq!(relay.running_min(), 50.0);
        assert_eq!(relay.running_max(), 50.0);
        assert_eq!(relay.last_flip(), 1000);
    }

    #[test]
    fn test_high_flips_when_input_reaches_target() {
        let mut relay = RelaySwitch::new(50.0, 0);

        assert_eq!(relay.observe(40.0, 100), None);
        assert_eq!(relay.observe(49.9, 200), None);

        let half = relay.observe(50.0, 300).unwrap();
        assert_eq!(half.level, RelayLevel::High);
        assert_eq!(half.duration, 300);
        assert_eq!(half.lowest, 40.0);
        assert_eq!(half.highest, 50.0);
        assert_eq!(relay.level(), RelayLevel::Low);
        assert_eq!(relay.last_flip(), 300);
    }

    #[test]
    fn test_low_half_carries_overshoot_peak() {
        let mut relay = RelaySwitch::new(50.0, 0);
        relay.observe(52.0, 10).unwrap();

        assert_eq!(relay.observe(53.5, 20), None);
        assert_eq!(relay.observe(51.0, 30), None);
        let half = relay.observe(48.0, 40).unwrap();

        assert_eq!(half.level, RelayLevel::Low);
        assert_eq!(half.duration, 30);
        assert_eq!(half.highest, 53.5);
        assert_eq!(half.lowest, 48.0);
        assert_eq!(relay.level(), RelayLevel::High);
    }

    #[test]
    fn test_extremes_reset_to_flip_sample() {
        let mut relay = RelaySwitch::new(50.0, 0);
        relay.observe(55.0, 10).unwrap();
        assert_eq!(relay.running_min(), 55.0);
        assert_eq!(relay.running_max(), 55.0);

        // Overshoot after the flip is attributed to the low half
        relay.observe(57.0, 20);
        assert_eq!(relay.running_max(), 57.0);
        assert_eq!(relay.running_min(), 55.0);
    }

    #[test]
    fn test_running_bounds_contain_input() {
        let mut relay = RelaySwitch::new(0.0, 0);
        for (i, input) in [-3.0, -1.0, -2.5, -0.5].iter().enumerate() {
            relay.observe(*input, i as u32);
            assert!(relay.running_min() <= *input);
            assert!(relay.running_max() >= *input);
        }
    }

    #[test]
    fn test_duration_survives_timer_rollover() {
        let start = u32::MAX - 99;
        let mut relay = RelaySwitch::new(1.0, start);
        let half = relay.observe(1.0, 400).unwrap();
        assert_eq!(half.duration, 500);
    }
}
