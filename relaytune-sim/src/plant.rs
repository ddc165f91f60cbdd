//! Plant models
//!
//! All models have unity static gain: held at output `u`, the process
//! value settles at `u`.

use heapless::Deque;
use num_traits::Float;

/// Simulation setup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimError {
    /// Dead time needs more samples than the delay line holds
    DelayTooLong,
}

/// A process driven one sample at a time
pub trait Plant {
    /// Current process value
    fn value(&self) -> f32;

    /// Hold `output` for one sample and return the new process value
    fn step(&mut self, output: f32) -> f32;
}

/// Discrete first-order lag
#[derive(Debug, Clone)]
pub struct FirstOrderLag {
    value: f32,
    alpha: f32,
}

impl FirstOrderLag {
    /// Create a lag with per-sample coefficient `alpha` (0 < α ≤ 1)
    pub fn new(initial: f32, alpha: f32) -> Self {
        Self {
            value: initial,
            alpha,
        }
    }

    /// Create a lag from a time constant and sample interval
    ///
    /// Uses the zero-order-hold discretisation `α = 1 − e^(−dt/τ)`, which
    /// is exact for an output held constant between samples.
    pub fn from_time_constant(initial: f32, tau: f32, dt: f32) -> Self {
        Self::new(initial, 1.0 - Float::exp(-dt / tau))
    }

    /// Per-sample coefficient
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Plant for FirstOrderLag {
    fn value(&self) -> f32 {
        self.value
    }

    fn step(&mut self, output: f32) -> f32 {
        self.value += self.alpha * (output - self.value);
        self.value
    }
}

/// First-order lag behind a dead time of whole samples
///
/// `N` is the delay line capacity and must exceed the delay.
#[derive(Debug, Clone)]
pub struct DeadTimePlant<const N: usize> {
    lag: FirstOrderLag,
    delay: usize,
    line: Deque<f32, N>,
}

impl<const N: usize> DeadTimePlant<N> {
    /// Create a plant whose delay line is pre-filled with `initial_output`
    pub fn new(lag: FirstOrderLag, delay: usize, initial_output: f32) -> Result<Self, SimError> {
        if delay >= N {
            return Err(SimError::DelayTooLong);
        }

        let mut line = Deque::new();
        for _ in 0..delay {
            line.push_back(initial_output)
                .map_err(|_| SimError::DelayTooLong)?;
        }

        Ok(Self { lag, delay, line })
    }

    /// Dead time in samples
    pub fn delay(&self) -> usize {
        self.delay
    }
}

impl<const N: usize> Plant for DeadTimePlant<N> {
    fn value(&self) -> f32 {
        self.lag.value()
    }

    fn step(&mut self, output: f32) -> f32 {
        // Capacity was checked against the delay in `new`
        let _ = self.line.push_back(output);
        let delayed = self.line.pop_front().unwrap_or(output);
        self.lag.step(delayed)
    }
}
