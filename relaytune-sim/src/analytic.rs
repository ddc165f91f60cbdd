//! Closed-form relay oscillation of a first-order-plus-dead-time plant
//!
//! For `G(s) = e^(−Ls) / (τs + 1)` under an ideal relay whose levels are
//! symmetric about the setpoint, the process value keeps moving towards
//! the old level for `L` after each switch and then decays towards the
//! new one. Solving for the next setpoint crossing gives the half-period
//! `L + τ·ln(2 − e^(−L/τ))`.

use num_traits::Float;

/// Limit cycle period `2·(L + τ·ln(2 − e^(−L/τ)))`
pub fn relay_limit_cycle_period(tau: f32, dead_time: f32) -> f32 {
    let decay = Float::exp(-dead_time / tau);
    2.0 * (dead_time + tau * Float::ln(2.0 - decay))
}

/// Limit cycle amplitude `d·(1 − e^(−L/τ))` for relay half-amplitude `d`
pub fn relay_limit_cycle_amplitude(relay_amplitude: f32, tau: f32, dead_time: f32) -> f32 {
    relay_amplitude * (1.0 - Float::exp(-dead_time / tau))
}
