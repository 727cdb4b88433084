//! Speed Kalman filter
//!
//! Constant-acceleration model over `[v, a]` with a precomputed steady-state
//! gain. Produces the filtered speed and the acceleration estimate from the
//! fused wheel speed.

use crate::config::DT_CTRL;
use nalgebra::{Matrix2, RowVector2, Vector2};
use serde::{Deserialize, Serialize};

/// Steady-state gain for dt = 0.01
const GAIN: [f64; 2] = [0.12287673, 0.29666309];

/// Measurement jump that resets the filter instead of smoothing through it
const RESET_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedFilter {
    x: Vector2<f64>,
    a: Matrix2<f64>,
    c: RowVector2<f64>,
    k: Vector2<f64>,
}

impl SpeedFilter {
    pub fn new(v_init: f64) -> Self {
        Self::with_dt(v_init, DT_CTRL)
    }

    pub fn with_dt(v_init: f64, dt: f64) -> Self {
        Self {
            x: Vector2::new(v_init, 0.0),
            a: Matrix2::new(1.0, dt, 0.0, 1.0),
            c: RowVector2::new(1.0, 0.0),
            k: Vector2::new(GAIN[0], GAIN[1]),
        }
    }

    /// Filtered speed
    pub fn speed(&self) -> f64 {
        self.x[0]
    }

    /// Estimated acceleration
    pub fn accel(&self) -> f64 {
        self.x[1]
    }

    pub fn reset(&mut self, v: f64) {
        self.x = Vector2::new(v, 0.0);
    }

    /// Feed one raw speed measurement; returns (speed, accel)
    pub fn update(&mut self, meas: f64) -> (f64, f64) {
        if (meas - self.speed()).abs() > RESET_THRESHOLD {
            log::trace!("speed filter reset {:.2} -> {:.2}", self.speed(), meas);
            self.reset(meas);
            return (self.speed(), self.accel());
        }

        let predicted = self.a * self.x;
        let innovation = meas - (self.c * predicted)[0];
        self.x = predicted + self.k * innovation;

        (self.speed(), self.accel())
    }
}

impl Default for SpeedFilter {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step() {
        let mut filter = SpeedFilter::new(10.0);
        let (v, a) = filter.update(11.0);
        assert!((v - (10.0 + GAIN[0])).abs() < 1e-9);
        assert!((a - GAIN[1]).abs() < 1e-9);
    }

    #[test]
    fn test_converges_to_constant_speed() {
        let mut filter = SpeedFilter::new(9.0);
        for _ in 0..500 {
            filter.update(10.0);
        }
        assert!((filter.speed() - 10.0).abs() < 1e-3);
        assert!(filter.accel().abs() < 1e-3);
    }

    #[test]
    fn test_large_jump_resets() {
        let mut filter = SpeedFilter::new(0.0);
        filter.update(0.5);
        let (v, a) = filter.update(20.0);
        assert_eq!(v, 20.0);
        assert_eq!(a, 0.0);
    }

    #[test]
    fn test_tracks_ramp() {
        let mut filter = SpeedFilter::new(0.0);
        // 1 m/s^2
        for i in 1..=1000 {
            filter.update(i as f64 * DT_CTRL);
        }
        assert!((filter.accel() - 1.0).abs() < 0.05);
    }
}
