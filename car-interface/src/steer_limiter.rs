//! Steering torque rate limiter and EPS fault monitor
//!
//! Turns the planner's requested torque into the torque actually commanded:
//! bounded by the motor-reported torque, rate limited against the previous
//! command, clamped to the absolute ceiling, and forced to zero while control
//! is disabled or during the cooldown after an EPS fault.

use crate::config::{SteerFaultParams, SteerLimitParams};
use serde::{Deserialize, Serialize};

/// One cycle of limiter input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteerInput {
    /// Requested torque in command units
    pub requested: i32,
    pub cycle: u64,
    /// Steering assist state code reported by the EPS
    pub steer_state: i64,
    pub enabled: bool,
    /// Torque the EPS motor reports applying
    pub motor_torque: i32,
}

/// Torque to command this cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteerOutput {
    pub torque: i32,
    /// Torque request bit; false while disabled or cooling down
    pub request_active: bool,
    /// The request was clipped by a limit
    pub rate_limited: bool,
}

/// State persisted between cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteerCommandState {
    pub last_applied_torque: i32,
    /// Cycle of the most recent fault code, `None` if never seen
    pub last_fault_cycle: Option<u64>,
    pub rate_limited: bool,
}

pub struct TorqueRateLimiter {
    limits: SteerLimitParams,
    faults: SteerFaultParams,
    state: SteerCommandState,
}

impl TorqueRateLimiter {
    pub fn new(limits: SteerLimitParams, faults: SteerFaultParams) -> Self {
        Self {
            limits,
            faults,
            state: SteerCommandState::default(),
        }
    }

    pub fn state(&self) -> &SteerCommandState {
        &self.state
    }

    /// Convert a [-1, 1] steer fraction to command units
    pub fn requested_torque(&self, fraction: f64) -> i32 {
        let fraction = if fraction.is_finite() { fraction.clamp(-1.0, 1.0) } else { 0.0 };
        (fraction * self.limits.steer_max as f64).round() as i32
    }

    /// Whether torque is held at zero at `cycle` because of a recent fault
    pub fn in_cooldown(&self, cycle: u64) -> bool {
        self.state
            .last_fault_cycle
            .is_some_and(|fault| cycle.saturating_sub(fault) < self.faults.cooldown_cycles)
    }

    pub fn limit(&mut self, input: SteerInput) -> SteerOutput {
        if self.faults.fault_codes.contains(&input.steer_state) {
            if self.state.last_fault_cycle.is_none() || !self.in_cooldown(input.cycle) {
                log::debug!(
                    "EPS fault code {} at cycle {}, cutting steer torque",
                    input.steer_state,
                    input.cycle
                );
            }
            self.state.last_fault_cycle = Some(input.cycle);
        }

        let clamped = self.clamp(input.requested, input.motor_torque);
        let rate_limited = clamped != input.requested;

        let (torque, request_active) = if !input.enabled || self.in_cooldown(input.cycle) {
            (0, false)
        } else {
            (clamped, true)
        };

        log::trace!(
            "steer cycle {}: requested {} applied {} (limited: {})",
            input.cycle,
            input.requested,
            torque,
            rate_limited
        );

        self.state.last_applied_torque = torque;
        self.state.rate_limited = rate_limited;

        SteerOutput {
            torque,
            request_active,
            rate_limited,
        }
    }

    fn clamp(&self, requested: i32, motor_torque: i32) -> i32 {
        let SteerLimitParams {
            steer_max,
            delta_up,
            delta_down,
            error_max,
        } = self.limits;
        let last = self.state.last_applied_torque;

        // Stay within error_max of what the motor is actually doing
        let mut torque = match error_max {
            Some(err) => {
                let max_lim = (motor_torque.saturating_add(err)).max(err).min(steer_max);
                let min_lim = (motor_torque.saturating_sub(err)).min(-err).max(-steer_max);
                requested.clamp(min_lim, max_lim)
            }
            None => requested,
        };

        torque = if last > 0 {
            torque.clamp(
                last.saturating_sub(delta_down).max(-delta_up),
                last.saturating_add(delta_up),
            )
        } else {
            torque.clamp(
                last.saturating_sub(delta_up),
                last.saturating_add(delta_down).min(delta_up),
            )
        };

        torque.clamp(-steer_max, steer_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> TorqueRateLimiter {
        TorqueRateLimiter::new(SteerLimitParams::default(), SteerFaultParams::default())
    }

    fn input(requested: i32, cycle: u64) -> SteerInput {
        SteerInput {
            requested,
            cycle,
            steer_state: 5,
            enabled: true,
            motor_torque: 0,
        }
    }

    #[test]
    fn test_ramp_up_bounded_by_delta_up() {
        let mut limiter = limiter();
        let out = limiter.limit(input(1500, 0));
        assert_eq!(out.torque, 10);
        assert!(out.request_active);
        assert!(out.rate_limited);

        let out = limiter.limit(SteerInput { motor_torque: 10, ..input(1500, 1) });
        assert_eq!(out.torque, 20);
    }

    #[test]
    fn test_ramp_down_bounded_by_delta_down() {
        let mut limiter = limiter();
        let mut motor = 0;
        for cycle in 0..100 {
            motor = limiter.limit(SteerInput { motor_torque: motor, ..input(500, cycle) }).torque;
        }
        assert_eq!(motor, 500);

        let out = limiter.limit(SteerInput { motor_torque: 500, ..input(0, 100) });
        assert_eq!(out.torque, 475);
    }

    #[test]
    fn test_ceiling_and_step_bounds_hold_for_any_sequence() {
        let mut limiter = limiter();
        let requests = [3000, -3000, 1500, 0, -1500, 800, 800, 800, -20, 5000];
        let mut last = 0;
        let mut motor = 0;
        for cycle in 0..400u64 {
            let requested = requests[(cycle as usize / 7) % requests.len()];
            let out = limiter.limit(SteerInput { motor_torque: motor, ..input(requested, cycle) });
            assert!(out.torque.abs() <= 1500);
            assert!((out.torque - last).abs() <= 25, "step {} -> {}", last, out.torque);
            // Magnitude never grows faster than delta_up
            assert!(out.torque.abs() - last.abs() <= 10);
            last = out.torque;
            motor = out.torque;
        }
    }

    #[test]
    fn test_motor_error_window() {
        let mut limiter = TorqueRateLimiter::new(
            SteerLimitParams { delta_up: 2000, delta_down: 2000, ..SteerLimitParams::default() },
            SteerFaultParams::default(),
        );
        // Motor at 0: cannot command more than error_max
        let out = limiter.limit(input(1500, 0));
        assert_eq!(out.torque, 350);

        // Without the window the ceiling applies
        let mut unbounded = TorqueRateLimiter::new(
            SteerLimitParams {
                delta_up: 2000,
                delta_down: 2000,
                error_max: None,
                ..SteerLimitParams::default()
            },
            SteerFaultParams::default(),
        );
        assert_eq!(unbounded.limit(input(3000, 0)).torque, 1500);
    }

    #[test]
    fn test_disabled_forces_zero() {
        let mut limiter = limiter();
        limiter.limit(input(100, 0));
        let out = limiter.limit(SteerInput { enabled: false, ..input(100, 1) });
        assert_eq!(out.torque, 0);
        assert!(!out.request_active);
        assert_eq!(limiter.state().last_applied_torque, 0);
    }

    #[test]
    fn test_fault_cooldown() {
        let mut limiter = limiter();
        let mut motor = 0;
        for cycle in 0..50 {
            motor = limiter.limit(SteerInput { motor_torque: motor, ..input(300, cycle) }).torque;
        }
        assert!(motor > 0);

        let fault_cycle = 50;
        let out = limiter.limit(SteerInput { steer_state: 9, ..input(300, fault_cycle) });
        assert_eq!(out.torque, 0);
        assert!(!out.request_active);
        assert_eq!(limiter.state().last_fault_cycle, Some(fault_cycle));

        for cycle in fault_cycle + 1..fault_cycle + 200 {
            let out = limiter.limit(input(300, cycle));
            assert_eq!(out.torque, 0, "cycle {}", cycle);
        }

        let out = limiter.limit(input(300, fault_cycle + 200));
        assert!(out.request_active);
        assert_eq!(out.torque, 10);
    }

    #[test]
    fn test_repeated_fault_extends_cooldown() {
        let mut limiter = limiter();
        limiter.limit(SteerInput { steer_state: 25, ..input(100, 0) });
        limiter.limit(SteerInput { steer_state: 25, ..input(100, 150) });
        assert!(limiter.in_cooldown(300));
        assert!(!limiter.in_cooldown(350));
    }

    #[test]
    fn test_extreme_limits_saturate() {
        let limits = SteerLimitParams {
            steer_max: i32::MAX,
            delta_up: i32::MAX,
            delta_down: i32::MAX,
            error_max: None,
        };
        let mut limiter = TorqueRateLimiter::new(limits, SteerFaultParams::default());
        let out = limiter.limit(input(i32::MAX, 0));
        assert_eq!(out.torque, i32::MAX);
        // Ramping down from a positive torque stops at zero
        let out = limiter.limit(input(i32::MIN + 1, 1));
        assert_eq!(out.torque, 0);
        let out = limiter.limit(input(i32::MIN + 1, 2));
        assert_eq!(out.torque, -i32::MAX);
    }

    #[test]
    fn test_requested_torque_clips_fraction() {
        let limiter = limiter();
        assert_eq!(limiter.requested_torque(0.5), 750);
        assert_eq!(limiter.requested_torque(-2.0), -1500);
        assert_eq!(limiter.requested_torque(f64::NAN), 0);
    }
}
