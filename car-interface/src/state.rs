//! Vehicle state decoder
//!
//! Normalizes one cycle of sampled signals into a [`VehicleState`]: wheel
//! speed fusion over the channels flagged valid, Kalman-filtered speed and
//! acceleration, steering, pedals, cruise, button edges, blinkers, gear and
//! EPS fault/warning flags. Decoding is total: absent signals read as their
//! binding default.

use crate::config::{GasSource, VariantConfig};
use crate::signals::schema::{BusTapId, Signal, SignalSchema, SignalSnapshot};
use crate::speed_filter::SpeedFilter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this raw speed (m/s) the vehicle is at a standstill
const STANDSTILL_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearShifter {
    Park,
    Reverse,
    Neutral,
    Drive,
    #[default]
    Unknown,
}

impl fmt::Display for GearShifter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GearShifter::Park => "P",
            GearShifter::Reverse => "R",
            GearShifter::Neutral => "N",
            GearShifter::Drive => "D",
            GearShifter::Unknown => "?",
        };
        write!(f, "{}", name)
    }
}

/// Per-wheel speeds in m/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub fl: f64,
    pub fr: f64,
    pub rl: f64,
    pub rr: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CruiseState {
    /// Main switch on
    pub available: bool,
    pub enabled: bool,
    /// Set speed in m/s
    pub speed: f64,
}

/// Cruise stalk events; each is true only on the cycle its press begins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonStates {
    pub accel_cruise: bool,
    pub decel_cruise: bool,
    pub set_cruise: bool,
    pub resume_cruise: bool,
}

impl ButtonStates {
    pub fn any(&self) -> bool {
        self.accel_cruise || self.decel_cruise || self.set_cruise || self.resume_cruise
    }
}

/// Normalized vehicle state handed to the planner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Fused wheel speed (m/s)
    pub v_ego_raw: f64,
    /// Filtered speed (m/s)
    pub v_ego: f64,
    /// Filtered acceleration (m/s^2)
    pub a_ego: f64,
    pub wheel_speeds: WheelSpeeds,
    pub standstill: bool,
    /// Degrees
    pub steering_angle: f64,
    pub steering_rate: f64,
    /// Driver torque
    pub steering_torque: f64,
    /// Torque reported by the EPS motor
    pub steering_torque_eps: f64,
    pub steering_pressed: bool,
    pub gas: f64,
    pub gas_pressed: bool,
    pub brake_pressed: bool,
    pub cruise: CruiseState,
    pub buttons: ButtonStates,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub gear: GearShifter,
    /// Raw EPS assist state code
    pub steer_state: i64,
    pub steer_fault: bool,
    pub steer_warning: bool,
    /// Every wheel speed channel has been invalid for too long
    pub wheel_speed_stale: bool,
    pub can_valid: bool,
}

pub struct VehicleStateDecoder {
    config: VariantConfig,
    schema: SignalSchema,
    speed_filter: SpeedFilter,
    /// Consecutive cycles with no valid wheel speed channel
    invalid_speed_cycles: u32,
    prev_accel_resume: bool,
    prev_set_coast: bool,
}

impl VehicleStateDecoder {
    pub fn new(config: VariantConfig, schema: SignalSchema) -> Self {
        Self {
            config,
            schema,
            speed_filter: SpeedFilter::default(),
            invalid_speed_cycles: 0,
            prev_accel_resume: false,
            prev_set_coast: false,
        }
    }

    pub fn decode(
        &mut self,
        primary: &SignalSnapshot,
        auxiliary: &SignalSnapshot,
        previous: &VehicleState,
    ) -> VehicleState {
        let read = |signal: Signal| -> f64 {
            let snapshot = match self.schema.tap(signal) {
                BusTapId::Primary => primary,
                BusTapId::Auxiliary => auxiliary,
            };
            snapshot.try_get(signal).unwrap_or_else(|| {
                self.schema
                    .binding(signal)
                    .map(|b| b.default)
                    .unwrap_or_default()
            })
        };
        let flag = |signal: Signal| read(signal) != 0.0;
        let stale = |signal: Signal| match self.schema.tap(signal) {
            BusTapId::Primary => primary.is_stale(signal),
            BusTapId::Auxiliary => auxiliary.is_stale(signal),
        };

        let mut state = VehicleState {
            can_valid: primary.can_valid && auxiliary.can_valid,
            ..VehicleState::default()
        };

        // Speed
        let factor = self.config.wheel_speed_factor;
        let speeds = Signal::WHEEL_SPEEDS.map(|s| read(s) * factor);
        state.wheel_speeds = WheelSpeeds {
            fl: speeds[0],
            fr: speeds[1],
            rl: speeds[2],
            rr: speeds[3],
        };

        // A channel backed by a timed-out message is invalid whatever its default says
        let polarity = self.config.wheel_speed_flag;
        let valid: Vec<f64> = Signal::WHEEL_SPEEDS
            .into_iter()
            .zip(Signal::WHEEL_SPEED_FLAGS)
            .zip(speeds)
            .filter(|((speed_signal, flag_signal), _)| {
                !stale(*speed_signal)
                    && !stale(*flag_signal)
                    && polarity.channel_valid(flag(*flag_signal))
            })
            .map(|(_, speed)| speed)
            .collect();

        if valid.is_empty() {
            self.invalid_speed_cycles = self.invalid_speed_cycles.saturating_add(1);
            state.v_ego_raw = previous.v_ego_raw;
            state.v_ego = previous.v_ego;
            state.a_ego = previous.a_ego;
            state.wheel_speed_stale =
                self.invalid_speed_cycles >= self.config.max_stale_speed_cycles;
            if self.invalid_speed_cycles == self.config.max_stale_speed_cycles {
                log::warn!(
                    "No valid wheel speed for {} cycles, holding {:.2} m/s as stale",
                    self.invalid_speed_cycles,
                    state.v_ego_raw
                );
            }
        } else {
            if self.invalid_speed_cycles > 0 {
                log::debug!(
                    "Wheel speed recovered after {} invalid cycles",
                    self.invalid_speed_cycles
                );
            }
            self.invalid_speed_cycles = 0;
            state.v_ego_raw = valid.iter().sum::<f64>() / valid.len() as f64;
            let (v_ego, a_ego) = self.speed_filter.update(state.v_ego_raw);
            state.v_ego = v_ego;
            state.a_ego = a_ego;
        }
        state.standstill = state.v_ego_raw < STANDSTILL_EPSILON;

        // Steering
        state.steering_angle = read(Signal::SteerAngle) + read(Signal::SteerFraction);
        state.steering_rate = read(Signal::SteerRate);
        state.steering_torque = read(Signal::SteerTorqueDriver);
        if self.schema.binding(Signal::SteerTorqueDirection).is_some()
            && flag(Signal::SteerTorqueDirection)
        {
            state.steering_torque = -state.steering_torque;
        }
        state.steering_torque_eps = read(Signal::SteerTorqueEps);
        state.steering_pressed = state.steering_torque.abs() > self.config.steer_threshold;

        // Pedals
        state.brake_pressed = read(Signal::BrakeSensor) > self.config.brake_pressed_threshold;
        match self.config.gas_source {
            GasSource::Interceptor { pressed_threshold } => {
                state.gas = (read(Signal::InterceptorGas) + read(Signal::InterceptorGas2)) / 2.0;
                state.gas_pressed = state.gas > pressed_threshold;
            }
            GasSource::Pedal { pressed_threshold } => {
                state.gas = read(Signal::GasPedal);
                state.gas_pressed = state.gas > pressed_threshold;
            }
        }

        // Blinkers
        let lamp_on = |raw: bool| raw != self.config.blinker_active_low;
        state.left_blinker = lamp_on(flag(Signal::TurnLeft));
        state.right_blinker = lamp_on(flag(Signal::TurnRight));

        // Cruise
        state.cruise = CruiseState {
            available: flag(Signal::CruiseMainOn),
            enabled: flag(Signal::CruiseEngaged),
            speed: read(Signal::CruiseSpeed) * self.config.cruise_speed_factor,
        };

        let accel_resume = flag(Signal::CruiseAccelResume);
        let set_coast = flag(Signal::CruiseSetCoast);
        let accel_resume_edge = accel_resume && !self.prev_accel_resume;
        let set_coast_edge = set_coast && !self.prev_set_coast;
        self.prev_accel_resume = accel_resume;
        self.prev_set_coast = set_coast;

        state.buttons = if state.cruise.enabled {
            ButtonStates {
                accel_cruise: accel_resume_edge,
                decel_cruise: set_coast_edge,
                ..ButtonStates::default()
            }
        } else {
            ButtonStates {
                set_cruise: set_coast_edge,
                resume_cruise: accel_resume_edge,
                ..ButtonStates::default()
            }
        };
        if state.buttons.any() {
            log::debug!("Cruise button event: {:?}", state.buttons);
        }

        state.gear = self.config.gear(read(Signal::Gear).round() as i64);

        // EPS
        state.steer_state = read(Signal::LkaState).round() as i64;
        let faults = &self.config.steer_faults;
        state.steer_fault = faults.fault_codes.contains(&state.steer_state);
        state.steer_warning = !faults.ok_codes.contains(&state.steer_state);

        state
    }
}
