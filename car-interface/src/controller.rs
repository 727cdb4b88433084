//! Control loop glue
//!
//! [`CarController`] runs the actuation half of a cycle: torque limiting, the
//! courtesy blinker timer and frame scheduling. [`CarInterface`] wraps it with
//! the bus taps and the state decoder so a caller can feed raw frames in and
//! step the loop once per cycle.

use crate::blinker::CourtesyBlinker;
use crate::bus::BusTap;
use crate::config::VariantConfig;
use crate::scheduler::{FrameScheduler, HudStatus, TickContext};
use crate::signals::database::SignalDatabase;
use crate::signals::schema::{BusTapId, SignalSchema};
use crate::state::{VehicleState, VehicleStateDecoder};
use crate::steer_limiter::{SteerInput, SteerOutput, TorqueRateLimiter};
use crate::types::{ActuationRequest, CanFrame, OutboundFrame, Result, VisualAlert};
use serde::{Deserialize, Serialize};

/// Result of one control cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleOutput {
    pub cycle: u64,
    pub frames: Vec<OutboundFrame>,
    pub hud: HudStatus,
    pub steer: SteerOutput,
}

pub struct CarController {
    limiter: TorqueRateLimiter,
    blinker: CourtesyBlinker,
    scheduler: FrameScheduler,
}

impl CarController {
    pub fn new(config: &VariantConfig, db: &SignalDatabase) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            limiter: TorqueRateLimiter::new(config.steer_limits, config.steer_faults.clone()),
            blinker: CourtesyBlinker::new(config.blinker_hold_cycles),
            scheduler: FrameScheduler::new(config, db)?,
        })
    }

    pub fn limiter(&self) -> &TorqueRateLimiter {
        &self.limiter
    }

    /// Produce this cycle's frames from the planner request and the decoded state
    pub fn update(
        &mut self,
        cycle: u64,
        actuation: &ActuationRequest,
        state: &VehicleState,
        hud_alert: VisualAlert,
    ) -> CycleOutput {
        let steer = self.limiter.limit(SteerInput {
            requested: self.limiter.requested_torque(actuation.steer),
            cycle,
            steer_state: state.steer_state,
            enabled: actuation.enabled,
            motor_torque: state.steering_torque_eps.round() as i32,
        });

        let blinkers = self
            .blinker
            .update(state.left_blinker, state.right_blinker, cycle);

        let scheduled = self.scheduler.tick(&TickContext {
            cycle,
            actuation: *actuation,
            steer,
            blinkers,
            hud_alert,
            cruise_enabled: state.cruise.enabled,
        });

        CycleOutput {
            cycle,
            frames: scheduled.frames,
            hud: scheduled.hud,
            steer,
        }
    }
}

/// Physical buses the two taps listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusAssignment {
    pub primary: u8,
    pub auxiliary: u8,
}

impl Default for BusAssignment {
    fn default() -> Self {
        Self {
            primary: 0,
            auxiliary: 2,
        }
    }
}

/// Decode + control for one vehicle, stepped once per cycle
pub struct CarInterface {
    primary: BusTap,
    auxiliary: BusTap,
    decoder: VehicleStateDecoder,
    controller: CarController,
    state: VehicleState,
    cycle: u64,
}

impl CarInterface {
    pub fn new(config: VariantConfig, db: &SignalDatabase, buses: BusAssignment) -> Result<Self> {
        let schema = SignalSchema::bind(&config, db)?;
        let timeout = config.signal_timeout_cycles;
        let primary = BusTap::new(BusTapId::Primary, buses.primary, &schema, db, timeout)?;
        let auxiliary = BusTap::new(BusTapId::Auxiliary, buses.auxiliary, &schema, db, timeout)?;
        let controller = CarController::new(&config, db)?;

        log::info!(
            "Car interface for '{}' on buses {}/{}",
            config.name,
            buses.primary,
            buses.auxiliary
        );

        Ok(Self {
            primary,
            auxiliary,
            decoder: VehicleStateDecoder::new(config, schema),
            controller,
            state: VehicleState::default(),
            cycle: 0,
        })
    }

    /// Feed a received frame; it counts towards the current cycle
    pub fn ingest(&mut self, frame: &CanFrame) {
        let primary = self.primary.ingest(frame, self.cycle);
        let auxiliary = self.auxiliary.ingest(frame, self.cycle);
        if !primary && !auxiliary {
            log::trace!("Ignoring 0x{:X} on bus {}", frame.address, frame.bus);
        }
    }

    /// Decode the current cycle, run the controller and advance
    pub fn step(&mut self, actuation: &ActuationRequest, hud_alert: VisualAlert) -> CycleOutput {
        let primary = self.primary.snapshot(self.cycle);
        let auxiliary = self.auxiliary.snapshot(self.cycle);
        self.state = self.decoder.decode(&primary, &auxiliary, &self.state);

        let output = self
            .controller
            .update(self.cycle, actuation, &self.state, hud_alert);
        self.cycle += 1;
        output
    }

    /// State decoded by the last step
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Cycle the next step will run
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn controller(&self) -> &CarController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::schema::tests::catalog_for;
    use crate::signals::database::tests::{message, signal};

    /// Test catalog for the preset: bound signals plus the command messages
    fn catalog(config: &VariantConfig) -> SignalDatabase {
        let mut db = catalog_for(config);
        let pedal = |id, name: &str, first: &str, second: &str| {
            message(
                id,
                name,
                6,
                vec![
                    signal(first, 0, 16),
                    signal(second, 16, 16),
                    signal("ENABLE", 32, 1),
                    signal("COUNTER_PEDAL", 36, 4),
                    signal("CHECKSUM_PEDAL", 40, 8),
                ],
            )
        };
        db.add_message(message(
            0x2E4,
            "STEER_COMMAND",
            5,
            vec![
                signal("STEER_TORQUE_CMD", 0, 16),
                signal("EPS_TORQUE", 16, 8),
                signal("ENABLE", 24, 1),
                signal("COUNTER_PEDAL", 28, 4),
                signal("CHECKSUM_PEDAL", 32, 8),
            ],
        ));
        db.add_message(pedal(0x22F, "GAS_ACTUATOR", "COMMAND", "COMMAND2"));
        db.add_message(message(
            0x231,
            "PCM_REQUEST",
            3,
            vec![
                signal("DISABLE_REQ", 0, 8),
                signal("COUNTER_PEDAL", 8, 4),
                signal("CHECKSUM_PEDAL", 16, 8),
            ],
        ));
        db
    }

    fn healthy_state() -> VehicleState {
        VehicleState {
            steer_state: 5,
            ..VehicleState::default()
        }
    }

    #[test]
    fn test_controller_ramps_torque_into_frame() {
        let config = VariantConfig::celica();
        let mut controller = CarController::new(&config, &catalog(&config)).unwrap();
        let request = ActuationRequest {
            steer: 1.0,
            enabled: true,
            ..ActuationRequest::default()
        };

        let out = controller.update(1, &request, &healthy_state(), VisualAlert::None);
        assert_eq!(out.steer.torque, 10);
        assert!(out.steer.rate_limited);
        let steer = out.frames.iter().find(|f| f.address == 0x2E4).unwrap();
        assert_eq!(steer.data[..2], [10, 0]);
        assert_eq!(controller.limiter().state().last_applied_torque, 10);
    }

    #[test]
    fn test_controller_fault_cuts_torque() {
        let config = VariantConfig::celica();
        let mut controller = CarController::new(&config, &catalog(&config)).unwrap();
        let request = ActuationRequest {
            steer: 0.2,
            enabled: true,
            ..ActuationRequest::default()
        };
        let faulted = VehicleState {
            steer_state: 25,
            ..VehicleState::default()
        };
        let out = controller.update(0, &request, &faulted, VisualAlert::None);
        assert_eq!(out.steer.torque, 0);
        assert!(!out.steer.request_active);
        let out = controller.update(1, &request, &healthy_state(), VisualAlert::None);
        assert_eq!(out.steer.torque, 0);
    }

    #[test]
    fn test_controller_blinker_latch_reported() {
        let config = VariantConfig::celica();
        let mut controller = CarController::new(&config, &catalog(&config)).unwrap();
        let blinking = VehicleState {
            left_blinker: true,
            ..healthy_state()
        };
        let out = controller.update(3, &ActuationRequest::default(), &blinking, VisualAlert::None);
        assert!(out.hud.left_blinker);
        let out = controller.update(
            4,
            &ActuationRequest::default(),
            &healthy_state(),
            VisualAlert::None,
        );
        assert!(out.hud.left_blinker);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = VariantConfig::celica();
        config.blinker_hold_cycles = 0;
        assert!(CarController::new(&config, &catalog(&config)).is_err());
    }

    #[test]
    fn test_interface_steps_cycles() {
        let config = VariantConfig::celica();
        let db = catalog(&config);
        let mut interface = CarInterface::new(config, &db, BusAssignment::default()).unwrap();

        let gear = db.get_message_by_name("GEAR_PACKET").unwrap();
        interface.ingest(&CanFrame::new(0, gear.id, vec![3, 0, 0, 0, 0, 0, 0, 0]));

        let out = interface.step(&ActuationRequest::default(), VisualAlert::None);
        assert_eq!(out.cycle, 0);
        assert_eq!(interface.cycle(), 1);
        assert_eq!(interface.state().gear, crate::state::GearShifter::Drive);
        // Most messages never arrived
        assert!(!interface.state().can_valid);
        assert!(!interface.state().left_blinker);
    }
}
