//! Per-variant configuration
//!
//! One parameterized core serves every vehicle sub-model; what differs between
//! them lives here: signal bindings, validity polarities, thresholds, limits,
//! command message layouts and the keep-alive frame table. Every struct
//! deserializes with per-field fallbacks to the built-in preset, so a TOML file
//! only has to name what it changes.

use crate::signals::schema::{Signal, SignalBinding};
use crate::state::GearShifter;
use crate::types::{InterfaceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Control loop period in seconds (100 Hz)
pub const DT_CTRL: f64 = 0.01;

/// km/h to m/s
pub const KPH_TO_MS: f64 = 1.0 / 3.6;

/// Largest steer limit a variant may configure (16-bit signed torque field)
pub const MAX_STEER_LIMIT: i32 = i16::MAX as i32;

/// Steering torque limits, in command units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteerLimitParams {
    /// Absolute torque ceiling
    pub steer_max: i32,
    /// Largest per-cycle increase in magnitude
    pub delta_up: i32,
    /// Largest per-cycle decrease in magnitude
    pub delta_down: i32,
    /// Largest allowed gap between commanded and motor-reported torque
    pub error_max: Option<i32>,
}

impl Default for SteerLimitParams {
    fn default() -> Self {
        Self {
            steer_max: 1500,
            delta_up: 10,
            // always lower than 45 otherwise the EPS faults
            delta_down: 25,
            error_max: Some(350),
        }
    }
}

/// Steering assist state codes reported by the EPS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteerFaultParams {
    /// Codes that cut torque for `cooldown_cycles`
    pub fault_codes: Vec<i64>,
    /// Codes that are not a warning (standby, active)
    pub ok_codes: Vec<i64>,
    /// Cycles of zero torque after the last fault code
    pub cooldown_cycles: u64,
}

impl Default for SteerFaultParams {
    fn default() -> Self {
        Self {
            fault_codes: vec![9, 25],
            ok_codes: vec![1, 5],
            cooldown_cycles: 200,
        }
    }
}

/// Meaning of the per-wheel speed flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelSpeedFlag {
    /// Non-zero flag means the channel is faulty
    Error,
    /// Non-zero flag means the channel is good
    Valid,
}

impl WheelSpeedFlag {
    pub fn channel_valid(&self, flag: bool) -> bool {
        match self {
            WheelSpeedFlag::Error => !flag,
            WheelSpeedFlag::Valid => flag,
        }
    }
}

/// Where the gas pedal position comes from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GasSource {
    /// Stock pedal signal
    Pedal { pressed_threshold: f64 },
    /// Comma pedal interceptor, mean of its two sensors
    Interceptor { pressed_threshold: f64 },
}

impl GasSource {
    pub fn pedal() -> Self {
        GasSource::Pedal {
            pressed_threshold: 100.0,
        }
    }

    pub fn interceptor() -> Self {
        GasSource::Interceptor {
            pressed_threshold: 15.0,
        }
    }
}

/// ECU roles whose traffic the interface emulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcuRole {
    ForwardCamera,
    Dsu,
}

/// Rolling counter applied to a keep-alive payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CounterRule {
    #[default]
    None,
    /// Prefix a byte holding `(n % modulus + 1) << shift`
    Shifted { modulus: u8, shift: u8 },
    /// Append a byte holding `(n % modulus + 1) | flags`
    Nibble { modulus: u8, flags: u8 },
}

/// A keep-alive frame sent every `period` cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicFrameSpec {
    pub address: u32,
    pub ecu: EcuRole,
    pub bus: u8,
    /// Period in cycles
    pub period: u32,
    pub payload: Vec<u8>,
    #[serde(default)]
    pub counter: CounterRule,
}

impl PeriodicFrameSpec {
    pub fn new(address: u32, ecu: EcuRole, bus: u8, period: u32, payload: &[u8]) -> Self {
        Self {
            address,
            ecu,
            bus,
            period,
            payload: payload.to_vec(),
            counter: CounterRule::None,
        }
    }

    pub fn with_counter(mut self, counter: CounterRule) -> Self {
        self.counter = counter;
        self
    }
}

/// Raw gear code to gear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearCode {
    pub code: i64,
    pub gear: GearShifter,
}

fn default_enable_signal() -> String {
    "ENABLE".to_string()
}

fn default_counter_signal() -> String {
    "COUNTER_PEDAL".to_string()
}

fn default_checksum_signal() -> String {
    "CHECKSUM_PEDAL".to_string()
}

/// Steering torque command frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteerCommandConfig {
    pub message: String,
    pub bus: u8,
    pub torque_signal: String,
    /// Field held at zero when present
    #[serde(default)]
    pub eps_torque_signal: Option<String>,
    #[serde(default = "default_enable_signal")]
    pub enable_signal: String,
    #[serde(default = "default_counter_signal")]
    pub counter_signal: String,
    #[serde(default = "default_checksum_signal")]
    pub checksum_signal: String,
}

/// Gas/brake actuator or pedal interceptor command frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommandConfig {
    pub message: String,
    pub bus: u8,
    /// Fields that all carry `amount * scale`
    pub command_signals: Vec<String>,
    pub scale: f64,
    #[serde(default = "default_enable_signal")]
    pub enable_signal: String,
    #[serde(default = "default_counter_signal")]
    pub counter_signal: String,
    #[serde(default = "default_checksum_signal")]
    pub checksum_signal: String,
}

impl ActuatorCommandConfig {
    pub fn new(message: impl Into<String>, bus: u8, command_signals: &[&str], scale: f64) -> Self {
        Self {
            message: message.into(),
            bus,
            command_signals: command_signals.iter().map(|s| s.to_string()).collect(),
            scale,
            enable_signal: default_enable_signal(),
            counter_signal: default_counter_signal(),
            checksum_signal: default_checksum_signal(),
        }
    }
}

/// Cruise cancel request frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelCommandConfig {
    pub message: String,
    pub bus: u8,
    pub disable_signal: String,
    pub disable_value: f64,
    #[serde(default = "default_counter_signal")]
    pub counter_signal: String,
    #[serde(default = "default_checksum_signal")]
    pub checksum_signal: String,
}

/// Frame relaying the courtesy blinker outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkerRelayConfig {
    pub message: String,
    pub bus: u8,
    pub period: u32,
    pub left_signal: String,
    pub right_signal: String,
}

/// Outbound command message layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub steer: SteerCommandConfig,
    pub gas_interceptor: Option<ActuatorCommandConfig>,
    pub gas: Option<ActuatorCommandConfig>,
    pub brake: Option<ActuatorCommandConfig>,
    pub cancel: CancelCommandConfig,
    pub blinker_relay: Option<BlinkerRelayConfig>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            steer: SteerCommandConfig {
                message: "STEER_COMMAND".to_string(),
                bus: 2,
                torque_signal: "STEER_TORQUE_CMD".to_string(),
                eps_torque_signal: Some("EPS_TORQUE".to_string()),
                enable_signal: default_enable_signal(),
                counter_signal: default_counter_signal(),
                checksum_signal: default_checksum_signal(),
            },
            gas_interceptor: None,
            gas: Some(ActuatorCommandConfig::new(
                "GAS_ACTUATOR",
                0,
                &["COMMAND", "COMMAND2"],
                255.0,
            )),
            // The brake actuator physically moves the pedal and has no position
            // feedback yet, so the preset leaves it off
            brake: None,
            cancel: CancelCommandConfig {
                message: "PCM_REQUEST".to_string(),
                bus: 0,
                disable_signal: "DISABLE_REQ".to_string(),
                disable_value: 255.0,
                counter_signal: default_counter_signal(),
                checksum_signal: default_checksum_signal(),
            },
            blinker_relay: None,
        }
    }
}

/// Everything that distinguishes one vehicle variant from another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    pub name: String,
    pub steer_limits: SteerLimitParams,
    pub steer_faults: SteerFaultParams,
    /// Cycles the courtesy blinker stays latched
    pub blinker_hold_cycles: u64,
    /// Blinker signals read 0 when the lamp is on
    pub blinker_active_low: bool,
    pub wheel_speed_flag: WheelSpeedFlag,
    /// Wheel speed units to m/s
    pub wheel_speed_factor: f64,
    /// Cruise set speed units to m/s
    pub cruise_speed_factor: f64,
    /// Consecutive all-invalid wheel speed cycles before speed is flagged stale
    pub max_stale_speed_cycles: u32,
    /// Cycles without a bound message before its signals revert to defaults
    pub signal_timeout_cycles: u64,
    /// Driver torque magnitude that counts as steering pressed
    pub steer_threshold: f64,
    pub brake_pressed_threshold: f64,
    pub gas_source: GasSource,
    /// Commanded pedal fraction below which actuators are disabled
    pub actuator_deadband: f64,
    pub emulated_ecus: Vec<EcuRole>,
    pub gear_codes: Vec<GearCode>,
    pub signals: BTreeMap<Signal, SignalBinding>,
    pub commands: CommandConfig,
    pub static_frames: Vec<PeriodicFrameSpec>,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self::celica()
    }
}

impl VariantConfig {
    /// 2003 Celica with camera and DSU emulation
    pub fn celica() -> Self {
        Self {
            name: "TOYOTA CELICA 2003".to_string(),
            steer_limits: SteerLimitParams::default(),
            steer_faults: SteerFaultParams::default(),
            blinker_hold_cycles: 700,
            blinker_active_low: true,
            wheel_speed_flag: WheelSpeedFlag::Error,
            wheel_speed_factor: KPH_TO_MS,
            cruise_speed_factor: KPH_TO_MS,
            max_stale_speed_cycles: 50,
            signal_timeout_cycles: 100,
            steer_threshold: 100.0,
            brake_pressed_threshold: 50.0,
            gas_source: GasSource::pedal(),
            actuator_deadband: 0.001,
            emulated_ecus: vec![EcuRole::ForwardCamera, EcuRole::Dsu],
            gear_codes: vec![
                GearCode { code: 0, gear: GearShifter::Park },
                GearCode { code: 1, gear: GearShifter::Reverse },
                GearCode { code: 2, gear: GearShifter::Neutral },
                GearCode { code: 3, gear: GearShifter::Drive },
                GearCode { code: 4, gear: GearShifter::Drive },
            ],
            signals: celica_signals(),
            commands: CommandConfig::default(),
            static_frames: celica_static_frames(),
        }
    }

    /// Builder method: read gas from a pedal interceptor and command it
    pub fn with_gas_interceptor(mut self) -> Self {
        self.gas_source = GasSource::interceptor();
        self.signals.insert(
            Signal::InterceptorGas,
            SignalBinding::new("GAS_SENSOR", "INTERCEPTOR_GAS"),
        );
        self.signals.insert(
            Signal::InterceptorGas2,
            SignalBinding::new("GAS_SENSOR", "INTERCEPTOR_GAS2"),
        );
        self.commands.gas_interceptor = Some(ActuatorCommandConfig::new(
            "GAS_COMMAND",
            0,
            &["GAS_COMMAND", "GAS_COMMAND2"],
            255.0,
        ));
        self
    }

    /// Builder method: set wheel speed flag polarity
    ///
    /// Flag defaults follow the polarity so a silent message reads as faulty.
    pub fn with_wheel_speed_flag(mut self, flag: WheelSpeedFlag) -> Self {
        self.wheel_speed_flag = flag;
        let default = match flag {
            WheelSpeedFlag::Error => 1.0,
            WheelSpeedFlag::Valid => 0.0,
        };
        for signal in Signal::WHEEL_SPEED_FLAGS {
            if let Some(binding) = self.signals.get_mut(&signal) {
                binding.default = default;
            }
        }
        self
    }

    /// Builder method: set emulated ECU roles
    pub fn with_emulated_ecus(mut self, ecus: Vec<EcuRole>) -> Self {
        self.emulated_ecus = ecus;
        self
    }

    /// Builder method: replace the keep-alive frame table
    pub fn with_static_frames(mut self, frames: Vec<PeriodicFrameSpec>) -> Self {
        self.static_frames = frames;
        self
    }

    /// Builder method: bind or rebind one signal
    pub fn with_binding(mut self, signal: Signal, binding: SignalBinding) -> Self {
        self.signals.insert(signal, binding);
        self
    }

    /// Check if an ECU role is emulated
    pub fn emulates(&self, ecu: EcuRole) -> bool {
        self.emulated_ecus.contains(&ecu)
    }

    /// Map a raw gear code
    pub fn gear(&self, code: i64) -> GearShifter {
        self.gear_codes
            .iter()
            .find(|g| g.code == code)
            .map(|g| g.gear)
            .unwrap_or(GearShifter::Unknown)
    }

    /// Reject values the core cannot run with
    pub fn validate(&self) -> Result<()> {
        let limits = &self.steer_limits;
        let in_range = |v: i32| (1..=MAX_STEER_LIMIT).contains(&v);
        let limits_ok = [limits.steer_max, limits.delta_up, limits.delta_down]
            .into_iter()
            .all(in_range);
        if !limits_ok {
            return Err(InterfaceError::InvalidConfig(format!(
                "steer limits must be within 1..={}: {:?}",
                MAX_STEER_LIMIT, limits
            )));
        }
        if limits.error_max.is_some_and(|e| !in_range(e)) {
            return Err(InterfaceError::InvalidConfig(format!(
                "steer error_max must be within 1..={}",
                MAX_STEER_LIMIT
            )));
        }
        if self.blinker_hold_cycles == 0 {
            return Err(InterfaceError::InvalidConfig(
                "blinker_hold_cycles must be positive".to_string(),
            ));
        }

        for frame in &self.static_frames {
            if frame.period == 0 {
                return Err(InterfaceError::InvalidConfig(format!(
                    "static frame 0x{:X} has a zero period",
                    frame.address
                )));
            }
            match frame.counter {
                // Counter runs 1..=modulus and must fit its byte
                CounterRule::Shifted { modulus, shift }
                    if modulus == 0 || shift > 7 || (modulus as u32) << shift > 0xFF =>
                {
                    return Err(InterfaceError::InvalidConfig(format!(
                        "static frame 0x{:X} has an invalid shifted counter",
                        frame.address
                    )));
                }
                CounterRule::Nibble { modulus, flags }
                    if modulus == 0 || modulus > 0x0F || flags & 0x0F != 0 =>
                {
                    return Err(InterfaceError::InvalidConfig(format!(
                        "static frame 0x{:X} has an invalid nibble counter",
                        frame.address
                    )));
                }
                _ => {}
            }
        }

        if let Some(relay) = &self.commands.blinker_relay {
            if relay.period == 0 {
                return Err(InterfaceError::InvalidConfig(
                    "blinker relay has a zero period".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn celica_signals() -> BTreeMap<Signal, SignalBinding> {
    let mut signals = BTreeMap::new();
    let mut bind = |signal: Signal, binding: SignalBinding| {
        signals.insert(signal, binding);
    };

    bind(Signal::WheelSpeedFl, SignalBinding::new("WHEEL_SPEEDS", "WHEEL_SPEED_FL"));
    bind(Signal::WheelSpeedFr, SignalBinding::new("WHEEL_SPEEDS", "WHEEL_SPEED_FR"));
    bind(Signal::WheelSpeedRl, SignalBinding::new("WHEEL_SPEEDS", "WHEEL_SPEED_RL"));
    bind(Signal::WheelSpeedRr, SignalBinding::new("WHEEL_SPEEDS", "WHEEL_SPEED_RR"));
    // A silent wheel speed message must read as faulty, never as 0 m/s
    bind(
        Signal::WheelSpeedFlagFl,
        SignalBinding::new("WHEEL_SPEEDS", "SENSOR_ERROR_FL").with_default(1.0),
    );
    bind(
        Signal::WheelSpeedFlagFr,
        SignalBinding::new("WHEEL_SPEEDS", "SENSOR_ERROR_FR").with_default(1.0),
    );
    bind(
        Signal::WheelSpeedFlagRl,
        SignalBinding::new("WHEEL_SPEEDS", "SENSOR_ERROR_RL").with_default(1.0),
    );
    bind(
        Signal::WheelSpeedFlagRr,
        SignalBinding::new("WHEEL_SPEEDS", "SENSOR_ERROR_RR").with_default(1.0),
    );
    bind(Signal::SteerAngle, SignalBinding::new("STEER_ANGLE_SENSOR", "STEER_ANGLE"));
    bind(Signal::SteerFraction, SignalBinding::new("STEER_ANGLE_SENSOR", "STEER_FRACTION"));
    bind(Signal::SteerRate, SignalBinding::new("STEER_ANGLE_SENSOR", "STEER_RATE"));
    bind(
        Signal::SteerTorqueDriver,
        SignalBinding::new("STEER_TORQUE_SENSOR", "STEER_TORQUE_DRIVER"),
    );
    bind(Signal::SteerTorqueEps, SignalBinding::new("STEER_TORQUE_SENSOR", "STEER_TORQUE_EPS"));
    bind(Signal::LkaState, SignalBinding::new("EPS_STATUS", "LKA_STATE"));
    bind(Signal::TurnLeft, SignalBinding::new("PCM_CRUISE", "TURN_L").with_default(1.0));
    bind(Signal::TurnRight, SignalBinding::new("PCM_CRUISE", "TURN_R").with_default(1.0));
    bind(Signal::CruiseEngaged, SignalBinding::new("PCM_CRUISE", "ENGAGED"));
    bind(Signal::CruiseMainOn, SignalBinding::new("PCM_CRUISE", "MAIN_ON"));
    bind(Signal::CruiseAccelResume, SignalBinding::new("PCM_CRUISE", "RES_ACC"));
    bind(Signal::CruiseSetCoast, SignalBinding::new("PCM_CRUISE", "SET_COAST"));
    bind(Signal::CruiseSpeed, SignalBinding::new("PCM_CRUISE", "SPEED"));
    bind(Signal::BrakeSensor, SignalBinding::new("BRAKE_OUTPUT", "SENSOR"));
    bind(Signal::GasPedal, SignalBinding::new("GAS_OUTPUT", "GAS_PRESSED"));
    bind(Signal::Gear, SignalBinding::new("GEAR_PACKET", "GEAR"));

    signals
}

fn celica_static_frames() -> Vec<PeriodicFrameSpec> {
    use EcuRole::{Dsu, ForwardCamera as Cam};

    let camera_counter = CounterRule::Shifted { modulus: 7, shift: 5 };

    vec![
        PeriodicFrameSpec::new(0x130, Cam, 1, 100, b"\x00\x00\x00\x00\x00\x00\x38"),
        PeriodicFrameSpec::new(0x240, Cam, 1, 5, b"\x00\x10\x01\x00\x10\x01\x00")
            .with_counter(camera_counter),
        PeriodicFrameSpec::new(0x241, Cam, 1, 5, b"\x00\x10\x01\x00\x10\x01\x00")
            .with_counter(camera_counter),
        PeriodicFrameSpec::new(0x244, Cam, 1, 5, b"\x00\x10\x01\x00\x10\x01\x00")
            .with_counter(camera_counter),
        PeriodicFrameSpec::new(0x245, Cam, 1, 5, b"\x00\x10\x01\x00\x10\x01\x00")
            .with_counter(camera_counter),
        PeriodicFrameSpec::new(0x248, Cam, 1, 5, b"\x00\x00\x00\x00\x00\x00\x01")
            .with_counter(camera_counter),
        PeriodicFrameSpec::new(0x367, Cam, 0, 40, b"\x06\x00"),
        PeriodicFrameSpec::new(0x414, Cam, 0, 100, b"\x00\x00\x00\x00\x00\x00\x17\x00"),
        PeriodicFrameSpec::new(0x466, Cam, 1, 100, b"\x24\x20\xB1"),
        PeriodicFrameSpec::new(0x489, Cam, 0, 100, b"\x00\x00\x00\x00\x00\x00\x00")
            .with_counter(CounterRule::Nibble { modulus: 15, flags: 0x00 }),
        PeriodicFrameSpec::new(0x48A, Cam, 0, 100, b"\x00\x00\x00\x00\x00\x00\x00")
            .with_counter(CounterRule::Nibble { modulus: 15, flags: 0x80 }),
        PeriodicFrameSpec::new(0x48B, Cam, 0, 100, b"\x66\x06\x08\x0a\x02\x00\x00\x00"),
        PeriodicFrameSpec::new(0x4D3, Cam, 0, 100, b"\x1C\x00\x00\x01\x00\x00\x00\x00"),
        PeriodicFrameSpec::new(0x3B1, Dsu, 0, 100, b"\x00\x00\x00\x01\x00\x08\x00\x00"),
        PeriodicFrameSpec::new(0x1C4, Dsu, 0, 2, b"\x05\xea\x1b\x08\x00\x00\xc0\x9f"),
        PeriodicFrameSpec::new(0x2C1, Dsu, 0, 3, b"\x08\x07\x07\x06\x70\xf8\x00\x4f"),
        PeriodicFrameSpec::new(0x3D3, Dsu, 0, 50, b"\x00\x00"),
        PeriodicFrameSpec::new(0x399, Dsu, 0, 100, b"\x00\x00\x00\x00\x00\x00\x00\x00"),
        PeriodicFrameSpec::new(0x3BB, Dsu, 0, 100, b"\x00\x00\x26\x00"),
        PeriodicFrameSpec::new(0x3F9, Dsu, 0, 20, b"\x76\x18\x26\x01\x00\x00\x00\xb9"),
        PeriodicFrameSpec::new(0x3BC, Dsu, 0, 100, b"\x00\x00\x00\x00\x00\x80\x00\x00"),
        PeriodicFrameSpec::new(0x4AC, Dsu, 0, 50, b"\x28\x00\x60\x01\x0a\x00\xa3\xa0"),
        PeriodicFrameSpec::new(0x128, Dsu, 1, 3, b"\xf4\x01\x90\x83\x00\x37"),
        PeriodicFrameSpec::new(0x141, Dsu, 1, 2, b"\x00\x00\x00\x46"),
        PeriodicFrameSpec::new(0x160, Dsu, 1, 7, b"\x00\x00\x08\x12\x01\x31\x9c\x51"),
        PeriodicFrameSpec::new(0x161, Dsu, 1, 7, b"\x00\x1e\x00\x00\x00\x80\x07"),
        PeriodicFrameSpec::new(0x283, Dsu, 0, 3, b"\x00\x00\x00\x00\x00\x00\x8c"),
        PeriodicFrameSpec::new(0x344, Dsu, 0, 5, b"\x00\x00\x01\x00\x00\x00\x00\x50"),
        PeriodicFrameSpec::new(0x365, Dsu, 0, 20, b"\x00\x00\x00\x80\xfc\x00\x08"),
        PeriodicFrameSpec::new(0x366, Dsu, 0, 20, b"\x00\x72\x07\xff\x09\xfe\x00"),
        PeriodicFrameSpec::new(0x4CB, Dsu, 0, 100, b"\x0c\x00\x00\x00\x00\x00\x00\x00"),
    ]
}
