//! Frame scheduler
//!
//! Builds the outbound frames of one control cycle: the steering command, the
//! half-rate gas/brake/interceptor and cancel frames, the keep-alive frames of
//! every emulated ECU whose period is due, and the optional blinker relay. Also
//! decides whether the HUD should be refreshed this cycle.
//!
//! Command layouts are resolved against the catalog when the scheduler is
//! built, so [`FrameScheduler::tick`] cannot fail.

use crate::checksum::checksum_frame;
use crate::config::{
    ActuatorCommandConfig, CounterRule, EcuRole, PeriodicFrameSpec, VariantConfig,
};
use crate::signals::codec::{empty_payload, encode_signal};
use crate::signals::database::{ByteOrder, MessageDefinition, SignalDatabase, SignalDefinition};
use crate::steer_limiter::SteerOutput;
use crate::types::{ActuationRequest, InterfaceError, OutboundFrame, Result, VisualAlert};
use serde::{Deserialize, Serialize};

/// Everything the scheduler needs for one cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct TickContext {
    pub cycle: u64,
    pub actuation: ActuationRequest,
    /// Limiter output for this cycle
    pub steer: SteerOutput,
    /// Courtesy blinker outputs (left, right)
    pub blinkers: (bool, bool),
    pub hud_alert: VisualAlert,
    /// Cruise reported engaged by the vehicle
    pub cruise_enabled: bool,
}

/// HUD refresh decision; reported to the alert renderer, not sent on the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudStatus {
    pub send_ui: bool,
    pub alert: VisualAlert,
    pub left_blinker: bool,
    pub right_blinker: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledCycle {
    pub frames: Vec<OutboundFrame>,
    pub hud: HudStatus,
}

/// A catalog message with its counter and checksum fields resolved
struct CommandLayout {
    message: MessageDefinition,
    bus: u8,
    counter: SignalDefinition,
    checksum: SignalDefinition,
}

impl CommandLayout {
    fn resolve(
        db: &SignalDatabase,
        name: &str,
        bus: u8,
        counter: &str,
        checksum: &str,
    ) -> Result<Self> {
        let message = db
            .get_message_by_name(name)
            .cloned()
            .ok_or_else(|| InterfaceError::MessageNotFound(name.to_string()))?;
        let counter = resolve_signal(&message, counter)?;
        let checksum = resolve_signal(&message, checksum)?;
        if !is_final_byte(&message, &checksum) {
            return Err(InterfaceError::InvalidConfig(format!(
                "{}: checksum {} must be the unscaled final byte",
                message.name, checksum.name
            )));
        }
        Ok(Self {
            message,
            bus,
            counter,
            checksum,
        })
    }

    fn signal(&self, name: &str) -> Result<SignalDefinition> {
        resolve_signal(&self.message, name)
    }

    /// Stamp the counter, then the CRC of every byte before the last
    fn finish(&self, mut data: Vec<u8>, counter: u64) -> OutboundFrame {
        encode_signal(&mut data, &self.counter, (counter & 0xF) as f64);
        encode_signal(&mut data, &self.checksum, 0.0);
        let crc = checksum_frame(&data);
        encode_signal(&mut data, &self.checksum, crc as f64);
        OutboundFrame::new(self.message.id, self.bus, data)
    }
}

/// The CRC covers every byte before the last, so it must own exactly that byte
fn is_final_byte(message: &MessageDefinition, signal: &SignalDefinition) -> bool {
    let Some(last) = message.size.checked_sub(1) else {
        return false;
    };
    let start = match signal.byte_order {
        ByteOrder::LittleEndian => last * 8,
        ByteOrder::BigEndian => last * 8 + 7,
    };
    signal.length == 8
        && signal.start_bit as usize == start
        && signal.factor == 1.0
        && signal.offset == 0.0
}

fn resolve_signal(message: &MessageDefinition, name: &str) -> Result<SignalDefinition> {
    message
        .signal(name)
        .cloned()
        .ok_or_else(|| InterfaceError::SignalNotFound {
            message: message.name.clone(),
            signal: name.to_string(),
        })
}

struct SteerCommand {
    layout: CommandLayout,
    torque: SignalDefinition,
    eps_torque: Option<SignalDefinition>,
    enable: SignalDefinition,
}

struct ActuatorCommand {
    layout: CommandLayout,
    commands: Vec<SignalDefinition>,
    scale: f64,
    enable: SignalDefinition,
}

impl ActuatorCommand {
    fn resolve(db: &SignalDatabase, config: &ActuatorCommandConfig) -> Result<Self> {
        let layout = CommandLayout::resolve(
            db,
            &config.message,
            config.bus,
            &config.counter_signal,
            &config.checksum_signal,
        )?;
        let commands = config
            .command_signals
            .iter()
            .map(|name| layout.signal(name))
            .collect::<Result<Vec<_>>>()?;
        let enable = layout.signal(&config.enable_signal)?;
        Ok(Self {
            layout,
            commands,
            scale: config.scale,
            enable,
        })
    }

    fn build(&self, amount: f64, deadband: f64, counter: u64) -> OutboundFrame {
        let mut data = empty_payload(&self.layout.message);
        let enable = amount > deadband;
        encode_signal(&mut data, &self.enable, if enable { 1.0 } else { 0.0 });
        // Exact zero when disabled so the actuator never rescales its range
        if enable {
            for command in &self.commands {
                encode_signal(&mut data, command, amount * self.scale);
            }
        }
        self.layout.finish(data, counter)
    }
}

struct CancelCommand {
    layout: CommandLayout,
    disable: SignalDefinition,
    disable_value: f64,
}

struct BlinkerRelay {
    message: MessageDefinition,
    bus: u8,
    period: u32,
    left: SignalDefinition,
    right: SignalDefinition,
}

pub struct FrameScheduler {
    emulated: Vec<EcuRole>,
    deadband: f64,
    steer: SteerCommand,
    gas_interceptor: Option<ActuatorCommand>,
    gas: Option<ActuatorCommand>,
    brake: Option<ActuatorCommand>,
    cancel: CancelCommand,
    blinker_relay: Option<BlinkerRelay>,
    static_frames: Vec<PeriodicFrameSpec>,
    alert_active: bool,
}

impl FrameScheduler {
    pub fn new(config: &VariantConfig, db: &SignalDatabase) -> Result<Self> {
        let commands = &config.commands;

        let steer_cfg = &commands.steer;
        let layout = CommandLayout::resolve(
            db,
            &steer_cfg.message,
            steer_cfg.bus,
            &steer_cfg.counter_signal,
            &steer_cfg.checksum_signal,
        )?;
        let steer = SteerCommand {
            torque: layout.signal(&steer_cfg.torque_signal)?,
            eps_torque: steer_cfg
                .eps_torque_signal
                .as_deref()
                .map(|name| layout.signal(name))
                .transpose()?,
            enable: layout.signal(&steer_cfg.enable_signal)?,
            layout,
        };

        let optional = |cfg: &Option<ActuatorCommandConfig>| {
            cfg.as_ref()
                .map(|cfg| ActuatorCommand::resolve(db, cfg))
                .transpose()
        };

        let cancel_cfg = &commands.cancel;
        let layout = CommandLayout::resolve(
            db,
            &cancel_cfg.message,
            cancel_cfg.bus,
            &cancel_cfg.counter_signal,
            &cancel_cfg.checksum_signal,
        )?;
        let cancel = CancelCommand {
            disable: layout.signal(&cancel_cfg.disable_signal)?,
            disable_value: cancel_cfg.disable_value,
            layout,
        };

        let blinker_relay = match &commands.blinker_relay {
            Some(relay) => {
                let message = db
                    .get_message_by_name(&relay.message)
                    .cloned()
                    .ok_or_else(|| InterfaceError::MessageNotFound(relay.message.clone()))?;
                Some(BlinkerRelay {
                    left: resolve_signal(&message, &relay.left_signal)?,
                    right: resolve_signal(&message, &relay.right_signal)?,
                    bus: relay.bus,
                    period: relay.period,
                    message,
                })
            }
            None => None,
        };

        let scheduler = Self {
            emulated: config.emulated_ecus.clone(),
            deadband: config.actuator_deadband,
            steer,
            gas_interceptor: optional(&commands.gas_interceptor)?,
            gas: optional(&commands.gas)?,
            brake: optional(&commands.brake)?,
            cancel,
            blinker_relay,
            static_frames: config.static_frames.clone(),
            alert_active: false,
        };

        log::info!(
            "Frame scheduler ready: {} static frames, emulating {:?}",
            scheduler
                .static_frames
                .iter()
                .filter(|f| scheduler.emulated.contains(&f.ecu))
                .count(),
            scheduler.emulated
        );

        Ok(scheduler)
    }

    pub fn tick(&mut self, ctx: &TickContext) -> ScheduledCycle {
        let cycle = ctx.cycle;
        let actuation = &ctx.actuation;
        let mut frames = Vec::new();

        if self.emulated.contains(&EcuRole::ForwardCamera) {
            frames.push(self.steer_frame(ctx.steer, cycle));
        }

        let (gas, brake) = if actuation.enabled {
            (clip_unit(actuation.gas), clip_unit(actuation.brake))
        } else {
            (0.0, 0.0)
        };
        let cancel = actuation.cancel_requested || (!actuation.enabled && ctx.cruise_enabled);

        if cycle % 2 == 0 {
            let counter = cycle / 2;
            if let Some(interceptor) = &self.gas_interceptor {
                frames.push(interceptor.build(gas, self.deadband, counter));
            }
            if let Some(actuator) = &self.gas {
                frames.push(actuator.build(gas, self.deadband, counter));
            }
            if let Some(actuator) = &self.brake {
                frames.push(actuator.build(brake, self.deadband, counter));
            }
            if cancel {
                frames.push(self.cancel_frame(counter));
            }
        }

        for spec in &self.static_frames {
            if self.emulated.contains(&spec.ecu) && cycle % spec.period as u64 == 0 {
                frames.push(static_frame(spec, cycle));
            }
        }

        if let Some(relay) = &self.blinker_relay {
            if cycle % relay.period as u64 == 0 {
                let mut data = empty_payload(&relay.message);
                encode_signal(&mut data, &relay.left, ctx.blinkers.0 as u8 as f64);
                encode_signal(&mut data, &relay.right, ctx.blinkers.1 as u8 as f64);
                frames.push(OutboundFrame::new(relay.message.id, relay.bus, data));
            }
        }

        let hud = HudStatus {
            send_ui: self.alert_edge(ctx.hud_alert, cycle) || cancel,
            alert: ctx.hud_alert,
            left_blinker: ctx.blinkers.0,
            right_blinker: ctx.blinkers.1,
        };

        log::trace!("cycle {}: {} frames, send_ui {}", cycle, frames.len(), hud.send_ui);

        ScheduledCycle { frames, hud }
    }

    fn steer_frame(&self, steer: SteerOutput, cycle: u64) -> OutboundFrame {
        let command = &self.steer;
        let mut data = empty_payload(&command.layout.message);
        encode_signal(&mut data, &command.enable, steer.request_active as u8 as f64);
        if let Some(eps_torque) = &command.eps_torque {
            encode_signal(&mut data, eps_torque, 0.0);
        }
        if steer.request_active {
            encode_signal(&mut data, &command.torque, steer.torque as f64);
        }
        command.layout.finish(data, cycle)
    }

    fn cancel_frame(&self, counter: u64) -> OutboundFrame {
        let mut data = empty_payload(&self.cancel.layout.message);
        encode_signal(&mut data, &self.cancel.disable, self.cancel.disable_value);
        self.cancel.layout.finish(data, counter)
    }

    /// True when an FCW/steer-required alert starts or stops
    fn alert_edge(&mut self, alert: VisualAlert, cycle: u64) -> bool {
        if alert.is_active() != self.alert_active {
            self.alert_active = alert.is_active();
            log::debug!("HUD alert changed to {} at cycle {}", alert, cycle);
            true
        } else {
            false
        }
    }
}

/// Keep-alive payload for a due frame, with its rolling counter applied
pub fn static_frame(spec: &PeriodicFrameSpec, cycle: u64) -> OutboundFrame {
    let n = cycle / spec.period as u64;
    let mut data = Vec::with_capacity(spec.payload.len() + 1);

    match spec.counter {
        CounterRule::None => data.extend_from_slice(&spec.payload),
        CounterRule::Shifted { modulus, shift } => {
            let counter = ((n % modulus as u64) + 1) << shift;
            data.push(counter as u8);
            data.extend_from_slice(&spec.payload);
        }
        CounterRule::Nibble { modulus, flags } => {
            let counter = (n % modulus as u64) + 1;
            data.extend_from_slice(&spec.payload);
            data.push(counter as u8 | flags);
        }
    }

    OutboundFrame::new(spec.address, spec.bus, data)
}

fn clip_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
