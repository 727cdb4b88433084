//! Bus taps
//!
//! A [`BusTap`] listens to one physical bus, decodes the frames of messages the
//! signal schema binds to it and keeps the latest value of every bound signal.
//! Once per cycle it is sampled into a [`SignalSnapshot`]; messages not seen
//! within the timeout contribute their binding defaults and clear `can_valid`.

use crate::signals::codec::decode_signal;
use crate::signals::database::{SignalDatabase, SignalDefinition};
use crate::signals::schema::{BusTapId, Signal, SignalSchema, SignalSnapshot};
use crate::types::{CanFrame, InterfaceError, Result};
use std::collections::HashMap;

/// One bound signal inside a tracked message
struct TrackedSignal {
    signal: Signal,
    definition: SignalDefinition,
    default: f64,
    value: Option<f64>,
}

/// Freshness and last decoded values of one message
struct TrackedMessage {
    name: String,
    size: usize,
    signals: Vec<TrackedSignal>,
    last_seen: Option<u64>,
    stale: bool,
}

pub struct BusTap {
    id: BusTapId,
    bus: u8,
    timeout_cycles: u64,
    messages: HashMap<u32, TrackedMessage>,
}

impl BusTap {
    /// Build a tap for every signal the schema binds to `id`
    pub fn new(
        id: BusTapId,
        bus: u8,
        schema: &SignalSchema,
        db: &SignalDatabase,
        timeout_cycles: u64,
    ) -> Result<Self> {
        let mut messages: HashMap<u32, TrackedMessage> = HashMap::new();

        for (signal, binding) in schema.bound_on(id) {
            let message = db.get_message(binding.message_id).ok_or_else(|| {
                InterfaceError::MessageNotFound(format!("0x{:X}", binding.message_id))
            })?;
            let definition = message.signals.get(binding.signal_index).cloned().ok_or_else(|| {
                InterfaceError::SignalNotFound {
                    message: message.name.clone(),
                    signal: signal.to_string(),
                }
            })?;

            messages
                .entry(message.id)
                .or_insert_with(|| TrackedMessage {
                    name: message.name.clone(),
                    size: message.size,
                    signals: Vec::new(),
                    last_seen: None,
                    stale: true,
                })
                .signals
                .push(TrackedSignal {
                    signal,
                    definition,
                    default: binding.default,
                    value: None,
                });
        }

        log::info!(
            "{:?} tap on bus {} tracks {} messages",
            id,
            bus,
            messages.len()
        );

        Ok(Self {
            id,
            bus,
            timeout_cycles,
            messages,
        })
    }

    pub fn id(&self) -> BusTapId {
        self.id
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    /// Decode a received frame; returns false for frames this tap ignores
    pub fn ingest(&mut self, frame: &CanFrame, cycle: u64) -> bool {
        if frame.bus != self.bus {
            return false;
        }
        let Some(message) = self.messages.get_mut(&frame.address) else {
            return false;
        };

        if frame.dlc() < message.size {
            log::warn!(
                "Dropping {} (0x{:X}): {} bytes, expected {}",
                message.name,
                frame.address,
                frame.dlc(),
                message.size
            );
            return false;
        }

        for tracked in &mut message.signals {
            tracked.value = decode_signal(&frame.data, &tracked.definition);
        }
        message.last_seen = Some(cycle);
        true
    }

    /// Sample the latest values for this cycle
    pub fn snapshot(&mut self, cycle: u64) -> SignalSnapshot {
        let mut snapshot = SignalSnapshot::empty();

        for message in self.messages.values_mut() {
            let fresh = message
                .last_seen
                .is_some_and(|seen| cycle.saturating_sub(seen) < self.timeout_cycles);

            if fresh == message.stale {
                if fresh {
                    log::debug!("{} is being received on bus {}", message.name, self.bus);
                } else {
                    log::warn!(
                        "{} not received on bus {} for {} cycles, using defaults",
                        message.name,
                        self.bus,
                        self.timeout_cycles
                    );
                }
                message.stale = !fresh;
            }

            if !fresh {
                snapshot.can_valid = false;
            }

            for tracked in &message.signals {
                match tracked.value.filter(|_| fresh) {
                    Some(value) => snapshot.set(tracked.signal, value),
                    None => snapshot.set_stale(tracked.signal, tracked.default),
                }
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariantConfig;
    use crate::signals::schema::tests::catalog_for;
    use crate::signals::schema::SignalBinding;

    fn tap() -> (BusTap, SignalDatabase) {
        let config = VariantConfig::celica();
        let db = catalog_for(&config);
        let schema = SignalSchema::bind(&config, &db).unwrap();
        let tap = BusTap::new(BusTapId::Primary, 0, &schema, &db, 10).unwrap();
        (tap, db)
    }

    fn pcm_cruise(db: &SignalDatabase, turn_l: u8) -> CanFrame {
        let message = db.get_message_by_name("PCM_CRUISE").unwrap();
        let index = message.signal_index("TURN_L").unwrap();
        // Test catalog lays each signal out as one byte
        let mut data = vec![0u8; 8];
        data[index] = turn_l;
        CanFrame::new(0, message.id, data)
    }

    #[test]
    fn test_defaults_before_first_frame() {
        let (mut tap, _db) = tap();
        let snapshot = tap.snapshot(0);
        assert!(!snapshot.can_valid);
        assert_eq!(snapshot.try_get(Signal::TurnLeft), Some(1.0));
        assert_eq!(snapshot.try_get(Signal::WheelSpeedFlagFl), Some(1.0));
        assert_eq!(snapshot.try_get(Signal::SteerAngle), Some(0.0));
        // Unbound signals are absent
        assert_eq!(snapshot.try_get(Signal::InterceptorGas), None);
        assert!(snapshot.is_stale(Signal::WheelSpeedFlagFl));
        assert!(!snapshot.is_stale(Signal::InterceptorGas));
    }

    #[test]
    fn test_ingest_and_timeout() {
        let (mut tap, db) = tap();
        assert!(tap.ingest(&pcm_cruise(&db, 0), 5));

        let snapshot = tap.snapshot(5);
        assert_eq!(snapshot.try_get(Signal::TurnLeft), Some(0.0));

        let snapshot = tap.snapshot(14);
        assert_eq!(snapshot.try_get(Signal::TurnLeft), Some(0.0));
        assert!(!snapshot.is_stale(Signal::TurnLeft));

        // Stale after the timeout: back to the default
        let snapshot = tap.snapshot(15);
        assert_eq!(snapshot.try_get(Signal::TurnLeft), Some(1.0));
        assert!(snapshot.is_stale(Signal::TurnLeft));
    }

    #[test]
    fn test_ignores_other_bus_and_unknown_ids() {
        let (mut tap, db) = tap();
        let mut frame = pcm_cruise(&db, 0);
        frame.bus = 1;
        assert!(!tap.ingest(&frame, 0));
        assert!(!tap.ingest(&CanFrame::new(0, 0x7FF, vec![0u8; 8]), 0));
    }

    #[test]
    fn test_short_frame_dropped() {
        let (mut tap, db) = tap();
        let mut frame = pcm_cruise(&db, 0);
        frame.data.truncate(2);
        assert!(!tap.ingest(&frame, 0));
        assert_eq!(tap.snapshot(0).try_get(Signal::TurnLeft), Some(1.0));
    }

    #[test]
    fn test_can_valid_once_all_messages_fresh() {
        let (mut tap, db) = tap();
        for id in db.get_all_can_ids() {
            assert!(tap.ingest(&CanFrame::new(0, id, vec![0u8; 8]), 3));
        }
        assert!(tap.snapshot(3).can_valid);
        assert!(!tap.snapshot(13).can_valid);
    }

    #[test]
    fn test_auxiliary_tap_only_tracks_its_bindings() {
        let config = VariantConfig::celica().with_binding(
            Signal::LkaState,
            SignalBinding::new("EPS_STATUS", "LKA_STATE").on_tap(BusTapId::Auxiliary),
        );
        let db = catalog_for(&config);
        let schema = SignalSchema::bind(&config, &db).unwrap();
        let mut aux = BusTap::new(BusTapId::Auxiliary, 2, &schema, &db, 10).unwrap();
        let eps = db.get_message_by_name("EPS_STATUS").unwrap();
        assert!(aux.ingest(&CanFrame::new(2, eps.id, vec![5, 0, 0, 0, 0, 0, 0, 0]), 0));

        let snapshot = aux.snapshot(0);
        assert!(snapshot.can_valid);
        assert_eq!(snapshot.try_get(Signal::LkaState), Some(5.0));
        assert_eq!(snapshot.try_get(Signal::Gear), None);
        assert_eq!(aux.id(), BusTapId::Auxiliary);
        assert_eq!(aux.bus(), 2);
    }
}
