//! Signal schema
//!
//! The state decoder never looks signals up by name at runtime. Every input it
//! reads is a [`Signal`], bound by the variant configuration to a catalog
//! message/signal pair and to the bus tap it arrives on. [`SignalSchema::bind`]
//! resolves all bindings against the catalog once, so a missing or misspelled
//! signal is a load-time error instead of a silent zero.

use crate::config::{GasSource, VariantConfig};
use crate::signals::database::SignalDatabase;
use crate::types::{InterfaceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inputs consumed by the vehicle state decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    WheelSpeedFl,
    WheelSpeedFr,
    WheelSpeedRl,
    WheelSpeedRr,
    WheelSpeedFlagFl,
    WheelSpeedFlagFr,
    WheelSpeedFlagRl,
    WheelSpeedFlagRr,
    SteerAngle,
    SteerFraction,
    SteerRate,
    SteerTorqueDriver,
    SteerTorqueDirection,
    SteerTorqueEps,
    LkaState,
    TurnLeft,
    TurnRight,
    CruiseEngaged,
    CruiseMainOn,
    CruiseAccelResume,
    CruiseSetCoast,
    CruiseSpeed,
    BrakeSensor,
    GasPedal,
    InterceptorGas,
    InterceptorGas2,
    Gear,
}

impl Signal {
    pub const COUNT: usize = 27;

    pub const ALL: [Signal; Signal::COUNT] = [
        Signal::WheelSpeedFl,
        Signal::WheelSpeedFr,
        Signal::WheelSpeedRl,
        Signal::WheelSpeedRr,
        Signal::WheelSpeedFlagFl,
        Signal::WheelSpeedFlagFr,
        Signal::WheelSpeedFlagRl,
        Signal::WheelSpeedFlagRr,
        Signal::SteerAngle,
        Signal::SteerFraction,
        Signal::SteerRate,
        Signal::SteerTorqueDriver,
        Signal::SteerTorqueDirection,
        Signal::SteerTorqueEps,
        Signal::LkaState,
        Signal::TurnLeft,
        Signal::TurnRight,
        Signal::CruiseEngaged,
        Signal::CruiseMainOn,
        Signal::CruiseAccelResume,
        Signal::CruiseSetCoast,
        Signal::CruiseSpeed,
        Signal::BrakeSensor,
        Signal::GasPedal,
        Signal::InterceptorGas,
        Signal::InterceptorGas2,
        Signal::Gear,
    ];

    pub const WHEEL_SPEEDS: [Signal; 4] = [
        Signal::WheelSpeedFl,
        Signal::WheelSpeedFr,
        Signal::WheelSpeedRl,
        Signal::WheelSpeedRr,
    ];

    pub const WHEEL_SPEED_FLAGS: [Signal; 4] = [
        Signal::WheelSpeedFlagFl,
        Signal::WheelSpeedFlagFr,
        Signal::WheelSpeedFlagRl,
        Signal::WheelSpeedFlagRr,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the variant cannot run without this signal bound
    pub fn is_required(self, config: &VariantConfig) -> bool {
        match self {
            Signal::SteerTorqueDirection | Signal::CruiseSpeed => false,
            Signal::GasPedal => matches!(config.gas_source, GasSource::Pedal { .. }),
            Signal::InterceptorGas | Signal::InterceptorGas2 => {
                matches!(config.gas_source, GasSource::Interceptor { .. })
            }
            _ => true,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which bus tap a signal is sampled from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusTapId {
    /// Powertrain bus
    #[default]
    Primary,
    /// Camera-relayed bus
    Auxiliary,
}

/// Configured location of one signal in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBinding {
    /// Catalog message name
    pub message: String,
    /// Catalog signal name within the message
    pub signal: String,
    /// Bus tap the message is received on
    #[serde(default)]
    pub tap: BusTapId,
    /// Physical value used until the message arrives, and while it is stale
    #[serde(default)]
    pub default: f64,
}

impl SignalBinding {
    pub fn new(message: impl Into<String>, signal: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            signal: signal.into(),
            tap: BusTapId::Primary,
            default: 0.0,
        }
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = default;
        self
    }

    pub fn on_tap(mut self, tap: BusTapId) -> Self {
        self.tap = tap;
        self
    }
}

/// A binding resolved against the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBinding {
    pub message_id: u32,
    pub signal_index: usize,
    pub tap: BusTapId,
    pub default: f64,
}

/// All signal bindings of a variant, validated against the catalog
#[derive(Debug, Clone)]
pub struct SignalSchema {
    bindings: [Option<ResolvedBinding>; Signal::COUNT],
}

impl SignalSchema {
    /// Resolve every configured binding
    ///
    /// Fails if a required signal has no binding, or if any binding names a
    /// message or signal the catalog does not define.
    pub fn bind(config: &VariantConfig, db: &SignalDatabase) -> Result<Self> {
        let mut bindings = [None; Signal::COUNT];

        for signal in Signal::ALL {
            let Some(binding) = config.signals.get(&signal) else {
                if signal.is_required(config) {
                    return Err(InterfaceError::MissingBinding(signal.to_string()));
                }
                continue;
            };

            let message = db
                .get_message_by_name(&binding.message)
                .ok_or_else(|| InterfaceError::MessageNotFound(binding.message.clone()))?;

            let signal_index = message.signal_index(&binding.signal).ok_or_else(|| {
                InterfaceError::SignalNotFound {
                    message: binding.message.clone(),
                    signal: binding.signal.clone(),
                }
            })?;

            bindings[signal.index()] = Some(ResolvedBinding {
                message_id: message.id,
                signal_index,
                tap: binding.tap,
                default: binding.default,
            });
        }

        log::info!(
            "Bound {} of {} signals for variant '{}'",
            bindings.iter().filter(|b| b.is_some()).count(),
            Signal::COUNT,
            config.name
        );

        Ok(Self { bindings })
    }

    pub fn binding(&self, signal: Signal) -> Option<&ResolvedBinding> {
        self.bindings[signal.index()].as_ref()
    }

    /// Tap a signal is read from; unbound signals read as the primary default
    pub fn tap(&self, signal: Signal) -> BusTapId {
        self.binding(signal).map(|b| b.tap).unwrap_or_default()
    }

    /// Bound signals on one tap, with their bindings
    pub fn bound_on(&self, tap: BusTapId) -> impl Iterator<Item = (Signal, &ResolvedBinding)> + '_ {
        Signal::ALL.into_iter().filter_map(move |signal| {
            self.binding(signal)
                .filter(|b| b.tap == tap)
                .map(|b| (signal, b))
        })
    }
}

/// One cycle's sampled signal values from a single bus tap
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSnapshot {
    values: [Option<f64>; Signal::COUNT],
    /// Value is a binding default standing in for a timed-out message
    stale: [bool; Signal::COUNT],
    /// Every message bound on this tap arrived within its timeout
    pub can_valid: bool,
}

impl SignalSnapshot {
    /// Snapshot with no bound signals (a tap that carries nothing)
    pub fn empty() -> Self {
        Self {
            values: [None; Signal::COUNT],
            stale: [false; Signal::COUNT],
            can_valid: true,
        }
    }

    pub fn set(&mut self, signal: Signal, value: f64) {
        self.values[signal.index()] = Some(value);
        self.stale[signal.index()] = false;
    }

    /// Fill in a default for a signal whose message timed out
    pub fn set_stale(&mut self, signal: Signal, default: f64) {
        self.values[signal.index()] = Some(default);
        self.stale[signal.index()] = true;
    }

    pub fn is_stale(&self, signal: Signal) -> bool {
        self.stale[signal.index()]
    }

    pub fn with(mut self, signal: Signal, value: f64) -> Self {
        self.set(signal, value);
        self
    }

    pub fn try_get(&self, signal: Signal) -> Option<f64> {
        self.values[signal.index()]
    }

    /// Value of a signal; signals this tap does not carry read as 0
    pub fn get(&self, signal: Signal) -> f64 {
        self.try_get(signal).unwrap_or(0.0)
    }

    pub fn flag(&self, signal: Signal) -> bool {
        self.get(signal) != 0.0
    }
}

impl Default for SignalSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::signals::database::tests::{message, signal};
    use std::collections::BTreeMap;

    /// Catalog holding exactly the messages and signals a variant binds
    pub(crate) fn catalog_for(config: &VariantConfig) -> SignalDatabase {
        let mut layouts: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for binding in config.signals.values() {
            let signals = layouts.entry(binding.message.as_str()).or_default();
            if !signals.contains(&binding.signal.as_str()) {
                signals.push(binding.signal.as_str());
            }
        }

        let messages = layouts
            .into_iter()
            .enumerate()
            .map(|(i, (name, signals))| {
                let signals = signals
                    .into_iter()
                    .enumerate()
                    .map(|(j, sig)| signal(sig, (j * 8) as u16, 8))
                    .collect();
                message(0x100 + i as u32, name, 8, signals)
            })
            .collect();

        SignalDatabase::from_messages(messages)
    }

    fn catalog() -> SignalDatabase {
        SignalDatabase::from_messages(vec![message(
            0xAA,
            "WHEEL_SPEEDS",
            8,
            vec![signal("WHEEL_SPEED_FL", 0, 14), signal("SENSOR_ERROR_FL", 56, 1)],
        )])
    }

    #[test]
    fn test_signal_indices_are_dense() {
        for (i, signal) in Signal::ALL.iter().enumerate() {
            assert_eq!(signal.index(), i);
        }
    }

    #[test]
    fn test_unknown_message() {
        let mut config = VariantConfig::celica();
        config.signals.clear();
        config.signals.insert(
            Signal::WheelSpeedFl,
            SignalBinding::new("WHEEL_SPEED", "WHEEL_SPEED_FL"),
        );
        let err = SignalSchema::bind(&config, &catalog()).unwrap_err();
        assert!(matches!(err, InterfaceError::MessageNotFound(name) if name == "WHEEL_SPEED"));
    }

    #[test]
    fn test_bind_subset() {
        let mut config = VariantConfig::celica();
        config.signals.retain(|signal, _| {
            matches!(signal, Signal::WheelSpeedFl | Signal::WheelSpeedFlagFl)
        });
        // Everything else is required, so binding the subset must fail on the next signal
        let err = SignalSchema::bind(&config, &catalog()).unwrap_err();
        assert!(matches!(err, InterfaceError::MissingBinding(name) if name == "WheelSpeedFr"));
    }

    #[test]
    fn test_unknown_signal_in_known_message() {
        let mut config = VariantConfig::celica();
        config.signals.clear();
        config.signals.insert(Signal::WheelSpeedFl, SignalBinding::new("WHEEL_SPEEDS", "NOPE"));
        let err = SignalSchema::bind(&config, &catalog()).unwrap_err();
        assert!(matches!(err, InterfaceError::SignalNotFound { .. }));
    }

    #[test]
    fn test_missing_binding_reported_by_name() {
        let mut config = VariantConfig::celica();
        config.signals.clear();
        let err = SignalSchema::bind(&config, &catalog()).unwrap_err();
        match err {
            InterfaceError::MissingBinding(name) => assert_eq!(name, "WheelSpeedFl"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bind_full_variant() {
        let config = VariantConfig::celica().with_gas_interceptor();
        let schema = SignalSchema::bind(&config, &catalog_for(&config)).unwrap();
        assert!(schema.binding(Signal::InterceptorGas).is_some());
        assert!(schema.binding(Signal::SteerTorqueDirection).is_none());
        assert_eq!(schema.tap(Signal::Gear), BusTapId::Primary);
        assert_eq!(schema.bound_on(BusTapId::Auxiliary).count(), 0);
        assert_eq!(
            schema.binding(Signal::TurnLeft).map(|b| b.default),
            Some(1.0)
        );
    }

    #[test]
    fn test_optional_signals() {
        let config = VariantConfig::celica();
        assert!(!Signal::SteerTorqueDirection.is_required(&config));
        assert!(Signal::GasPedal.is_required(&config));
        assert!(!Signal::InterceptorGas.is_required(&config));

        let interceptor = VariantConfig::celica().with_gas_interceptor();
        assert!(!Signal::GasPedal.is_required(&interceptor));
        assert!(Signal::InterceptorGas2.is_required(&interceptor));
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = SignalSnapshot::empty()
            .with(Signal::TurnLeft, 1.0)
            .with(Signal::SteerAngle, -12.5);
        assert!(snapshot.flag(Signal::TurnLeft));
        assert_eq!(snapshot.get(Signal::SteerAngle), -12.5);
        assert_eq!(snapshot.try_get(Signal::Gear), None);
        assert_eq!(snapshot.get(Signal::Gear), 0.0);
    }
}
