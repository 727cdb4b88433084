//! Car Interface Library
//!
//! Control core between a vehicle's CAN network and a normalized
//! actuation/state model, driven once per 100 Hz control cycle.
//!
//! # Architecture
//!
//! - Decodes inbound frames through a DBC-backed catalog into per-cycle signal
//!   snapshots, then into a fused [`VehicleState`] (wheel speed fusion with
//!   per-channel validity, Kalman-filtered speed, cruise button edges)
//! - Limits steering torque by rate, motor error and EPS fault cooldown
//! - Schedules outbound command frames with rolling counters and CRC-8
//!   checksums, plus the keep-alive frames of emulated ECUs
//!
//! Everything that differs between vehicle variants is data in a
//! [`VariantConfig`]; the core has no per-variant code paths. Loading the
//! catalog and binding the configuration are the only fallible steps.
//!
//! The library does NOT:
//! - Talk to a bus (frames in, frames out)
//! - Identify the vehicle
//! - Render alerts
//!
//! # Example Usage
//!
//! ```no_run
//! use car_interface::{
//!     ActuationRequest, BusAssignment, CanFrame, CarInterface, SignalDatabase, VariantConfig,
//!     VisualAlert,
//! };
//! use std::path::Path;
//!
//! let mut db = SignalDatabase::new();
//! db.add_dbc(Path::new("toyota_celica_2003_pt.dbc")).unwrap();
//!
//! let mut car =
//!     CarInterface::new(VariantConfig::celica(), &db, BusAssignment::default()).unwrap();
//!
//! // Each cycle: feed received frames, then step once
//! car.ingest(&CanFrame::new(0, 0xAA, vec![0u8; 8]));
//! let request = ActuationRequest { steer: 0.1, enabled: true, ..Default::default() };
//! let output = car.step(&request, VisualAlert::None);
//!
//! for frame in &output.frames {
//!     println!("bus {} {}", frame.bus, frame);
//! }
//! println!("v_ego {:.2} m/s", car.state().v_ego);
//! ```

pub mod blinker;
pub mod bus;
pub mod checksum;
pub mod config;
pub mod controller;
pub mod scheduler;
pub mod signals;
pub mod speed_filter;
pub mod state;
pub mod steer_limiter;
pub mod types;

// Re-export main types for convenience
pub use config::{EcuRole, GasSource, PeriodicFrameSpec, VariantConfig, WheelSpeedFlag};
pub use controller::{BusAssignment, CarController, CarInterface, CycleOutput};
pub use scheduler::{FrameScheduler, HudStatus};
pub use signals::{Signal, SignalBinding, SignalDatabase};
pub use state::{GearShifter, VehicleState, VehicleStateDecoder};
pub use steer_limiter::{SteerOutput, TorqueRateLimiter};
pub use types::{
    ActuationRequest, CanFrame, InterfaceError, OutboundFrame, Result, Timestamp, VisualAlert,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
