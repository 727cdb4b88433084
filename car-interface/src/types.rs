//! Core types shared by the control core
//!
//! Raw inbound frames, outbound frames handed to the transport, the planner's
//! actuation request and the library error type. Everything that runs once per
//! cycle is total; only catalog loading and schema binding can fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Result type for load-time operations
pub type Result<T> = std::result::Result<T, InterfaceError>;

/// Raw CAN frame received from one of the bus taps
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    /// Receive timestamp in nanoseconds since epoch
    pub timestamp_ns: u64,
    /// Bus number the frame was received on
    pub bus: u8,
    /// CAN message ID (11-bit or 29-bit)
    pub address: u32,
    /// Frame data bytes
    pub data: Vec<u8>,
}

impl CanFrame {
    pub fn new(bus: u8, address: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp_ns: 0,
            bus,
            address,
            data: data.into(),
        }
    }

    /// Convert timestamp from nanoseconds to DateTime<Utc>
    pub fn timestamp(&self) -> Timestamp {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nsecs = (self.timestamp_ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs).unwrap_or_else(|| Utc::now())
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// A frame produced for the transport this cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub address: u32,
    pub bus: u8,
    pub data: Vec<u8>,
}

impl OutboundFrame {
    pub fn new(address: u32, bus: u8, data: Vec<u8>) -> Self {
        Self { address, bus, data }
    }
}

/// candump-style `ADDR#DATA`
impl fmt::Display for OutboundFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}#", self.address)?;
        for byte in &self.data {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Desired actuation supplied by the planner once per cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuationRequest {
    /// Steering torque as a fraction of the configured maximum, [-1, 1]
    pub steer: f64,
    /// Gas pedal fraction, [0, 1]
    pub gas: f64,
    /// Brake pedal fraction, [0, 1]
    pub brake: f64,
    /// Longitudinal/lateral control engaged
    pub enabled: bool,
    /// Planner asks the cruise system to disengage
    pub cancel_requested: bool,
}

/// Visual alert category requested by the planner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualAlert {
    #[default]
    None,
    /// Forward collision warning
    Fcw,
    /// Driver must take over steering
    SteerRequired,
}

impl VisualAlert {
    /// True for the alerts that drive the HUD edge logic
    pub fn is_active(&self) -> bool {
        matches!(self, VisualAlert::Fcw | VisualAlert::SteerRequired)
    }
}

impl fmt::Display for VisualAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualAlert::None => write!(f, "none"),
            VisualAlert::Fcw => write!(f, "fcw"),
            VisualAlert::SteerRequired => write!(f, "steer_required"),
        }
    }
}

/// Errors raised while loading the catalog or binding configuration
#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Message not found in catalog: {0}")]
    MessageNotFound(String),

    #[error("Signal not found in catalog: {message}.{signal}")]
    SignalNotFound { message: String, signal: String },

    #[error("No binding configured for required signal: {0}")]
    MissingBinding(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_frame_display() {
        let frame = OutboundFrame::new(0x2E4, 0, vec![0x01, 0xAB, 0x00]);
        assert_eq!(frame.to_string(), "2E4#01AB00");

        let short = OutboundFrame::new(0x25, 1, vec![]);
        assert_eq!(short.to_string(), "025#");
    }

    #[test]
    fn test_frame_timestamp() {
        let mut frame = CanFrame::new(0, 0x123, vec![0u8; 8]);
        frame.timestamp_ns = 1_500_000_000;
        assert_eq!(frame.timestamp().timestamp(), 1);
        assert_eq!(frame.timestamp().timestamp_subsec_millis(), 500);
        assert_eq!(frame.dlc(), 8);
    }

    #[test]
    fn test_visual_alert_activity() {
        assert!(!VisualAlert::None.is_active());
        assert!(VisualAlert::Fcw.is_active());
        assert!(VisualAlert::SteerRequired.is_active());
    }
}
