//! DBC file parser
//!
//! Parses Vector DBC files and converts them into the catalog's message format.

use crate::signals::database::{ByteOrder, MessageDefinition, SignalDefinition, ValueType};
use crate::types::{InterfaceError, Result};
use std::path::Path;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        InterfaceError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // Fall back to Latin-1 (compatible with Windows-1252) when not UTF-8
    let dbc_content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    let messages = parse_dbc_str(&dbc_content, source_filename)?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Parse DBC text already in memory
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        InterfaceError::DbcParseError(format!("Failed to parse DBC {}: {:?}", source, e))
    })?;

    Ok(dbc
        .messages()
        .iter()
        .map(|dbc_msg| convert_message(dbc_msg, source))
        .collect())
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(dbc_msg: &can_dbc::Message, source: &str) -> MessageDefinition {
    let signals = dbc_msg
        .signals()
        .iter()
        .filter_map(|dbc_sig| {
            if matches!(
                dbc_sig.multiplexer_indicator(),
                can_dbc::MultiplexIndicator::MultiplexedSignal(_)
            ) {
                // Command and sensor frames are never multiplexed
                log::debug!(
                    "Skipping multiplexed signal {}.{}",
                    dbc_msg.message_name(),
                    dbc_sig.name()
                );
                return None;
            }
            Some(convert_signal(dbc_sig))
        })
        .collect();

    MessageDefinition {
        id: dbc_msg.message_id().0,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
        source: source.to_string(),
    }
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(dbc_sig: &can_dbc::Signal) -> SignalDefinition {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: *dbc_sig.signal_size() as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        min: *dbc_sig.min(),
        max: *dbc_sig.max(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PEDAL_DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: EON PEDAL

BO_ 512 GAS_COMMAND: 6 EON
 SG_ GAS_COMMAND : 0|16@1+ (1,0) [0|255] "" PEDAL
 SG_ GAS_COMMAND2 : 16|16@1+ (1,0) [0|255] "" PEDAL
 SG_ ENABLE : 32|1@1+ (1,0) [0|1] "" PEDAL
 SG_ COUNTER_PEDAL : 36|4@1+ (1,0) [0|15] "" PEDAL
 SG_ CHECKSUM_PEDAL : 40|8@1+ (1,0) [0|255] "" PEDAL

BO_ 37 STEER_ANGLE_SENSOR: 8 PEDAL
 SG_ STEER_ANGLE : 7|12@0- (1.5,0) [-500|500] "deg" EON
"#;

    #[test]
    fn test_parse_dbc_str() {
        let messages = parse_dbc_str(PEDAL_DBC, "pedal.dbc").unwrap();
        assert_eq!(messages.len(), 2);

        let gas = messages.iter().find(|m| m.id == 512).unwrap();
        assert_eq!(gas.name, "GAS_COMMAND");
        assert_eq!(gas.size, 6);
        assert_eq!(gas.sender, Some("EON".to_string()));
        assert_eq!(gas.signals.len(), 5);
        assert_eq!(gas.source, "pedal.dbc");

        let counter = gas.signal("COUNTER_PEDAL").unwrap();
        assert_eq!(counter.start_bit, 36);
        assert_eq!(counter.length, 4);
        assert_eq!(counter.byte_order, ByteOrder::LittleEndian);

        let angle = messages.iter().find(|m| m.id == 37).unwrap();
        let sig = angle.signal("STEER_ANGLE").unwrap();
        assert_eq!(sig.byte_order, ByteOrder::BigEndian);
        assert_eq!(sig.value_type, ValueType::Signed);
        assert_eq!(sig.factor, 1.5);
        assert_eq!(sig.unit, Some("deg".to_string()));
    }

    #[test]
    fn test_parse_dbc_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(PEDAL_DBC.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let messages = parse_dbc_file(temp_file.path()).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let result = parse_dbc_file(Path::new("/nonexistent/vehicle.dbc"));
        assert!(matches!(result, Err(InterfaceError::DbcParseError(_))));
    }
}
