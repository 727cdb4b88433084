//! Signal codec
//!
//! Extracts physical signal values from raw CAN payloads and packs physical
//! values back into payloads, based on catalog signal definitions. Handles
//! Intel and Motorola bit layouts, sign extension and factor/offset scaling.

use crate::signals::database::{ByteOrder, MessageDefinition, SignalDefinition, ValueType};

/// Decode a single signal to its physical value
///
/// Returns `None` when the payload is too short to hold the signal.
pub fn decode_signal(data: &[u8], signal: &SignalDefinition) -> Option<f64> {
    let raw_value = extract_signal_value(data, signal)?;
    Some(signal.offset + signal.factor * (raw_value as f64))
}

/// Extract raw signal value from CAN frame data
fn extract_signal_value(data: &[u8], signal: &SignalDefinition) -> Option<i64> {
    let start_bit = signal.start_bit as usize;
    let length = signal.length as usize;
    if length == 0 || length > 64 {
        return None;
    }

    let raw_value = match signal.byte_order {
        ByteOrder::LittleEndian => extract_little_endian(data, start_bit, length),
        ByteOrder::BigEndian => extract_big_endian(data, start_bit, length),
    };

    let Some(raw_value) = raw_value else {
        log::warn!(
            "Signal '{}' does not fit in a {} byte frame",
            signal.name,
            data.len()
        );
        return None;
    };

    Some(match signal.value_type {
        ValueType::Unsigned => raw_value as i64,
        ValueType::Signed => sign_extend(raw_value, length),
    })
}

/// Extract signal with little-endian (Intel) byte order
///
/// The start bit is the LSB; bits grow towards higher bit numbers and bytes.
fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
    let mut result: u64 = 0;

    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte = *data.get(bit_pos / 8)?;
        let bit_value = (byte >> (bit_pos % 8)) & 0x01;
        result |= (bit_value as u64) << i;
    }

    Some(result)
}

/// Extract signal with big-endian (Motorola) byte order
///
/// The start bit is the MSB in DBC numbering (byte * 8 + bit, bit 7 is the
/// byte's MSB). Walking towards the LSB moves down within a byte, then to bit 7
/// of the next byte.
fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
    let mut result: u64 = 0;
    let mut bit_pos = start_bit;

    for _ in 0..length {
        let byte = *data.get(bit_pos / 8)?;
        let bit_value = (byte >> (bit_pos % 8)) & 0x01;
        result = (result << 1) | bit_value as u64;
        bit_pos = next_motorola_bit(bit_pos);
    }

    Some(result)
}

fn next_motorola_bit(bit_pos: usize) -> usize {
    if bit_pos % 8 == 0 {
        bit_pos + 15
    } else {
        bit_pos - 1
    }
}

/// Sign-extend a value from N bits to 64 bits
fn sign_extend(value: u64, bit_length: usize) -> i64 {
    if bit_length >= 64 {
        return value as i64;
    }

    let sign_bit = 1u64 << (bit_length - 1);
    if (value & sign_bit) != 0 {
        let mask = !0u64 << bit_length;
        (value | mask) as i64
    } else {
        value as i64
    }
}

/// Zeroed payload sized for a message
pub fn empty_payload(message: &MessageDefinition) -> Vec<u8> {
    vec![0u8; message.size]
}

/// Pack a physical value into `data`
///
/// The value is converted with the signal's factor/offset, rounded, and
/// truncated to the signal width (two's complement for signed signals). Bits
/// that fall outside `data` are dropped.
pub fn encode_signal(data: &mut [u8], signal: &SignalDefinition, physical: f64) {
    let length = signal.length as usize;
    if length == 0 || length > 64 {
        return;
    }

    let raw = ((physical - signal.offset) / signal.factor).round() as i64;
    let mask = if length == 64 { !0u64 } else { (1u64 << length) - 1 };
    let bits = (raw as u64) & mask;

    match signal.byte_order {
        ByteOrder::LittleEndian => {
            for i in 0..length {
                let bit_pos = signal.start_bit as usize + i;
                write_bit(data, bit_pos, (bits >> i) & 0x01 != 0);
            }
        }
        ByteOrder::BigEndian => {
            let mut bit_pos = signal.start_bit as usize;
            for i in 0..length {
                write_bit(data, bit_pos, (bits >> (length - 1 - i)) & 0x01 != 0);
                bit_pos = next_motorola_bit(bit_pos);
            }
        }
    }
}

fn write_bit(data: &mut [u8], bit_pos: usize, set: bool) {
    if let Some(byte) = data.get_mut(bit_pos / 8) {
        let mask = 1u8 << (bit_pos % 8);
        if set {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::tests::signal;

    #[test]
    fn test_extract_little_endian_simple() {
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(extract_little_endian(&data, 0, 8), Some(0xAB));
    }

    #[test]
    fn test_extract_little_endian_cross_byte() {
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(extract_little_endian(&data, 0, 16), Some(0xCDAB));
    }

    #[test]
    fn test_extract_big_endian_simple() {
        // Signal: 8 bits with MSB at bit 7 (byte 0)
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(extract_big_endian(&data, 7, 8), Some(0xAB));
    }

    #[test]
    fn test_extract_big_endian_cross_byte() {
        // 12 bits: all of byte 0 then the high nibble of byte 1
        let data = vec![0xAB, 0xCD];
        assert_eq!(extract_big_endian(&data, 7, 12), Some(0xABC));
    }

    #[test]
    fn test_extract_out_of_range() {
        let data = vec![0xAB];
        assert_eq!(extract_little_endian(&data, 4, 8), None);
        assert_eq!(extract_big_endian(&data, 7, 12), None);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x7F, 8), 127);
        assert_eq!(sign_extend(0xFF, 8), -1);
        assert_eq!(sign_extend(0x8000, 16), -32768);
    }

    #[test]
    fn test_decode_scaled_signed() {
        let mut sig = signal("STEER_TORQUE_DRIVER", 0, 16);
        sig.value_type = ValueType::Signed;
        sig.factor = 0.5;
        // -20 raw => -10.0 physical
        let data = (-20i16).to_le_bytes();
        assert_eq!(decode_signal(&data, &sig), Some(-10.0));
    }

    #[test]
    fn test_encode_little_endian_counter() {
        let sig = signal("COUNTER_PEDAL", 36, 4);
        let mut data = vec![0u8; 6];
        encode_signal(&mut data, &sig, 11.0);
        assert_eq!(data[4], 0xB0);

        // Overwrites rather than ORs
        encode_signal(&mut data, &sig, 2.0);
        assert_eq!(data[4], 0x20);
    }

    #[test]
    fn test_encode_truncates_to_width() {
        let sig = signal("COUNTER_PEDAL", 0, 4);
        let mut data = vec![0u8; 1];
        encode_signal(&mut data, &sig, 17.0);
        assert_eq!(data[0], 0x01);
    }

    #[test]
    fn test_encode_signed_big_endian() {
        let mut sig = signal("STEER_TORQUE_CMD", 7, 16);
        sig.byte_order = ByteOrder::BigEndian;
        sig.value_type = ValueType::Signed;
        let mut data = vec![0u8; 2];
        encode_signal(&mut data, &sig, -2.0);
        assert_eq!(data, vec![0xFF, 0xFE]);
        assert_eq!(decode_signal(&data, &sig), Some(-2.0));
    }

    #[test]
    fn test_encode_applies_factor_and_offset() {
        let mut sig = signal("PRESSURE_TARGET", 0, 16);
        sig.factor = 0.25;
        sig.offset = -10.0;
        let mut data = vec![0u8; 2];
        encode_signal(&mut data, &sig, 0.0);
        // (0 - -10) / 0.25 = 40
        assert_eq!(data, vec![40, 0]);
    }
}
