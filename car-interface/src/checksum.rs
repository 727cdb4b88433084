//! CRC-8 used by the pedal/actuator command frames
//!
//! Polynomial 0xD5 (x^8 + x^7 + x^6 + x^4 + x^2 + 1), initial register 0xFF,
//! payload walked from the last byte to the first.

const CRC8_POLY: u8 = 0xD5;
const CRC8_INIT: u8 = 0xFF;

/// Compute the checksum of `payload`
///
/// `payload` must exclude the checksum byte itself.
pub fn crc8(payload: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;

    for &byte in payload.iter().rev() {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

/// Checksum of a full frame whose trailing byte is the checksum slot
pub fn checksum_frame(data: &[u8]) -> u8 {
    match data.split_last() {
        Some((_, body)) => crc8(body),
        None => crc8(&[]),
    }
}
