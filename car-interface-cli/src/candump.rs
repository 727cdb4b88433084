//! candump log reader
//!
//! Reads logs written by `candump -l` / `candump -L`:
//!
//! ```text
//! (1436509052.249713) can0 0AA#0011223344556677
//! ```
//!
//! The bus number is taken from the trailing digits of the interface name.

use anyhow::{bail, Context, Result};
use car_interface::CanFrame;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse one log line; blank lines and comments yield `None`
pub fn parse_line(line: &str) -> Result<Option<CanFrame>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let (Some(stamp), Some(interface), Some(payload)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("expected '(timestamp) interface id#data', got '{}'", line);
    };

    let timestamp_ns = parse_timestamp(stamp)?;
    let bus = parse_bus(interface)?;

    let Some((id, data)) = payload.split_once('#') else {
        bail!("missing '#' in frame '{}'", payload);
    };
    let address = u32::from_str_radix(id, 16)
        .with_context(|| format!("invalid CAN id '{}'", id))?;

    if data.starts_with('R') {
        // Remote frames carry no payload to decode
        return Ok(None);
    }
    let data = parse_hex(data)?;

    Ok(Some(CanFrame {
        timestamp_ns,
        bus,
        address,
        data,
    }))
}

/// Read every frame of a log file
pub fn read_log(path: &Path) -> Result<Vec<CanFrame>> {
    let file = File::open(path).with_context(|| format!("Failed to open log file: {:?}", path))?;

    let mut frames = Vec::new();
    let mut skipped = 0usize;
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {:?}", path))?;
        match parse_line(&line) {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => {}
            Err(e) => {
                skipped += 1;
                log::warn!("{:?}:{}: {}", path, number + 1, e);
            }
        }
    }

    log::info!(
        "Read {} frames from {:?} ({} malformed lines skipped)",
        frames.len(),
        path,
        skipped
    );
    Ok(frames)
}

fn parse_timestamp(stamp: &str) -> Result<u64> {
    let inner = stamp
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .with_context(|| format!("timestamp '{}' is not parenthesized", stamp))?;
    let (secs, frac) = inner.split_once('.').unwrap_or((inner, "0"));

    let secs: u64 = secs
        .parse()
        .with_context(|| format!("invalid timestamp seconds '{}'", secs))?;
    if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
        bail!("invalid timestamp fraction '{}'", frac);
    }
    // Right-pad to nanoseconds
    let nanos: u64 = format!("{:0<9}", frac).parse()?;

    Ok(secs * 1_000_000_000 + nanos)
}

fn parse_bus(interface: &str) -> Result<u8> {
    let digits: String = interface
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        bail!("interface '{}' has no bus number", interface);
    }
    digits
        .parse()
        .with_context(|| format!("bus number of '{}' out of range", interface))
}

fn parse_hex(data: &str) -> Result<Vec<u8>> {
    if data.len() % 2 != 0 {
        bail!("odd number of hex digits in '{}'", data);
    }
    (0..data.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&data[i..i + 2], 16)
                .with_context(|| format!("invalid hex byte in '{}'", data))
        })
        .collect()
}
