//! Per-cycle output in text or JSON lines

use crate::config::OutputFormat;
use crate::replay::ReplayStats;
use anyhow::{Context, Result};
use car_interface::{CycleOutput, HudStatus, SteerOutput, VehicleState};
use chrono::SecondsFormat;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct FrameRecord {
    bus: u8,
    frame: String,
}

#[derive(Serialize)]
struct CycleRecord<'a> {
    cycle: u64,
    frames: Vec<FrameRecord>,
    hud: &'a HudStatus,
    steer: &'a SteerOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a VehicleState>,
}

pub struct Report {
    out: Box<dyn Write>,
    format: OutputFormat,
    include_state: bool,
}

impl Report {
    pub fn new(out: Box<dyn Write>, format: OutputFormat, include_state: bool) -> Self {
        Self {
            out,
            format,
            include_state,
        }
    }

    /// Write to a file, or stdout when no path is given
    pub fn open(path: Option<&Path>, format: OutputFormat, include_state: bool) -> Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {:?}", path))?;
                log::info!("Writing output to {:?}", path);
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout())),
        };
        Ok(Self::new(out, format, include_state))
    }

    pub fn write_cycle(&mut self, output: &CycleOutput, state: &VehicleState) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.write_json(output, state),
            OutputFormat::Text => self.write_text(output, state),
        }
    }

    fn write_json(&mut self, output: &CycleOutput, state: &VehicleState) -> Result<()> {
        let record = CycleRecord {
            cycle: output.cycle,
            frames: output
                .frames
                .iter()
                .map(|f| FrameRecord {
                    bus: f.bus,
                    frame: f.to_string(),
                })
                .collect(),
            hud: &output.hud,
            steer: &output.steer,
            state: self.include_state.then_some(state),
        };
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_text(&mut self, output: &CycleOutput, state: &VehicleState) -> Result<()> {
        let steer = &output.steer;
        write!(
            self.out,
            "cycle {:>6}  torque {:>5}{}",
            output.cycle,
            steer.torque,
            if steer.rate_limited { " (limited)" } else { "" }
        )?;
        if output.hud.send_ui {
            write!(self.out, "  hud {}", output.hud.alert)?;
        }
        if self.include_state {
            write!(
                self.out,
                "  v_ego {:6.2} m/s  angle {:7.2}  gear {}  cruise {}{}{}",
                state.v_ego,
                state.steering_angle,
                state.gear,
                if state.cruise.enabled { "on" } else { "off" },
                if state.steer_fault { "  STEER FAULT" } else { "" },
                if state.can_valid { "" } else { "  CAN INVALID" },
            )?;
        }
        writeln!(self.out)?;

        for frame in &output.frames {
            writeln!(self.out, "    bus {}  {}", frame.bus, frame)?;
        }
        Ok(())
    }

    pub fn finish(mut self, stats: &ReplayStats) -> Result<()> {
        self.out.flush()?;

        log::info!(
            "{} cycles, {} frames in, {} frames out",
            stats.cycles,
            stats.frames_in,
            stats.frames_out
        );
        if let (Some(first), Some(span)) = (stats.first_frame, stats.span()) {
            log::info!(
                "Log starts {} and spans {:.3} s",
                first.to_rfc3339_opts(SecondsFormat::Millis, true),
                span.num_milliseconds() as f64 / 1000.0
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use car_interface::OutboundFrame;
    use std::sync::{Arc, Mutex};

    /// Writer whose contents stay readable after the report takes it
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn output() -> CycleOutput {
        CycleOutput {
            cycle: 7,
            frames: vec![OutboundFrame::new(0x2E4, 2, vec![0x0A, 0x00, 0x00, 0x17, 0x5C])],
            hud: HudStatus::default(),
            steer: SteerOutput {
                torque: 10,
                request_active: true,
                rate_limited: true,
            },
        }
    }

    #[test]
    fn test_json_lines() {
        let sink = Shared::default();
        let mut report = Report::new(Box::new(sink.clone()), OutputFormat::Json, false);
        report.write_cycle(&output(), &VehicleState::default()).unwrap();
        report.write_cycle(&output(), &VehicleState::default()).unwrap();

        let text = sink.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["cycle"], 7);
        assert_eq!(value["frames"][0]["frame"], "2E4#0A0000175C");
        assert_eq!(value["frames"][0]["bus"], 2);
        assert_eq!(value["steer"]["torque"], 10);
        assert!(value.get("state").is_none());
    }

    #[test]
    fn test_json_with_state() {
        let sink = Shared::default();
        let mut report = Report::new(Box::new(sink.clone()), OutputFormat::Json, true);
        let state = VehicleState {
            v_ego: 12.5,
            ..VehicleState::default()
        };
        report.write_cycle(&output(), &state).unwrap();

        let value: serde_json::Value = serde_json::from_str(sink.text().trim()).unwrap();
        assert_eq!(value["state"]["v_ego"], 12.5);
        assert_eq!(value["state"]["gear"], "unknown");
    }

    #[test]
    fn test_text_output() {
        let sink = Shared::default();
        let mut report = Report::new(Box::new(sink.clone()), OutputFormat::Text, true);
        report.write_cycle(&output(), &VehicleState::default()).unwrap();

        let text = sink.text();
        assert!(text.contains("torque    10 (limited)"));
        assert!(text.contains("gear ?"));
        assert!(text.contains("CAN INVALID"));
        assert!(text.contains("bus 2  2E4#0A0000175C"));
    }
}
