//! Cycle driver
//!
//! Slices a recorded frame stream into control cycles by receive time and
//! steps the interface once per slice. Without a log the interface is stepped
//! on silence to show what it schedules.

use anyhow::Result;
use car_interface::config::DT_CTRL;
use car_interface::{
    ActuationRequest, CanFrame, CarInterface, CycleOutput, Timestamp, VehicleState, VisualAlert,
};
use chrono::Duration;

/// Counters collected over a run
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    pub cycles: u64,
    pub frames_in: usize,
    pub frames_out: usize,
    pub first_frame: Option<Timestamp>,
    pub last_frame: Option<Timestamp>,
}

impl ReplayStats {
    /// Time between the first and the last replayed frame
    pub fn span(&self) -> Option<Duration> {
        Some(self.last_frame? - self.first_frame?)
    }
}

pub struct Replay<'a> {
    car: &'a mut CarInterface,
    request: ActuationRequest,
    alert: VisualAlert,
    stats: ReplayStats,
}

impl<'a> Replay<'a> {
    pub fn new(car: &'a mut CarInterface, request: ActuationRequest, alert: VisualAlert) -> Self {
        Self {
            car,
            request,
            alert,
            stats: ReplayStats::default(),
        }
    }

    /// Cycle length in nanoseconds
    pub fn period_ns() -> u64 {
        (DT_CTRL * 1e9).round() as u64
    }

    /// Replay frames in receive order
    ///
    /// A frame belongs to the cycle its timestamp falls in, counted from the
    /// first frame. Gaps in the log produce silent cycles.
    pub fn run_log<F>(mut self, frames: &[CanFrame], mut on_cycle: F) -> Result<ReplayStats>
    where
        F: FnMut(&CycleOutput, &VehicleState) -> Result<()>,
    {
        let Some(first) = frames.first() else {
            log::warn!("Log contains no frames");
            return Ok(self.stats);
        };
        let period = Self::period_ns();
        let mut cycle_end = first.timestamp_ns + period;
        self.stats.first_frame = Some(first.timestamp());

        for frame in frames {
            while frame.timestamp_ns >= cycle_end {
                self.step(&mut on_cycle)?;
                cycle_end += period;
            }
            self.car.ingest(frame);
            self.stats.frames_in += 1;
        }
        // Close the cycle holding the last frames
        self.step(&mut on_cycle)?;

        self.stats.last_frame = frames.last().map(CanFrame::timestamp);
        Ok(self.stats)
    }

    /// Step `cycles` times without any inbound traffic
    pub fn run_silent<F>(mut self, cycles: u64, mut on_cycle: F) -> Result<ReplayStats>
    where
        F: FnMut(&CycleOutput, &VehicleState) -> Result<()>,
    {
        for _ in 0..cycles {
            self.step(&mut on_cycle)?;
        }
        Ok(self.stats)
    }

    fn step<F>(&mut self, on_cycle: &mut F) -> Result<()>
    where
        F: FnMut(&CycleOutput, &VehicleState) -> Result<()>,
    {
        let output = self.car.step(&self.request, self.alert);
        self.stats.cycles += 1;
        self.stats.frames_out += output.frames.len();
        on_cycle(&output, self.car.state())
    }
}
