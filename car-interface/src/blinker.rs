//! Courtesy blinker timer
//!
//! Latches a blinker-on event and holds it for a fixed number of cycles, so the
//! reported overlay stays clean while the raw lamp signal flickers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkerTimerState {
    pub latched: bool,
    pub start_cycle: u64,
    pub active_left: bool,
    pub active_right: bool,
    /// Raw inputs seen last cycle, for edge detection
    pub prev_left: bool,
    pub prev_right: bool,
}

pub struct CourtesyBlinker {
    hold_cycles: u64,
    state: BlinkerTimerState,
}

impl CourtesyBlinker {
    pub fn new(hold_cycles: u64) -> Self {
        Self {
            hold_cycles,
            state: BlinkerTimerState::default(),
        }
    }

    pub fn state(&self) -> &BlinkerTimerState {
        &self.state
    }

    /// Feed this cycle's raw blinker inputs, returning the effective (left, right)
    pub fn update(&mut self, left_on: bool, right_on: bool, cycle: u64) -> (bool, bool) {
        let state = &mut self.state;
        let rising_left = left_on && !state.prev_left;
        let rising_right = right_on && !state.prev_right;
        state.prev_left = left_on;
        state.prev_right = right_on;

        if state.latched && cycle.saturating_sub(state.start_cycle) >= self.hold_cycles {
            log::debug!("Courtesy blinker released at cycle {}", cycle);
            state.latched = false;
            state.active_left = false;
            state.active_right = false;
        }

        if !state.latched && (rising_left || rising_right) {
            state.latched = true;
            state.start_cycle = cycle;
            state.active_left = left_on;
            state.active_right = right_on;
            log::debug!(
                "Courtesy blinker latched at cycle {} (left: {}, right: {})",
                cycle,
                left_on,
                right_on
            );
        }

        (state.active_left, state.active_right)
    }
}
