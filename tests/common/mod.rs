//! Shared fakes for the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use mlx90381::{FlexLine, LineRole, Pull};

/// Bus line fake: records every role change and level write, plays back a
/// scripted sequence of sampled levels and settles on `idle_level` once the
/// script is exhausted.
pub struct ScriptedLine {
    pub roles: Vec<(LineRole, Pull)>,
    pub writes: Vec<PinState>,
    pub reads: VecDeque<PinState>,
    pub read_count: usize,
    pub idle_level: PinState,
}

impl ScriptedLine {
    pub fn new(reads: impl IntoIterator<Item = PinState>, idle_level: PinState) -> Self {
        Self {
            roles: Vec::new(),
            writes: Vec::new(),
            reads: reads.into_iter().collect(),
            read_count: 0,
            idle_level,
        }
    }

    /// Quiet line for tests that never touch the wake-up path.
    pub fn idle() -> Self {
        Self::new([], PinState::High)
    }

    pub fn current_role(&self) -> Option<(LineRole, Pull)> {
        self.roles.last().copied()
    }
}

impl FlexLine for ScriptedLine {
    fn set_role(&mut self, role: LineRole, pull: Pull) {
        self.roles.push((role, pull));
    }

    fn write_level(&mut self, level: PinState) {
        self.writes.push(level);
    }

    fn read_level(&mut self) -> PinState {
        self.read_count += 1;
        self.reads.pop_front().unwrap_or(self.idle_level)
    }
}

/// Delay fake recording every requested wait in nanoseconds.
pub struct RecordingDelay {
    pub waits_ns: Vec<u64>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self {
            waits_ns: Vec::new(),
        }
    }

    pub fn total_ns(&self) -> u64 {
        self.waits_ns.iter().sum()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.push(u64::from(ns));
    }
}
