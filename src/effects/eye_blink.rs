use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::model::Model;
use crate::utils::interner::ParameterId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeState {
    /// Not updated yet.
    First,
    Interval,
    Closing,
    Closed,
    Opening,
}

/// Automatic blinking.
///
/// Cycles `Interval → Closing → Closed → Opening → Interval`. The eye value
/// is `1` while open, ramps `1 - t` while closing, holds `0` while closed and
/// ramps `t` while opening. The wait before the next blink is drawn uniformly
/// from `[0, 2 * interval)`, not the `[0, 2 * interval - 1)` of the stock
/// Cubism runtime, so the mean gap is the configured interval and intervals
/// under half a second still blink.
#[derive(Debug)]
pub struct EyeBlink {
    state: EyeState,
    parameter_ids: Vec<ParameterId>,
    next_blinking_time: f32,
    state_start_time: f32,
    interval_seconds: f32,
    closing_seconds: f32,
    closed_seconds: f32,
    opening_seconds: f32,
    user_time: f32,
    close_if_zero: bool,
    rng: StdRng,
}

impl EyeBlink {
    #[must_use]
    pub fn new(parameter_ids: Vec<ParameterId>, seed: u64) -> Self {
        Self {
            state: EyeState::First,
            parameter_ids,
            next_blinking_time: 0.0,
            state_start_time: 0.0,
            interval_seconds: 4.0,
            closing_seconds: 0.1,
            closed_seconds: 0.05,
            opening_seconds: 0.15,
            user_time: 0.0,
            close_if_zero: true,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn state(&self) -> EyeState {
        self.state
    }

    #[must_use]
    pub fn parameter_ids(&self) -> &[ParameterId] {
        &self.parameter_ids
    }

    pub fn set_parameter_ids(&mut self, ids: Vec<ParameterId>) {
        self.parameter_ids = ids;
    }

    pub fn set_blinking_interval(&mut self, seconds: f32) {
        self.interval_seconds = seconds;
    }

    pub fn set_blinking_settings(&mut self, closing: f32, closed: f32, opening: f32) {
        self.closing_seconds = closing;
        self.closed_seconds = closed;
        self.opening_seconds = opening;
    }

    /// With `false` the written value is `1 - v`: the eye is closed at 1.
    pub fn set_close_if_zero(&mut self, close_if_zero: bool) {
        self.close_if_zero = close_if_zero;
    }

    /// Time at which the next blink starts.
    #[must_use]
    pub fn next_blinking_time(&self) -> f32 {
        self.next_blinking_time
    }

    /// Starts closing on the next update regardless of the interval.
    pub fn blink_now(&mut self) {
        self.state = EyeState::Interval;
        self.next_blinking_time = f32::NEG_INFINITY;
    }

    fn determine_next_blinking_timing(&mut self) -> f32 {
        let span = 2.0 * self.interval_seconds;
        if span <= 0.0 {
            return self.user_time;
        }
        self.user_time + self.rng.random_range(0.0..span)
    }

    pub fn update_parameters(&mut self, model: &mut Model, delta_seconds: f32) {
        self.user_time += delta_seconds;
        let elapsed = self.user_time - self.state_start_time;

        let value = match self.state {
            EyeState::Closing => {
                let mut t = phase_progress(elapsed, self.closing_seconds);
                if t >= 1.0 {
                    t = 1.0;
                    self.enter(EyeState::Closed);
                }
                1.0 - t
            }
            EyeState::Closed => {
                if phase_progress(elapsed, self.closed_seconds) >= 1.0 {
                    self.enter(EyeState::Opening);
                }
                0.0
            }
            EyeState::Opening => {
                let mut t = phase_progress(elapsed, self.opening_seconds);
                if t >= 1.0 {
                    t = 1.0;
                    self.state = EyeState::Interval;
                    self.next_blinking_time = self.determine_next_blinking_timing();
                }
                t
            }
            EyeState::Interval => {
                if self.next_blinking_time < self.user_time {
                    self.enter(EyeState::Closing);
                }
                1.0
            }
            EyeState::First => {
                self.state = EyeState::Interval;
                self.next_blinking_time = self.determine_next_blinking_timing();
                1.0
            }
        };

        let value = if self.close_if_zero { value } else { 1.0 - value };
        for id in &self.parameter_ids {
            model.set_parameter_value_by_id(*id, value, 1.0);
        }
    }

    fn enter(&mut self, state: EyeState) {
        self.state = state;
        self.state_start_time = self.user_time;
    }
}

fn phase_progress(elapsed: f32, seconds: f32) -> f32 {
    if seconds <= 0.0 { 1.0 } else { elapsed / seconds }
}
