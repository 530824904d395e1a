use ksm_model::Pulse;

use crate::game_status::PAST_TIME_SEC;
use crate::judgment_result::JudgmentResult;
use crate::timing_window::laser_note;

/// Cursor motion collected just before a slam window opens.
///
/// A flick that starts slightly early still counts toward the slam, as long
/// as the motion is continuous up to the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserInputAccumulator {
    accumulated_delta_cursor_x: f64,
    last_input_time_sec: f64,
}

impl Default for LaserInputAccumulator {
    fn default() -> Self {
        Self {
            accumulated_delta_cursor_x: 0.0,
            last_input_time_sec: PAST_TIME_SEC,
        }
    }
}

impl LaserInputAccumulator {
    pub fn add_delta_cursor_x(&mut self, delta_cursor_x: f64, current_time_sec: f64) {
        if delta_cursor_x == 0.0 {
            return;
        }
        if !self.should_apply_amplification(current_time_sec) {
            // A gap breaks the motion
            self.accumulated_delta_cursor_x = 0.0;
        }
        self.accumulated_delta_cursor_x += delta_cursor_x;
        self.last_input_time_sec = current_time_sec;
    }

    /// Whether the accumulated motion is still live.
    pub fn should_apply_amplification(&self, current_time_sec: f64) -> bool {
        current_time_sec - self.last_input_time_sec <= laser_note::ACCUMULATION_GAP_SEC
    }

    pub fn accumulated_delta_cursor_x(&self) -> f64 {
        self.accumulated_delta_cursor_x
    }

    pub fn reset_accumulation(&mut self) {
        self.accumulated_delta_cursor_x = 0.0;
    }
}

/// Judgment state of one slam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserSlamJudgment {
    pulse: Pulse,
    sec: f64,
    direction: i32,
    /// Cursor position after the slam
    destination_x: f64,
    /// Net travel in the slam's direction so far
    total_delta_cursor_x: f64,
    is_window_opened: bool,
    result: JudgmentResult,
}

impl LaserSlamJudgment {
    pub fn new(pulse: Pulse, sec: f64, direction: i32, destination_x: f64) -> Self {
        Self {
            pulse,
            sec,
            direction,
            destination_x,
            total_delta_cursor_x: 0.0,
            is_window_opened: false,
            result: JudgmentResult::Unspecified,
        }
    }

    pub fn pulse(&self) -> Pulse {
        self.pulse
    }

    pub fn sec(&self) -> f64 {
        self.sec
    }

    pub fn direction(&self) -> i32 {
        self.direction
    }

    pub fn destination_x(&self) -> f64 {
        self.destination_x
    }

    pub fn result(&self) -> JudgmentResult {
        self.result
    }

    pub fn is_in_window(&self, current_time_sec: f64) -> bool {
        (current_time_sec - self.sec).abs() <= laser_note::WINDOW_SEC_SLAM
    }

    pub fn is_window_elapsed(&self, current_time_sec: f64) -> bool {
        current_time_sec > self.sec + laser_note::WINDOW_SEC_SLAM
    }

    /// Feed one frame of motion inside the window.
    ///
    /// On the first frame the live accumulated motion is credited instead,
    /// and the accumulator is drained so no later slam sees it again.
    pub fn feed(
        &mut self,
        delta_cursor_x: f64,
        accumulator: &mut LaserInputAccumulator,
        current_time_sec: f64,
    ) {
        let credited = if self.is_window_opened {
            delta_cursor_x
        } else {
            self.is_window_opened = true;
            accumulator.add_delta_cursor_x(delta_cursor_x, current_time_sec);
            if accumulator.should_apply_amplification(current_time_sec) {
                accumulator.accumulated_delta_cursor_x()
            } else {
                delta_cursor_x
            }
        };
        accumulator.reset_accumulation();
        self.add_delta_cursor_x(credited);
    }

    /// Motion against the slam's direction takes back travel.
    pub fn add_delta_cursor_x(&mut self, delta_cursor_x: f64) {
        self.total_delta_cursor_x += delta_cursor_x * f64::from(self.direction);
    }

    pub fn is_critical_satisfied(&self) -> bool {
        self.total_delta_cursor_x >= laser_note::SLAM_CRITICAL_DELTA_CURSOR_X
    }

    pub fn set_result(&mut self, result: JudgmentResult) {
        self.result = result;
    }
}
