use std::f64::consts::PI;

use crate::game_status::PAST_TIME_SEC;

pub const SHAKE_DURATION_SEC: f64 = 0.15;

/// Peak lane shift of a slam shake.
pub const SHAKE_MAX_SHIFT_X: f64 = 17.0 * 50.0 / 150.0 / 2.0;

/// Lane shake played after a Critical slam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserSlamShake {
    start_time_sec: f64,
    direction: i32,
}

impl Default for LaserSlamShake {
    fn default() -> Self {
        Self {
            start_time_sec: PAST_TIME_SEC,
            direction: 0,
        }
    }
}

impl LaserSlamShake {
    /// Start a shake. `start_time_sec` is the frame before the slam was judged.
    pub fn trigger(&mut self, start_time_sec: f64, direction: i32) {
        self.start_time_sec = start_time_sec;
        self.direction = direction;
    }

    pub fn shift_x(&self, current_time_sec: f64) -> f64 {
        let elapsed = current_time_sec - self.start_time_sec;
        if !(0.0..SHAKE_DURATION_SEC).contains(&elapsed) {
            return 0.0;
        }
        let rate = elapsed / SHAKE_DURATION_SEC;
        let decay = (1.0 - rate) * (1.0 - rate);
        (PI * rate).sin() * decay * f64::from(self.direction) * SHAKE_MAX_SHIFT_X
    }
}
