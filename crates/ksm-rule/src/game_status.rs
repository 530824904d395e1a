use ksm_model::{NUM_BT_LANES, NUM_FX_LANES, NUM_LASER_LANES, Pulse};

use crate::judgment_result::KeyBeamType;

/// Sentinel for "never happened" timestamps.
pub const PAST_TIME_SEC: f64 = -100_000.0;

/// Per-frame state of a BT/FX lane, written by its judgment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonLaneStatus {
    pub is_key_pressed: bool,
    /// Start pulse of the long note being held
    pub current_long_note_pulse: Option<Pulse>,
    pub key_beam_time_sec: f64,
    pub key_beam_type: KeyBeamType,
}

impl Default for ButtonLaneStatus {
    fn default() -> Self {
        Self {
            is_key_pressed: false,
            current_long_note_pulse: None,
            key_beam_time_sec: PAST_TIME_SEC,
            key_beam_type: KeyBeamType::Default,
        }
    }
}

/// Per-frame state of a laser lane, written by its judgment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserLaneStatus {
    /// Judged cursor position, `None` while no section is active
    pub cursor_x: Option<f64>,
    /// Ideal position on the line
    pub note_cursor_x: Option<f64>,
    pub is_cursor_in_critical_range: bool,
    pub is_wide: bool,
    /// Start pulse of the section under the judgment line
    pub current_section_pulse: Option<Pulse>,
    pub last_judged_slam_pulse: Option<Pulse>,
    pub last_slam_judged_time_sec: f64,
    /// The drawn cursor sticks to the line until this time
    pub settle_until_sec: f64,
}

impl Default for LaserLaneStatus {
    fn default() -> Self {
        Self {
            cursor_x: None,
            note_cursor_x: None,
            is_cursor_in_critical_range: false,
            is_wide: false,
            current_section_pulse: None,
            last_judged_slam_pulse: None,
            last_slam_judged_time_sec: PAST_TIME_SEC,
            settle_until_sec: PAST_TIME_SEC,
        }
    }
}

impl LaserLaneStatus {
    /// Cursor position to draw.
    ///
    /// Follows the line while settling; judgment only ever reads `cursor_x`.
    pub fn cursor_x_for_draw(&self, current_time_sec: f64) -> Option<f64> {
        match self.note_cursor_x {
            Some(note_x) if current_time_sec < self.settle_until_sec => Some(note_x),
            _ => self.cursor_x,
        }
    }
}

/// Lane states shared between judgment and drawing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameStatus {
    pub bt_lanes: [ButtonLaneStatus; NUM_BT_LANES],
    pub fx_lanes: [ButtonLaneStatus; NUM_FX_LANES],
    pub laser_lanes: [LaserLaneStatus; NUM_LASER_LANES],
}
