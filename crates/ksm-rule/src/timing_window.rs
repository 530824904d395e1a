//! Judgment windows and laser tolerances.
//!
//! Windows are half-widths in seconds and compared with `<`.

pub mod chip_note {
    pub const WINDOW_SEC_CRITICAL: f64 = 0.048;
    pub const WINDOW_SEC_NEAR: f64 = 0.1;
    pub const WINDOW_SEC_ERROR: f64 = 0.15;
}

pub mod long_note {
    /// A press this early before a long note's start already starts holding it.
    pub const WINDOW_SEC_PRE_HOLD: f64 = 0.1;
}

pub mod laser_note {
    /// Half-width of the slam window around the slam's time.
    pub const WINDOW_SEC_SLAM: f64 = 0.1;

    /// Maximum cursor distance from the ideal position still judged Critical.
    pub const CURSOR_CRITICAL_RANGE: f64 = 0.1;

    /// Cursor motion in the slam direction needed for a Critical slam.
    pub const SLAM_CRITICAL_DELTA_CURSOR_X: f64 = 0.1;

    /// Motion older than this is dropped from the input accumulator.
    pub const ACCUMULATION_GAP_SEC: f64 = 0.1;

    /// The cursor stays locked on the line for this long after a correct movement.
    pub const CORRECT_MOVEMENT_KEEP_SEC: f64 = 0.06;

    /// Duration the drawn cursor settles onto the line after a slam or direction change.
    pub const AUTO_SETTLE_SEC: f64 = 0.1;
}

/// Long note and laser units are halved from this tempo on.
pub const HALVE_COMBO_BPM_THRESHOLD: f64 = 256.0;
