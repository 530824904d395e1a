use ksm_model::{NUM_LASER_LANES, Pulse, TimingProvider};

use crate::play_option::PlayOption;

/// Number of judged buttons (BT-A..D, FX-L/R).
pub const NUM_BUTTONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Button {
    BtA = 0,
    BtB = 1,
    BtC = 2,
    BtD = 3,
    FxL = 4,
    FxR = 5,
}

impl Button {
    pub const BT: [Button; 4] = [Button::BtA, Button::BtB, Button::BtC, Button::BtD];
    pub const FX: [Button; 2] = [Button::FxL, Button::FxR];
}

/// State of one button in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonInput {
    /// Held this frame
    pub pressed: bool,
    /// Went down this frame
    pub down: bool,
    /// Went up this frame
    pub up: bool,
}

impl ButtonInput {
    pub fn from_transition(was_pressed: bool, is_pressed: bool) -> Self {
        Self {
            pressed: is_pressed,
            down: is_pressed && !was_pressed,
            up: !is_pressed && was_pressed,
        }
    }
}

/// Input sampled for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub buttons: [ButtonInput; NUM_BUTTONS],
    /// Cursor movement per laser lane since the previous frame, in cursor units
    pub laser_delta_cursor_x: [f64; NUM_LASER_LANES],
}

impl FrameInput {
    /// Build a frame from held-button snapshots of the previous and current frame.
    pub fn from_pressed(
        prev_pressed: &[bool; NUM_BUTTONS],
        pressed: &[bool; NUM_BUTTONS],
        laser_delta_cursor_x: [f64; NUM_LASER_LANES],
    ) -> Self {
        Self {
            buttons: std::array::from_fn(|i| {
                ButtonInput::from_transition(prev_pressed[i], pressed[i])
            }),
            laser_delta_cursor_x,
        }
    }

    pub fn button(&self, button: Button) -> ButtonInput {
        self.buttons[button as usize]
    }
}

/// Judgment clock of one frame.
///
/// Button and laser judgments run on their own delay-compensated clocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub current_time_sec: f64,
    pub current_pulse: Pulse,
    pub button_time_sec: f64,
    pub button_pulse: Pulse,
    pub laser_time_sec: f64,
    pub laser_pulse: Pulse,
}

impl FrameTime {
    pub fn new(timing: &impl TimingProvider, current_time_sec: f64, option: &PlayOption) -> Self {
        let button_time_sec = current_time_sec - option.input_delay_sec();
        let laser_time_sec = current_time_sec - option.laser_input_delay_sec();
        Self {
            current_time_sec,
            current_pulse: timing.sec_to_pulse(current_time_sec),
            button_time_sec,
            button_pulse: timing.sec_to_pulse(button_time_sec),
            laser_time_sec,
            laser_pulse: timing.sec_to_pulse(laser_time_sec),
        }
    }
}
