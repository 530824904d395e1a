use ksm_model::Pulse;
use serde::{Deserialize, Serialize};

/// Outcome of one judgment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum JudgmentResult {
    /// Not judged yet
    #[default]
    Unspecified = 0,
    Critical = 1,
    NearFast = 2,
    NearSlow = 3,
    Error = 4,
}

impl JudgmentResult {
    pub fn is_judged(self) -> bool {
        self != Self::Unspecified
    }

    pub fn is_near(self) -> bool {
        matches!(self, Self::NearFast | Self::NearSlow)
    }

    /// Critical or Near; keeps the combo going.
    pub fn continues_combo(self) -> bool {
        matches!(self, Self::Critical | Self::NearFast | Self::NearSlow)
    }
}

/// A judgment reported by a lane.
///
/// Lanes push these into a per-frame buffer; the handler folds them into the
/// scoring state with a single match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JudgmentEvent {
    /// A BT/FX chip was judged.
    Chip {
        result: JudgmentResult,
        /// Input time minus note time (FAST < 0). `None` for judgments without a key press.
        diff_sec: Option<f64>,
    },
    /// One unit of a long note was judged.
    Long { result: JudgmentResult },
    /// One unit of a laser line was judged.
    Line { result: JudgmentResult },
    /// A laser slam was judged.
    Slam {
        result: JudgmentResult,
        pulse: Pulse,
        /// Time and pulse of the previous frame
        prev_time_sec: f64,
        prev_pulse: Pulse,
        /// -1 (left) or 1 (right)
        direction: i32,
    },
}

impl JudgmentEvent {
    pub fn result(&self) -> JudgmentResult {
        match *self {
            Self::Chip { result, .. }
            | Self::Long { result }
            | Self::Line { result }
            | Self::Slam { result, .. } => result,
        }
    }
}

/// Key beam shown on a button lane after a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyBeamType {
    #[default]
    Default,
    Critical,
    Near,
    Error,
}

impl KeyBeamType {
    pub fn from_result(result: JudgmentResult) -> Self {
        match result {
            JudgmentResult::Critical => Self::Critical,
            JudgmentResult::NearFast | JudgmentResult::NearSlow => Self::Near,
            JudgmentResult::Error => Self::Error,
            JudgmentResult::Unspecified => Self::Default,
        }
    }
}
