//! Judgment units of held notes and the cursor helpers lanes share.
//!
//! Long notes and laser sections are judged as a run of short units rather
//! than as one block, so a hold scores combo as it goes.

use ksm_model::{Pulse, RESOLUTION4, RelPulse};

use crate::judgment_result::JudgmentResult;
use crate::timing_window::HALVE_COMBO_BPM_THRESHOLD;

/// One judged slice `[pulse, pulse + length)` of a hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgmentUnit {
    pub pulse: Pulse,
    pub length: RelPulse,
    /// Start pulse of the owning long note or laser section
    pub owner_pulse: Pulse,
    pub result: JudgmentResult,
}

impl JudgmentUnit {
    pub fn end_pulse(&self) -> Pulse {
        self.pulse + self.length
    }
}

/// Split a hold starting at `y` into units.
///
/// `tempo` is the BPM at `y`; fast tempos halve the unit density.
pub fn split_hold(y: Pulse, length: RelPulse, tempo: f64) -> Vec<(Pulse, RelPulse)> {
    let halves = tempo >= HALVE_COMBO_BPM_THRESHOLD;
    let interval = if halves { RESOLUTION4 / 8 } else { RESOLUTION4 / 16 };
    let min_interval = if halves { RESOLUTION4 * 3 / 8 } else { RESOLUTION4 * 3 / 16 };

    if length < interval * 2 {
        return vec![(y, length)];
    }
    if length <= min_interval {
        return vec![(y + interval, interval)];
    }

    let start = ((y + interval - 1) / interval + 1) * interval;
    let hold_end = y + length;
    let end = hold_end - interval;
    let mut units = Vec::new();
    let mut pulse = start;
    while pulse < end {
        // The last unit absorbs the remainder up to the end of the hold
        let unit_length = if pulse <= end - interval { interval } else { hold_end - pulse };
        units.push((pulse, unit_length));
        pulse += interval;
    }
    units
}

/// Advance `cursor` past every leading item matching `passed`.
pub fn advance_cursor<T>(items: &[T], cursor: &mut usize, passed: impl Fn(&T) -> bool) {
    while *cursor < items.len() && passed(&items[*cursor]) {
        *cursor += 1;
    }
}

/// Index of the first unit owned by the hold starting at `owner_pulse`.
pub fn first_unit_of(units: &[JudgmentUnit], owner_pulse: Pulse) -> usize {
    units.partition_point(|u| u.owner_pulse < owner_pulse)
}
