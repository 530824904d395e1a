//! Judgment of one BT or FX lane.
//!
//! Chips are judged on key-down against the nearest unjudged note. Long notes
//! are split into units that turn Critical while held; releasing mid-note
//! errors the next pending unit right away.

use std::collections::BTreeSet;

use ksm_model::{ByPulse, Interval, Pulse, RelPulse, TimingProvider};
use log::trace;

use crate::frame_input::ButtonInput;
use crate::game_status::ButtonLaneStatus;
use crate::judgment_result::{JudgmentEvent, JudgmentResult, KeyBeamType};
use crate::judgment_unit::{JudgmentUnit, advance_cursor, first_unit_of, split_hold};
use crate::play_option::JudgmentPlayMode;
use crate::timing_window::{chip_note, long_note};

/// Farthest a note can be ahead of a key-down and still be picked.
/// Covers the long-note pre-hold window too.
const KEY_DOWN_LOOKAHEAD_SEC: f64 = chip_note::WINDOW_SEC_ERROR;

#[derive(Debug, Clone, Copy)]
struct ButtonNote {
    pulse: Pulse,
    length: RelPulse,
    start_sec: f64,
    has_key_sound: bool,
    /// Chip result; long notes are judged through their units
    result: JudgmentResult,
}

impl ButtonNote {
    fn is_chip(&self) -> bool {
        self.length == 0
    }

    fn end_pulse(&self) -> Pulse {
        self.pulse + self.length
    }
}

#[derive(Debug, Clone)]
pub struct ButtonLaneJudgment {
    play_mode: JudgmentPlayMode,
    notes: Vec<ButtonNote>,
    long_units: Vec<JudgmentUnit>,
    /// First note that is neither judged nor passed
    note_cursor: usize,
    /// First long unit not yet passed
    unit_cursor: usize,
    /// Index into `notes` of the long note being held
    held_long_note: Option<usize>,
    /// First unjudged unit of the held long note
    held_unit_cursor: usize,
    judged_count: usize,
    is_locked_for_exit: bool,
}

impl ButtonLaneJudgment {
    /// # Arguments
    /// - `key_sound_pulses`: chips that play a key sound (FX lanes only; empty for BT)
    pub fn new(
        lane: &ByPulse<Interval>,
        key_sound_pulses: &BTreeSet<Pulse>,
        timing: &impl TimingProvider,
        play_mode: JudgmentPlayMode,
    ) -> Self {
        let mut notes = Vec::new();
        let mut long_units = Vec::new();
        if play_mode.has_judgment() {
            for (&pulse, interval) in lane {
                let length = interval.length.max(0);
                notes.push(ButtonNote {
                    pulse,
                    length,
                    start_sec: timing.pulse_to_sec(pulse),
                    has_key_sound: key_sound_pulses.contains(&pulse),
                    result: JudgmentResult::Unspecified,
                });
                if length > 0 {
                    long_units.extend(split_hold(pulse, length, timing.tempo_at(pulse)).into_iter().map(
                        |(y, len)| JudgmentUnit {
                            pulse: y,
                            length: len,
                            owner_pulse: pulse,
                            result: JudgmentResult::Unspecified,
                        },
                    ));
                }
            }
        }
        Self {
            play_mode,
            notes,
            long_units,
            note_cursor: 0,
            unit_cursor: 0,
            held_long_note: None,
            held_unit_cursor: 0,
            judged_count: 0,
            is_locked_for_exit: false,
        }
    }

    /// Process one frame.
    ///
    /// `current_pulse` and `current_time_sec` are the delay-compensated button clock.
    pub fn update(
        &mut self,
        input: ButtonInput,
        current_pulse: Pulse,
        current_time_sec: f64,
        status: &mut ButtonLaneStatus,
        events: &mut Vec<JudgmentEvent>,
    ) {
        if self.is_locked_for_exit {
            return;
        }

        if self.play_mode == JudgmentPlayMode::Auto {
            self.process_auto_play(current_pulse, current_time_sec, status, events);
            return;
        }

        status.is_key_pressed = input.pressed;
        if input.down {
            self.process_key_down(current_pulse, current_time_sec, status, events);
        }
        if input.pressed {
            self.process_key_pressed(current_pulse, events);
        } else {
            self.process_key_released(current_pulse, events);
        }
        self.process_passed(current_pulse, current_time_sec, events);

        status.current_long_note_pulse = self.held_long_note.map(|idx| self.notes[idx].pulse);
    }

    fn process_key_down(
        &mut self,
        current_pulse: Pulse,
        current_time_sec: f64,
        status: &mut ButtonLaneStatus,
        events: &mut Vec<JudgmentEvent>,
    ) {
        status.key_beam_time_sec = current_time_sec;
        status.key_beam_type = KeyBeamType::Default;

        // (index, distance)
        let mut nearest: Option<(usize, f64)> = None;
        for (idx, note) in self.notes.iter().enumerate().skip(self.note_cursor) {
            let ahead_sec = note.start_sec - current_time_sec;
            if ahead_sec > KEY_DOWN_LOOKAHEAD_SEC {
                break;
            }
            let distance = ahead_sec.abs();
            if ahead_sec >= 0.0 && nearest.is_some_and(|(_, d)| distance >= d) {
                // Later notes are only farther; ties keep the earlier note
                break;
            }

            let selectable = if note.is_chip() {
                !note.result.is_judged() && distance < chip_note::WINDOW_SEC_ERROR
            } else {
                ahead_sec <= long_note::WINDOW_SEC_PRE_HOLD && note.end_pulse() > current_pulse
            };
            if selectable && nearest.is_none_or(|(_, d)| distance < d) {
                nearest = Some((idx, distance));
            }
        }

        let Some((idx, _)) = nearest else {
            return;
        };
        if self.notes[idx].is_chip() {
            let result = self.judge_chip(idx, current_time_sec, events);
            status.key_beam_type = KeyBeamType::from_result(result);
        } else {
            let pulse = self.notes[idx].pulse;
            self.held_long_note = Some(idx);
            self.held_unit_cursor = first_unit_of(&self.long_units, pulse);
            status.key_beam_type = KeyBeamType::Critical;
        }
    }

    fn judge_chip(
        &mut self,
        idx: usize,
        current_time_sec: f64,
        events: &mut Vec<JudgmentEvent>,
    ) -> JudgmentResult {
        let note = &mut self.notes[idx];
        let diff_sec = current_time_sec - note.start_sec;
        let distance = diff_sec.abs();
        let result = if distance < chip_note::WINDOW_SEC_CRITICAL {
            JudgmentResult::Critical
        } else if distance < chip_note::WINDOW_SEC_NEAR {
            if diff_sec >= 0.0 {
                JudgmentResult::NearSlow
            } else if note.has_key_sound {
                // Early FX presses on key-sound chips are forgiven
                JudgmentResult::Critical
            } else {
                JudgmentResult::NearFast
            }
        } else {
            JudgmentResult::Error
        };
        note.result = result;
        trace!("chip at pulse {} judged {:?} ({:+.3}s)", note.pulse, result, diff_sec);
        self.judged_count += 1;
        events.push(JudgmentEvent::Chip {
            result,
            diff_sec: Some(diff_sec),
        });
        result
    }

    fn process_key_pressed(&mut self, current_pulse: Pulse, events: &mut Vec<JudgmentEvent>) {
        let Some(idx) = self.held_long_note else {
            return;
        };
        let note = self.notes[idx];
        if current_pulse >= note.end_pulse() {
            self.held_long_note = None;
        }

        let owner = note.pulse;
        for unit in self.long_units[self.held_unit_cursor..].iter_mut() {
            if unit.owner_pulse != owner || unit.pulse > current_pulse {
                break;
            }
            if !unit.result.is_judged() {
                unit.result = JudgmentResult::Critical;
                self.judged_count += 1;
                events.push(JudgmentEvent::Long {
                    result: JudgmentResult::Critical,
                });
            }
        }
        advance_cursor(&self.long_units, &mut self.held_unit_cursor, |u| {
            u.owner_pulse == owner && u.result.is_judged()
        });
    }

    fn process_key_released(&mut self, current_pulse: Pulse, events: &mut Vec<JudgmentEvent>) {
        let Some(idx) = self.held_long_note.take() else {
            return;
        };
        let note = self.notes[idx];
        if current_pulse >= note.end_pulse() {
            return;
        }

        let owner = note.pulse;
        let pending = self.long_units[self.held_unit_cursor..]
            .iter_mut()
            .take_while(|u| u.owner_pulse == owner)
            .find(|u| !u.result.is_judged());
        if let Some(unit) = pending {
            trace!("long note at pulse {} released early", owner);
            unit.result = JudgmentResult::Error;
            self.judged_count += 1;
            events.push(JudgmentEvent::Long {
                result: JudgmentResult::Error,
            });
        }
    }

    fn process_passed(
        &mut self,
        current_pulse: Pulse,
        current_time_sec: f64,
        events: &mut Vec<JudgmentEvent>,
    ) {
        while let Some(note) = self.notes.get(self.note_cursor).copied() {
            if note.is_chip() {
                if current_time_sec < note.start_sec + chip_note::WINDOW_SEC_ERROR {
                    break;
                }
                if !note.result.is_judged() {
                    self.notes[self.note_cursor].result = JudgmentResult::Error;
                    self.judged_count += 1;
                    events.push(JudgmentEvent::Chip {
                        result: JudgmentResult::Error,
                        diff_sec: None,
                    });
                }
            } else if current_pulse < note.end_pulse() {
                break;
            }
            self.note_cursor += 1;
        }

        while let Some(unit) = self.long_units.get_mut(self.unit_cursor) {
            if unit.end_pulse() >= current_pulse {
                break;
            }
            if !unit.result.is_judged() {
                unit.result = JudgmentResult::Error;
                self.judged_count += 1;
                events.push(JudgmentEvent::Long {
                    result: JudgmentResult::Error,
                });
            }
            self.unit_cursor += 1;
        }
    }

    fn process_auto_play(
        &mut self,
        current_pulse: Pulse,
        current_time_sec: f64,
        status: &mut ButtonLaneStatus,
        events: &mut Vec<JudgmentEvent>,
    ) {
        while let Some(note) = self.notes.get(self.note_cursor).copied() {
            if note.is_chip() {
                if current_time_sec < note.start_sec {
                    break;
                }
                if !note.result.is_judged() {
                    self.notes[self.note_cursor].result = JudgmentResult::Critical;
                    self.judged_count += 1;
                    events.push(JudgmentEvent::Chip {
                        result: JudgmentResult::Critical,
                        diff_sec: None,
                    });
                    status.key_beam_time_sec = current_time_sec;
                    status.key_beam_type = KeyBeamType::Critical;
                }
            } else if current_pulse < note.end_pulse() {
                break;
            }
            self.note_cursor += 1;
        }

        while let Some(unit) = self.long_units.get_mut(self.unit_cursor) {
            if unit.pulse > current_pulse {
                break;
            }
            if !unit.result.is_judged() {
                unit.result = JudgmentResult::Critical;
                self.judged_count += 1;
                events.push(JudgmentEvent::Long {
                    result: JudgmentResult::Critical,
                });
            }
            self.unit_cursor += 1;
        }

        status.current_long_note_pulse = self
            .notes
            .get(self.note_cursor)
            .filter(|n| !n.is_chip() && n.pulse <= current_pulse)
            .map(|n| n.pulse);
        status.is_key_pressed = status.current_long_note_pulse.is_some()
            || current_time_sec - status.key_beam_time_sec < chip_note::WINDOW_SEC_NEAR;
    }

    /// Judge every remaining unit as Error and stop judging. Idempotent.
    pub fn lock_for_exit(&mut self, events: &mut Vec<JudgmentEvent>) {
        if self.is_locked_for_exit {
            return;
        }
        self.is_locked_for_exit = true;
        self.held_long_note = None;

        for note in self.notes[self.note_cursor..].iter_mut() {
            if note.is_chip() && !note.result.is_judged() {
                note.result = JudgmentResult::Error;
                self.judged_count += 1;
                events.push(JudgmentEvent::Chip {
                    result: JudgmentResult::Error,
                    diff_sec: None,
                });
            }
        }
        for unit in self.long_units[self.unit_cursor..].iter_mut() {
            if !unit.result.is_judged() {
                unit.result = JudgmentResult::Error;
                self.judged_count += 1;
                events.push(JudgmentEvent::Long {
                    result: JudgmentResult::Error,
                });
            }
        }
    }

    pub fn chip_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_chip()).count()
    }

    pub fn long_unit_count(&self) -> usize {
        self.long_units.len()
    }

    pub fn total_unit_count(&self) -> usize {
        self.chip_count() + self.long_unit_count()
    }

    pub fn judged_unit_count(&self) -> usize {
        self.judged_count
    }

    pub fn is_holding_long_note(&self) -> bool {
        self.held_long_note.is_some()
    }

    /// Result of the chip at `pulse`, if there is one.
    pub fn chip_result(&self, pulse: Pulse) -> Option<JudgmentResult> {
        let idx = self.notes.partition_point(|n| n.pulse < pulse);
        self.notes
            .get(idx)
            .filter(|n| n.pulse == pulse && n.is_chip())
            .map(|n| n.result)
    }

    /// Overall result of the long note at `pulse`.
    ///
    /// Error if any unit errored, Critical once every unit is Critical,
    /// otherwise Unspecified.
    pub fn long_note_result(&self, pulse: Pulse) -> JudgmentResult {
        let mut units = self.long_units[first_unit_of(&self.long_units, pulse)..]
            .iter()
            .take_while(|u| u.owner_pulse == pulse)
            .peekable();
        if units.peek().is_none() {
            return JudgmentResult::Unspecified;
        }
        let mut is_all_critical = true;
        for unit in units {
            match unit.result {
                JudgmentResult::Error => return JudgmentResult::Error,
                JudgmentResult::Critical => {}
                _ => is_all_critical = false,
            }
        }
        if is_all_critical {
            JudgmentResult::Critical
        } else {
            JudgmentResult::Unspecified
        }
    }
}
