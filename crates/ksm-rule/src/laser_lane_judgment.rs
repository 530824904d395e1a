//! Judgment of one laser lane.
//!
//! Line sections are split into units that stay Critical as long as the
//! cursor tracks the line; any sampled frame outside the critical range
//! errors the unit. Slams are judged separately from cursor motion in their
//! direction, with motion just before the window credited via the
//! [`LaserInputAccumulator`].

use ksm_model::{ByPulse, LaserSection, Pulse, TimingProvider};
use log::trace;

use crate::game_status::{LaserLaneStatus, PAST_TIME_SEC};
use crate::judgment_result::{JudgmentEvent, JudgmentResult};
use crate::judgment_unit::{JudgmentUnit, advance_cursor, split_hold};
use crate::laser_slam_judgment::{LaserInputAccumulator, LaserSlamJudgment};
use crate::play_option::JudgmentPlayMode;
use crate::timing_window::laser_note;

#[derive(Debug, Clone)]
struct SectionEntry {
    pulse: Pulse,
    section: LaserSection,
}

impl SectionEntry {
    fn end_pulse(&self) -> Pulse {
        self.pulse + self.section.length()
    }

    fn contains(&self, pulse: Pulse) -> bool {
        self.pulse <= pulse && pulse <= self.end_pulse()
    }
}

#[derive(Debug, Clone)]
pub struct LaserLaneJudgment {
    play_mode: JudgmentPlayMode,
    sections: Vec<SectionEntry>,
    line_units: Vec<JudgmentUnit>,
    slams: Vec<LaserSlamJudgment>,
    /// Times the line turns around, for the drawn cursor
    direction_change_secs: Vec<f64>,
    section_cursor: usize,
    /// First line unit not yet passed
    line_cursor: usize,
    /// First slam whose window has not elapsed
    slam_cursor: usize,
    direction_change_cursor: usize,
    /// Section the cursor is attached to
    active_section: Option<usize>,
    accumulator: LaserInputAccumulator,
    last_correct_movement_sec: f64,
    prev_pulse: Pulse,
    prev_time_sec: f64,
    judged_count: usize,
    is_locked_for_exit: bool,
}

impl LaserLaneJudgment {
    pub fn new(
        lane: &ByPulse<LaserSection>,
        timing: &impl TimingProvider,
        play_mode: JudgmentPlayMode,
    ) -> Self {
        let mut sections = Vec::new();
        let mut line_units = Vec::new();
        let mut slams = Vec::new();
        let mut direction_change_secs = Vec::new();
        if play_mode.has_judgment() {
            for (&y, section) in lane {
                let length = section.length();
                if length > 0 {
                    line_units.extend(split_hold(y, length, timing.tempo_at(y)).into_iter().map(
                        |(pulse, len)| JudgmentUnit {
                            pulse,
                            length: len,
                            owner_pulse: y,
                            result: JudgmentResult::Unspecified,
                        },
                    ));
                }
                for (ry, point) in section.slams() {
                    let pulse = y + ry;
                    slams.push(LaserSlamJudgment::new(
                        pulse,
                        timing.pulse_to_sec(pulse),
                        point.slam_direction(),
                        point.vf,
                    ));
                }
                direction_change_secs.extend(
                    section
                        .direction_changes()
                        .into_iter()
                        .map(|ry| timing.pulse_to_sec(y + ry)),
                );
                sections.push(SectionEntry {
                    pulse: y,
                    section: section.clone(),
                });
            }
        }
        Self {
            play_mode,
            sections,
            line_units,
            slams,
            direction_change_secs,
            section_cursor: 0,
            line_cursor: 0,
            slam_cursor: 0,
            direction_change_cursor: 0,
            active_section: None,
            accumulator: LaserInputAccumulator::default(),
            last_correct_movement_sec: PAST_TIME_SEC,
            prev_pulse: Pulse::MIN,
            prev_time_sec: PAST_TIME_SEC,
            judged_count: 0,
            is_locked_for_exit: false,
        }
    }

    /// Process one frame.
    ///
    /// `current_pulse` and `current_time_sec` are the delay-compensated laser clock.
    pub fn update(
        &mut self,
        delta_cursor_x: f64,
        current_pulse: Pulse,
        current_time_sec: f64,
        status: &mut LaserLaneStatus,
        events: &mut Vec<JudgmentEvent>,
    ) {
        if self.is_locked_for_exit {
            return;
        }
        let is_auto = self.play_mode == JudgmentPlayMode::Auto;

        let note_x = self.update_section(current_pulse, status);
        if is_auto {
            status.cursor_x = note_x;
        } else {
            if let Some(x) = status.cursor_x {
                status.cursor_x = Some((x + delta_cursor_x).clamp(0.0, 1.0));
            }
            self.process_slam_input(delta_cursor_x, current_time_sec, status, events);
            self.process_cursor_lock(delta_cursor_x, current_pulse, current_time_sec, note_x, status);
        }

        let in_range = match (status.cursor_x, note_x) {
            (Some(x), Some(nx)) => (x - nx).abs() <= laser_note::CURSOR_CRITICAL_RANGE,
            _ => false,
        };
        status.note_cursor_x = note_x;
        status.is_cursor_in_critical_range = in_range;

        if !is_auto && note_x.is_some() && !self.is_in_slam_grace(current_time_sec) {
            self.sample_line(in_range, current_pulse);
        }
        self.process_passed(is_auto, current_pulse, current_time_sec, status, events);
        self.process_direction_changes(current_time_sec, status);

        self.prev_pulse = current_pulse;
        self.prev_time_sec = current_time_sec;
    }

    /// Track the section under the judgment line; returns the ideal cursor position.
    fn update_section(&mut self, current_pulse: Pulse, status: &mut LaserLaneStatus) -> Option<f64> {
        advance_cursor(&self.sections, &mut self.section_cursor, |s| {
            s.end_pulse() < current_pulse
        });
        let current = Some(self.section_cursor)
            .filter(|&idx| self.sections.get(idx).is_some_and(|s| s.contains(current_pulse)));
        let note_x = current.and_then(|idx| {
            let entry = &self.sections[idx];
            entry.section.value_at(current_pulse - entry.pulse)
        });

        if current != self.active_section {
            // The cursor appears on the line when a section starts
            self.active_section = current;
            status.cursor_x = note_x;
        }
        status.current_section_pulse = current.map(|idx| self.sections[idx].pulse);
        status.is_wide = current.is_some_and(|idx| self.sections[idx].section.wide);
        note_x
    }

    fn process_slam_input(
        &mut self,
        delta_cursor_x: f64,
        current_time_sec: f64,
        status: &mut LaserLaneStatus,
        events: &mut Vec<JudgmentEvent>,
    ) {
        let target = (self.slam_cursor..self.slams.len())
            .take_while(|&idx| self.slams[idx].sec() - laser_note::WINDOW_SEC_SLAM <= current_time_sec)
            .find(|&idx| {
                let slam = &self.slams[idx];
                !slam.result().is_judged() && slam.is_in_window(current_time_sec)
            });
        let Some(idx) = target else {
            self.accumulator.add_delta_cursor_x(delta_cursor_x, current_time_sec);
            return;
        };

        let slam = &mut self.slams[idx];
        slam.feed(delta_cursor_x, &mut self.accumulator, current_time_sec);
        if slam.is_critical_satisfied() {
            let slam = *slam;
            self.judge_slam(idx, JudgmentResult::Critical, current_time_sec, status, events);
            status.cursor_x = Some(slam.destination_x());
        }
    }

    fn process_cursor_lock(
        &mut self,
        delta_cursor_x: f64,
        current_pulse: Pulse,
        current_time_sec: f64,
        note_x: Option<f64>,
        status: &mut LaserLaneStatus,
    ) {
        let (Some(x), Some(nx), Some(idx)) = (status.cursor_x, note_x, self.active_section) else {
            return;
        };
        let entry = &self.sections[idx];
        let direction = entry.section.direction_at(current_pulse - entry.pulse);
        let is_correct_movement = if direction == 0 {
            delta_cursor_x == 0.0
        } else {
            delta_cursor_x * f64::from(direction) > 0.0
        };
        if is_correct_movement {
            self.last_correct_movement_sec = current_time_sec;
        }

        let is_kept = delta_cursor_x == 0.0
            && current_time_sec - self.last_correct_movement_sec <= laser_note::CORRECT_MOVEMENT_KEEP_SEC;
        if (x - nx).abs() <= laser_note::CURSOR_CRITICAL_RANGE && (is_correct_movement || is_kept) {
            status.cursor_x = Some(nx);
        }
    }

    /// Slams jump the line; tolerance is not checked around them.
    fn is_in_slam_grace(&self, current_time_sec: f64) -> bool {
        self.slams[self.slam_cursor..]
            .iter()
            .take_while(|s| s.sec() - laser_note::WINDOW_SEC_SLAM <= current_time_sec)
            .any(|s| s.is_in_window(current_time_sec))
    }

    /// Error every unit overlapping `(prev_pulse, current_pulse]` if the cursor is off the line.
    fn sample_line(&mut self, in_range: bool, current_pulse: Pulse) {
        if in_range {
            return;
        }
        for unit in self.line_units[self.line_cursor..].iter_mut() {
            if unit.pulse > current_pulse {
                break;
            }
            if unit.result.is_judged() || unit.end_pulse() <= self.prev_pulse {
                continue;
            }
            trace!("laser unit at pulse {} lost the cursor", unit.pulse);
            unit.result = JudgmentResult::Error;
        }
    }

    fn process_passed(
        &mut self,
        is_auto: bool,
        current_pulse: Pulse,
        current_time_sec: f64,
        status: &mut LaserLaneStatus,
        events: &mut Vec<JudgmentEvent>,
    ) {
        while let Some(unit) = self.line_units.get_mut(self.line_cursor) {
            if unit.end_pulse() > current_pulse {
                break;
            }
            if !unit.result.is_judged() {
                unit.result = JudgmentResult::Critical;
            }
            // Errors are reported once the unit has passed so each unit yields one event
            let result = unit.result;
            self.judged_count += 1;
            events.push(JudgmentEvent::Line { result });
            self.line_cursor += 1;
        }

        while let Some(slam) = self.slams.get(self.slam_cursor).copied() {
            if is_auto {
                if current_time_sec < slam.sec() {
                    break;
                }
                if !slam.result().is_judged() {
                    self.judge_slam(
                        self.slam_cursor,
                        JudgmentResult::Critical,
                        current_time_sec,
                        status,
                        events,
                    );
                }
            } else {
                if !slam.is_window_elapsed(current_time_sec) {
                    break;
                }
                if !slam.result().is_judged() {
                    self.judge_slam(
                        self.slam_cursor,
                        JudgmentResult::Error,
                        current_time_sec,
                        status,
                        events,
                    );
                }
            }
            self.slam_cursor += 1;
        }
    }

    fn judge_slam(
        &mut self,
        idx: usize,
        result: JudgmentResult,
        current_time_sec: f64,
        status: &mut LaserLaneStatus,
        events: &mut Vec<JudgmentEvent>,
    ) {
        let slam = &mut self.slams[idx];
        slam.set_result(result);
        trace!("slam at pulse {} judged {:?}", slam.pulse(), result);
        self.judged_count += 1;
        events.push(JudgmentEvent::Slam {
            result,
            pulse: slam.pulse(),
            prev_time_sec: self.prev_time_sec,
            prev_pulse: self.prev_pulse,
            direction: slam.direction(),
        });
        if result == JudgmentResult::Critical {
            status.last_judged_slam_pulse = Some(slam.pulse());
            status.last_slam_judged_time_sec = current_time_sec;
            status.settle_until_sec = current_time_sec + laser_note::AUTO_SETTLE_SEC;
        }
    }

    fn process_direction_changes(&mut self, current_time_sec: f64, status: &mut LaserLaneStatus) {
        while let Some(&sec) = self.direction_change_secs.get(self.direction_change_cursor) {
            if sec > current_time_sec {
                break;
            }
            if current_time_sec - sec <= laser_note::AUTO_SETTLE_SEC {
                status.settle_until_sec = status.settle_until_sec.max(sec + laser_note::AUTO_SETTLE_SEC);
            }
            self.direction_change_cursor += 1;
        }
    }

    /// Judge every remaining unit and slam as Error and stop judging. Idempotent.
    pub fn lock_for_exit(&mut self, events: &mut Vec<JudgmentEvent>) {
        if self.is_locked_for_exit {
            return;
        }
        self.is_locked_for_exit = true;

        for unit in self.line_units[self.line_cursor..].iter_mut() {
            unit.result = JudgmentResult::Error;
            self.judged_count += 1;
            events.push(JudgmentEvent::Line {
                result: JudgmentResult::Error,
            });
        }
        self.line_cursor = self.line_units.len();

        for slam in self.slams[self.slam_cursor..].iter_mut() {
            if slam.result().is_judged() {
                continue;
            }
            slam.set_result(JudgmentResult::Error);
            self.judged_count += 1;
            events.push(JudgmentEvent::Slam {
                result: JudgmentResult::Error,
                pulse: slam.pulse(),
                prev_time_sec: self.prev_time_sec,
                prev_pulse: self.prev_pulse,
                direction: slam.direction(),
            });
        }
        self.slam_cursor = self.slams.len();
    }

    pub fn line_unit_count(&self) -> usize {
        self.line_units.len()
    }

    pub fn slam_count(&self) -> usize {
        self.slams.len()
    }

    pub fn total_unit_count(&self) -> usize {
        self.line_unit_count() + self.slam_count()
    }

    pub fn judged_unit_count(&self) -> usize {
        self.judged_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksm_model::{GraphValue, TempoMap};

    /// 120 BPM: 480 pulses per second
    fn timing() -> TempoMap {
        TempoMap::constant(120.0).unwrap()
    }

    struct Harness {
        lane: LaserLaneJudgment,
        timing: TempoMap,
        status: LaserLaneStatus,
    }

    impl Harness {
        fn new(sections: Vec<(Pulse, LaserSection)>, mode: JudgmentPlayMode) -> Self {
            let lane: ByPulse<LaserSection> = sections.into_iter().collect();
            let timing = timing();
            Self {
                lane: LaserLaneJudgment::new(&lane, &timing, mode),
                timing,
                status: LaserLaneStatus::default(),
            }
        }

        fn step(&mut self, sec: f64, delta: f64) -> Vec<JudgmentEvent> {
            let mut events = Vec::new();
            let pulse = self.timing.sec_to_pulse(sec);
            self.lane.update(delta, pulse, sec, &mut self.status, &mut events);
            events
        }

        /// Step at 120 fps from `from` to `to`, moving by `delta(sec)` each frame.
        fn run(&mut self, from: f64, to: f64, delta: impl Fn(f64) -> f64) -> Vec<JudgmentEvent> {
            let mut events = Vec::new();
            let mut frame: i32 = 0;
            loop {
                let sec = from + f64::from(frame) / 120.0;
                if sec > to {
                    break;
                }
                events.extend(self.step(sec, delta(sec)));
                frame += 1;
            }
            events
        }
    }

    /// Flat line at x=0.5 from 1.0s to 2.0s
    fn flat_section() -> (Pulse, LaserSection) {
        (
            480,
            LaserSection::new([(0, GraphValue::new(0.5)), (480, GraphValue::new(0.5))]),
        )
    }

    /// Line from 0.0 to 1.0 over 1.0s..2.0s
    fn moving_section() -> (Pulse, LaserSection) {
        (
            480,
            LaserSection::new([(0, GraphValue::new(0.0)), (480, GraphValue::new(1.0))]),
        )
    }

    /// Slam 0.0 -> 1.0 at 1.0s followed by a short flat tail
    fn slam_section() -> (Pulse, LaserSection) {
        (
            480,
            LaserSection::new([(0, GraphValue::slam(0.0, 1.0)), (48, GraphValue::new(1.0))]),
        )
    }

    fn results(events: &[JudgmentEvent]) -> Vec<JudgmentResult> {
        events.iter().map(JudgmentEvent::result).collect()
    }

    // --- Line tests ---

    #[test]
    fn test_flat_line_without_input_is_critical() {
        let mut h = Harness::new(vec![flat_section()], JudgmentPlayMode::On);
        let total = h.lane.total_unit_count();
        let events = h.run(0.0, 2.5, |_| 0.0);
        assert_eq!(events.len(), total);
        assert!(results(&events).iter().all(|&r| r == JudgmentResult::Critical));
    }

    #[test]
    fn test_moving_line_tracked_is_critical() {
        let mut h = Harness::new(vec![moving_section()], JudgmentPlayMode::On);
        let events = h.run(0.0, 2.5, |sec| if (1.0..2.0).contains(&sec) { 1.0 / 120.0 } else { 0.0 });
        assert_eq!(events.len(), h.lane.total_unit_count());
        assert!(results(&events).iter().all(|&r| r == JudgmentResult::Critical));
    }

    #[test]
    fn test_moving_line_untracked_errors() {
        let mut h = Harness::new(vec![moving_section()], JudgmentPlayMode::On);
        let events = h.run(0.0, 2.5, |_| 0.0);
        assert_eq!(events.len(), h.lane.total_unit_count());
        let errors = results(&events).iter().filter(|&&r| r == JudgmentResult::Error).count();
        // The cursor stays in range for the first 0.1 of travel only
        assert!(errors > events.len() / 2);
    }

    #[test]
    fn test_cursor_appears_on_section_start() {
        let mut h = Harness::new(vec![flat_section()], JudgmentPlayMode::On);
        h.step(0.5, 0.3);
        assert_eq!(h.status.cursor_x, None);
        h.step(1.0, 0.0);
        assert_eq!(h.status.cursor_x, Some(0.5));
        assert_eq!(h.status.current_section_pulse, Some(480));
        h.step(2.5, 0.0);
        assert_eq!(h.status.cursor_x, None);
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut h = Harness::new(vec![flat_section()], JudgmentPlayMode::On);
        h.step(1.0, 0.0);
        h.step(1.01, 5.0);
        assert_eq!(h.status.cursor_x, Some(1.0));
        assert!(!h.status.is_cursor_in_critical_range);
    }

    #[test]
    fn test_cursor_locks_within_range() {
        let mut h = Harness::new(vec![flat_section()], JudgmentPlayMode::On);
        h.step(1.0, 0.0);
        h.step(1.01, 0.05);
        h.step(1.02, 0.0);
        assert_eq!(h.status.cursor_x, Some(0.5));
    }

    // --- Slam tests ---

    #[test]
    fn test_slam_critical_with_flick() {
        let mut h = Harness::new(vec![slam_section()], JudgmentPlayMode::On);
        h.step(0.9, 0.0);
        let events = h.step(0.98, 0.2);
        assert_eq!(events.len(), 1);
        match events[0] {
            JudgmentEvent::Slam { result, pulse, direction, .. } => {
                assert_eq!(result, JudgmentResult::Critical);
                assert_eq!(pulse, 480);
                assert_eq!(direction, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(h.status.last_judged_slam_pulse, Some(480));
    }

    #[test]
    fn test_slam_wrong_direction_errors() {
        let mut h = Harness::new(vec![slam_section()], JudgmentPlayMode::On);
        let events = h.run(0.9, 1.2, |sec| if sec < 1.05 { -0.05 } else { 0.0 });
        let slam_results: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, JudgmentEvent::Slam { .. }))
            .map(JudgmentEvent::result)
            .collect();
        assert_eq!(slam_results, vec![JudgmentResult::Error]);
    }

    #[test]
    fn test_slam_credits_early_motion() {
        let mut h = Harness::new(vec![slam_section()], JudgmentPlayMode::On);
        // Flick right before the window opens at 0.9s
        h.step(0.85, 0.05);
        h.step(0.88, 0.04);
        let events = h.step(0.905, 0.02);
        assert_eq!(results(&events), vec![JudgmentResult::Critical]);
    }

    #[test]
    fn test_slam_ignores_stale_motion() {
        let mut h = Harness::new(vec![slam_section()], JudgmentPlayMode::On);
        h.step(0.5, 0.5);
        let events = h.step(0.905, 0.01);
        assert!(events.is_empty());
    }

    #[test]
    fn test_slam_sets_draw_settle() {
        let mut h = Harness::new(vec![slam_section()], JudgmentPlayMode::On);
        h.step(0.98, 0.2);
        assert!(h.status.settle_until_sec > 0.98);
    }

    // --- Auto play and lock tests ---

    #[test]
    fn test_auto_play_judges_everything_critical() {
        let mut h = Harness::new(
            vec![moving_section(), (1440, slam_section().1)],
            JudgmentPlayMode::Auto,
        );
        let total = h.lane.total_unit_count();
        let events = h.run(0.0, 3.5, |_| 0.0);
        assert_eq!(events.len(), total);
        assert!(results(&events).iter().all(|&r| r == JudgmentResult::Critical));
    }

    #[test]
    fn test_off_has_no_units() {
        let h = Harness::new(vec![flat_section(), (1440, slam_section().1)], JudgmentPlayMode::Off);
        assert_eq!(h.lane.total_unit_count(), 0);
    }

    #[test]
    fn test_lock_for_exit_is_idempotent() {
        let mut h = Harness::new(vec![flat_section(), (1440, slam_section().1)], JudgmentPlayMode::On);
        let total = h.lane.total_unit_count();
        let played = h.run(0.0, 1.5, |_| 0.0);

        let mut events = Vec::new();
        h.lane.lock_for_exit(&mut events);
        assert_eq!(played.len() + events.len(), total);
        assert!(results(&events).iter().all(|&r| r == JudgmentResult::Error));
        assert_eq!(h.lane.judged_unit_count(), total);

        let mut again = Vec::new();
        h.lane.lock_for_exit(&mut again);
        assert!(again.is_empty());
        assert!(h.step(4.0, 0.5).is_empty());
    }
}
