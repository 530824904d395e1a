//! The single sink for lane judgments.
//!
//! Every [`JudgmentEvent`] a lane reports is folded into the [`ScoringStatus`]
//! exactly once here. Critical slams also start the lane shake and are
//! relayed to the camera as [`SlamCamTrigger`]s.

use ksm_model::Pulse;
use log::{debug, info};

use crate::course_continuation::CourseContinuation;
use crate::gauge_property::chart_gauge_value_max;
use crate::judgment_result::{JudgmentEvent, JudgmentResult};
use crate::laser_slam_shake::LaserSlamShake;
use crate::play_option::PlayOption;
use crate::play_result::{PlayResult, chart_time_progress};
use crate::scoring_status::ScoringStatus;
use crate::view_status::ViewStatus;

/// Number of judgment units in a chart, by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JudgmentUnitCounts {
    pub chip: usize,
    pub long: usize,
    pub line: usize,
    pub slam: usize,
}

impl JudgmentUnitCounts {
    pub fn total(&self) -> usize {
        self.chip + self.long + self.line + self.slam
    }

    /// Normal gauge maximum; slams count like chips and line units like long units.
    pub fn chart_gauge_value_max(&self) -> i32 {
        chart_gauge_value_max(self.chip + self.slam, self.long + self.line)
    }
}

/// A Critical slam forwarded to the camera effects.
///
/// Missed slams are scored but never queued, so the camera stays still.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlamCamTrigger {
    pub pulse: Pulse,
    /// Pulse of the frame before the slam was judged
    pub prev_pulse: Pulse,
    pub direction: i32,
}

#[derive(Debug, Clone)]
pub struct JudgmentHandler {
    play_option: PlayOption,
    total_combo: i32,
    scoring_status: ScoringStatus,
    laser_slam_shake: LaserSlamShake,
    cam_triggers: Vec<SlamCamTrigger>,
    is_locked_for_exit: bool,
}

impl JudgmentHandler {
    pub fn new(
        play_option: PlayOption,
        unit_counts: JudgmentUnitCounts,
        continuation: Option<&CourseContinuation>,
    ) -> Self {
        let total_combo = i32::try_from(unit_counts.total()).unwrap_or(i32::MAX);
        let calc_type = play_option.gauge_calc_type();
        debug!(
            "judgment handler: {:?} gauge, {} units ({:?})",
            calc_type, total_combo, unit_counts
        );
        Self {
            scoring_status: ScoringStatus::new(
                calc_type,
                total_combo,
                unit_counts.chart_gauge_value_max(),
                continuation,
            ),
            play_option,
            total_combo,
            laser_slam_shake: LaserSlamShake::default(),
            cam_triggers: Vec::new(),
            is_locked_for_exit: false,
        }
    }

    /// Fold one lane event into the scoring state.
    pub fn handle(&mut self, event: JudgmentEvent) {
        match event {
            JudgmentEvent::Chip { result, diff_sec } => self.on_chip_judged(result, diff_sec),
            JudgmentEvent::Long { result } => self.on_long_judged(result),
            JudgmentEvent::Line { result } => self.on_laser_line_judged(result),
            JudgmentEvent::Slam {
                result,
                pulse,
                prev_time_sec,
                prev_pulse,
                direction,
            } => self.on_laser_slam_judged(result, pulse, prev_time_sec, prev_pulse, direction),
        }
    }

    pub fn on_chip_judged(&mut self, result: JudgmentResult, diff_sec: Option<f64>) {
        if self.is_locked_for_exit {
            return;
        }
        self.scoring_status.on_chip_or_slam_judgment(result, diff_sec);
    }

    pub fn on_long_judged(&mut self, result: JudgmentResult) {
        if self.is_locked_for_exit {
            return;
        }
        self.scoring_status.on_long_or_line_judgment(result);
    }

    pub fn on_laser_line_judged(&mut self, result: JudgmentResult) {
        if self.is_locked_for_exit {
            return;
        }
        self.scoring_status.on_long_or_line_judgment(result);
    }

    /// Score a slam. Only a Critical slam shakes the lane and queues a [`SlamCamTrigger`].
    pub fn on_laser_slam_judged(
        &mut self,
        result: JudgmentResult,
        pulse: Pulse,
        prev_time_sec: f64,
        prev_pulse: Pulse,
        direction: i32,
    ) {
        if self.is_locked_for_exit {
            return;
        }
        self.scoring_status.on_chip_or_slam_judgment(result, None);
        if result == JudgmentResult::Critical {
            self.laser_slam_shake.trigger(prev_time_sec, direction);
            self.cam_triggers.push(SlamCamTrigger {
                pulse,
                prev_pulse,
                direction,
            });
        }
    }

    /// Add the slam shake to the camera offsets.
    pub fn apply_to_view_status(&self, view_status: &mut ViewStatus, current_time_sec: f64) {
        view_status.cam_status.shift_x += self.laser_slam_shake.shift_x(current_time_sec);
    }

    /// Take the camera triggers queued since the last call.
    pub fn drain_cam_triggers(&mut self) -> Vec<SlamCamTrigger> {
        std::mem::take(&mut self.cam_triggers)
    }

    /// Stop accepting judgments. Idempotent.
    pub fn lock_for_exit(&mut self) {
        if self.is_locked_for_exit {
            return;
        }
        info!(
            "judgment locked: {}/{} units judged",
            self.scoring_status.combo_status().total_judged_combo(),
            self.total_combo
        );
        self.is_locked_for_exit = true;
    }

    pub fn is_locked_for_exit(&self) -> bool {
        self.is_locked_for_exit
    }

    pub fn scoring_status(&self) -> &ScoringStatus {
        &self.scoring_status
    }

    pub fn total_combo(&self) -> i32 {
        self.total_combo
    }

    pub fn play_result(
        &self,
        current_time_sec: f64,
        chart_end_time_sec: f64,
        is_hard_failed: bool,
    ) -> PlayResult {
        let scoring = &self.scoring_status;
        let combo = scoring.combo_status();
        PlayResult {
            score: scoring.score(),
            max_combo: combo.max_combo(),
            total_combo: self.total_combo,
            final_course_combo: combo.course_combo(),
            max_course_combo: combo.max_course_combo(),
            combo_stats: *combo.stats(),
            play_option: self.play_option.clone(),
            gauge_calc_type: scoring.calc_type(),
            gauge_percentage: scoring.gauge_percentage(),
            gauge_percentage_for_grade: scoring.gauge_percentage_for_grade(),
            gauge_value: scoring.gauge_value(),
            chart_time_progress: chart_time_progress(current_time_sec, chart_end_time_sec),
            is_hard_failed,
        }
    }
}
