//! Per-frame judgment driver for a whole chart.
//!
//! Owns one judgment per lane plus the [`JudgmentHandler`]. Each frame the
//! lanes are stepped in a fixed order (BT, FX, laser), their events are
//! folded into the handler, and a hard-failed gauge locks the play.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use ksm_model::{ChartData, NUM_BT_LANES, NUM_FX_LANES, NUM_LASER_LANES, TimingProvider};
use log::{debug, info, warn};

use crate::button_lane_judgment::ButtonLaneJudgment;
use crate::course_continuation::CourseContinuation;
use crate::frame_input::{Button, FrameInput, FrameTime};
use crate::fx_lane_priority::FxLanePriority;
use crate::game_status::GameStatus;
use crate::judgment_handler::{JudgmentHandler, JudgmentUnitCounts, SlamCamTrigger};
use crate::judgment_result::JudgmentEvent;
use crate::laser_lane_judgment::LaserLaneJudgment;
use crate::play_option::PlayOption;
use crate::play_result::PlayResult;
use crate::scoring_status::ScoringStatus;
use crate::view_status::ViewStatus;

#[derive(Debug, Clone)]
pub struct JudgmentMain {
    bt_lanes: [ButtonLaneJudgment; NUM_BT_LANES],
    fx_lanes: [ButtonLaneJudgment; NUM_FX_LANES],
    laser_lanes: [LaserLaneJudgment; NUM_LASER_LANES],
    handler: JudgmentHandler,
    fx_lane_priority: FxLanePriority,
    /// Reused per-frame event buffer
    events: Vec<JudgmentEvent>,
    chart_end_time_sec: f64,
    is_hard_failed: bool,
}

impl JudgmentMain {
    pub fn new(
        chart: &ChartData,
        timing: &impl TimingProvider,
        play_option: PlayOption,
        continuation: Option<&CourseContinuation>,
    ) -> Result<Self> {
        chart.validate().context("chart cannot be judged")?;

        let bt_mode = play_option.effective_bt_judgment_play_mode();
        let fx_mode = play_option.effective_fx_judgment_play_mode();
        let laser_mode = play_option.effective_laser_judgment_play_mode();
        let no_key_sounds = BTreeSet::new();

        let bt_lanes: [ButtonLaneJudgment; NUM_BT_LANES] = std::array::from_fn(|i| {
            ButtonLaneJudgment::new(&chart.note.bt[i], &no_key_sounds, timing, bt_mode)
        });
        let fx_lanes: [ButtonLaneJudgment; NUM_FX_LANES] = std::array::from_fn(|i| {
            ButtonLaneJudgment::new(&chart.note.fx[i], &chart.fx_key_sound[i], timing, fx_mode)
        });
        let laser_lanes: [LaserLaneJudgment; NUM_LASER_LANES] = std::array::from_fn(|i| {
            LaserLaneJudgment::new(&chart.note.laser[i], timing, laser_mode)
        });

        let button_lanes = bt_lanes.iter().chain(fx_lanes.iter());
        let unit_counts = JudgmentUnitCounts {
            chip: button_lanes.clone().map(ButtonLaneJudgment::chip_count).sum(),
            long: button_lanes.map(ButtonLaneJudgment::long_unit_count).sum(),
            line: laser_lanes.iter().map(LaserLaneJudgment::line_unit_count).sum(),
            slam: laser_lanes.iter().map(LaserLaneJudgment::slam_count).sum(),
        };
        if unit_counts.total() == 0 {
            warn!("chart has no judgment units");
        }
        debug!(
            "judgment modes: bt={:?} fx={:?} laser={:?}",
            bt_mode, fx_mode, laser_mode
        );

        let chart_end_time_sec = timing.pulse_to_sec(chart.note.last_note_end_pulse());
        Ok(Self {
            bt_lanes,
            fx_lanes,
            laser_lanes,
            handler: JudgmentHandler::new(play_option, unit_counts, continuation),
            fx_lane_priority: FxLanePriority::default(),
            events: Vec::new(),
            chart_end_time_sec,
            is_hard_failed: false,
        })
    }

    /// Step every lane by one frame. Does nothing once locked.
    pub fn update(&mut self, frame: &FrameTime, input: &FrameInput, game_status: &mut GameStatus) {
        if self.handler.is_locked_for_exit() {
            return;
        }

        for (i, lane) in self.bt_lanes.iter_mut().enumerate() {
            lane.update(
                input.button(Button::BT[i]),
                frame.button_pulse,
                frame.button_time_sec,
                &mut game_status.bt_lanes[i],
                &mut self.events,
            );
        }
        for (i, lane) in self.fx_lanes.iter_mut().enumerate() {
            lane.update(
                input.button(Button::FX[i]),
                frame.button_pulse,
                frame.button_time_sec,
                &mut game_status.fx_lanes[i],
                &mut self.events,
            );
        }
        self.fx_lane_priority.update(std::array::from_fn(|i| {
            game_status.fx_lanes[i].current_long_note_pulse.is_some()
        }));
        for (i, lane) in self.laser_lanes.iter_mut().enumerate() {
            lane.update(
                input.laser_delta_cursor_x[i],
                frame.laser_pulse,
                frame.laser_time_sec,
                &mut game_status.laser_lanes[i],
                &mut self.events,
            );
        }
        self.flush_events();

        if self.handler.scoring_status().is_hard_failed() {
            info!("gauge emptied at {:.3}s, play failed", frame.current_time_sec);
            self.is_hard_failed = true;
            self.lock_for_exit();
        }
    }

    fn flush_events(&mut self) {
        for event in self.events.drain(..) {
            self.handler.handle(event);
        }
    }

    /// Stop judging; an unfinished play stays aborted. Idempotent.
    pub fn lock_for_exit(&mut self) {
        if self.handler.is_locked_for_exit() {
            return;
        }
        self.handler.lock_for_exit();
        for lane in self.bt_lanes.iter_mut().chain(self.fx_lanes.iter_mut()) {
            lane.lock_for_exit(&mut self.events);
        }
        for lane in self.laser_lanes.iter_mut() {
            lane.lock_for_exit(&mut self.events);
        }
        // Errors forced at exit close the lanes but are not scored
        self.events.clear();
    }

    pub fn is_locked_for_exit(&self) -> bool {
        self.handler.is_locked_for_exit()
    }

    /// Every unit has been judged, including units closed by [`Self::lock_for_exit`].
    pub fn is_finished(&self) -> bool {
        self.judged_unit_count() == self.total_unit_count()
    }

    pub fn is_hard_failed(&self) -> bool {
        self.is_hard_failed
    }

    pub fn total_unit_count(&self) -> usize {
        self.bt_lanes
            .iter()
            .chain(self.fx_lanes.iter())
            .map(ButtonLaneJudgment::total_unit_count)
            .chain(self.laser_lanes.iter().map(LaserLaneJudgment::total_unit_count))
            .sum()
    }

    pub fn judged_unit_count(&self) -> usize {
        self.bt_lanes
            .iter()
            .chain(self.fx_lanes.iter())
            .map(ButtonLaneJudgment::judged_unit_count)
            .chain(self.laser_lanes.iter().map(LaserLaneJudgment::judged_unit_count))
            .sum()
    }

    pub fn scoring_status(&self) -> &ScoringStatus {
        self.handler.scoring_status()
    }

    pub fn fx_lane_priority(&self) -> &FxLanePriority {
        &self.fx_lane_priority
    }

    pub fn chart_end_time_sec(&self) -> f64 {
        self.chart_end_time_sec
    }

    pub fn apply_to_view_status(&self, view_status: &mut ViewStatus, current_time_sec: f64) {
        self.handler.apply_to_view_status(view_status, current_time_sec);
    }

    pub fn drain_cam_triggers(&mut self) -> Vec<SlamCamTrigger> {
        self.handler.drain_cam_triggers()
    }

    pub fn play_result(&self, current_time_sec: f64) -> PlayResult {
        self.handler
            .play_result(current_time_sec, self.chart_end_time_sec, self.is_hard_failed)
    }
}
