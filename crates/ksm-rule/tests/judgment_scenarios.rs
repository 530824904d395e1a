use ksm_model::{ByPulse, ChartData, GraphValue, Interval, LaserSection, TempoMap, TimingProvider};
use ksm_rule::{
    Achievement, Button, ComboStats, CourseContinuation, FrameInput, FrameTime, GameMode,
    GameStatus, GaugeType, Grade, JudgmentEvent, JudgmentMain, JudgmentPlayMode, JudgmentResult,
    LaserLaneJudgment, LaserLaneStatus, NUM_BUTTONS, PlayOption,
};

const FPS: f64 = 120.0;

/// A play driven frame by frame at [`FPS`].
struct Session {
    timing: TempoMap,
    option: PlayOption,
    main: JudgmentMain,
    status: GameStatus,
    prev_pressed: [bool; NUM_BUTTONS],
    frame: i32,
}

impl Session {
    fn new(chart: &ChartData, option: PlayOption) -> Self {
        Self::with_continuation(chart, option, None)
    }

    fn with_continuation(
        chart: &ChartData,
        option: PlayOption,
        continuation: Option<&CourseContinuation>,
    ) -> Self {
        let timing = chart.tempo_map().unwrap();
        let main = JudgmentMain::new(chart, &timing, option.clone(), continuation).unwrap();
        Self {
            timing,
            option,
            main,
            status: GameStatus::default(),
            prev_pressed: [false; NUM_BUTTONS],
            frame: 0,
        }
    }

    fn time_sec(&self) -> f64 {
        f64::from(self.frame) / FPS
    }

    fn step(&mut self, pressed: [bool; NUM_BUTTONS], laser_delta_cursor_x: [f64; 2]) {
        let time = FrameTime::new(&self.timing, self.time_sec(), &self.option);
        let input = FrameInput::from_pressed(&self.prev_pressed, &pressed, laser_delta_cursor_x);
        self.main.update(&time, &input, &mut self.status);
        self.prev_pressed = pressed;
        self.frame += 1;
    }

    fn run_with(
        &mut self,
        until_sec: f64,
        mut input: impl FnMut(f64) -> ([bool; NUM_BUTTONS], [f64; 2]),
    ) {
        while self.time_sec() <= until_sec {
            let (pressed, laser) = input(self.time_sec());
            self.step(pressed, laser);
        }
    }

    fn run(&mut self, until_sec: f64, mut pressed: impl FnMut(f64) -> [bool; NUM_BUTTONS]) {
        self.run_with(until_sec, |t| (pressed(t), [0.0; 2]));
    }

    fn stats(&self) -> ComboStats {
        *self.main.scoring_status().combo_status().stats()
    }
}

/// `count` chips at 120 BPM, chip `i` on BT lane `i % 4` at [`chip_sec`].
fn chip_chart(count: usize) -> ChartData {
    let mut chart = ChartData::default();
    chart.bpm.insert(0, 120.0);
    for i in 0..count {
        chart.note.bt[i % 4].insert(480 + 240 * i as i64, Interval::chip());
    }
    chart
}

fn chip_sec(i: usize) -> f64 {
    1.0 + 0.5 * i as f64
}

/// Tap the listed chips of [`chip_chart`] right on time.
fn tap(chips: Vec<usize>) -> impl Fn(f64) -> [bool; NUM_BUTTONS] {
    move |t| {
        let mut pressed = [false; NUM_BUTTONS];
        for &i in &chips {
            if t >= chip_sec(i) && t < chip_sec(i) + 0.02 {
                pressed[i % 4] = true;
            }
        }
        pressed
    }
}

fn hard_option() -> PlayOption {
    PlayOption {
        gauge_type: GaugeType::Hard,
        ..Default::default()
    }
}

fn course_option() -> PlayOption {
    PlayOption {
        gauge_type: GaugeType::Hard,
        game_mode: GameMode::Course,
        ..Default::default()
    }
}

// =========================================================================
// Whole-play results
// =========================================================================

#[test]
fn test_all_critical_is_perfect() {
    let mut session = Session::new(&chip_chart(10), PlayOption::default());
    session.run(6.0, tap((0..10).collect()));

    let stats = session.stats();
    assert_eq!(stats.critical, 10);
    assert_eq!(stats.error, 0);
    let combo = session.main.scoring_status().combo_status();
    assert_eq!(combo.combo(), 10);
    assert_eq!(combo.max_combo(), 10);

    let result = session.main.play_result(6.0);
    assert_eq!(result.score, 10_000_000);
    assert_eq!(result.achievement(), Achievement::Perfect);
    assert_eq!(result.grade(), Grade::AAA);
    assert_eq!(result.chart_time_progress, 1.0);
}

#[test]
fn test_missing_last_chip_is_cleared() {
    let mut session = Session::new(&chip_chart(10), PlayOption::default());
    session.run(6.0, tap((0..9).collect()));

    let stats = session.stats();
    assert_eq!(stats.critical, 9);
    assert_eq!(stats.error, 1);

    let result = session.main.play_result(6.0);
    assert_eq!(result.max_combo, 9);
    assert_eq!(result.score, 9_000_000);
    assert!((result.gauge_percentage - 98.0).abs() < 1e-9);
    assert_eq!(result.achievement(), Achievement::Cleared);
    assert_eq!(result.grade(), Grade::A);
}

#[test]
fn test_missing_middle_chip_breaks_full_combo() {
    let mut session = Session::new(&chip_chart(10), PlayOption::default());
    session.run(6.0, tap((0..10).filter(|&i| i != 4).collect()));

    let result = session.main.play_result(6.0);
    assert_eq!(result.max_combo, 5);
    assert_eq!(result.achievement(), Achievement::Cleared);
}

#[test]
fn test_hard_gauge_fails_after_five_errors() {
    let mut session = Session::new(&chip_chart(10), hard_option());
    session.run(3.2, tap((5..10).collect()));
    assert!(session.main.is_hard_failed());
    assert!(session.main.is_locked_for_exit());
    let failed_at = session.stats();
    assert_eq!(failed_at.error, 5);

    // Taps after the failure frame change nothing
    session.run(6.0, tap((5..10).collect()));
    assert_eq!(session.stats(), failed_at);
    assert_eq!(session.main.scoring_status().score(), 0);

    let result = session.main.play_result(6.0);
    assert!(result.is_hard_failed);
    assert_eq!(result.gauge_value, 0);
    assert_eq!(result.achievement(), Achievement::None);
}

#[test]
fn test_exit_mid_chart_is_aborted() {
    let mut session = Session::new(&chip_chart(10), PlayOption::default());
    session.run(2.3, tap((0..3).collect()));
    session.main.lock_for_exit();
    session.run(6.0, tap((3..10).collect()));

    let stats = session.stats();
    assert_eq!(stats.total_judged_combo(), 3);
    assert_eq!(stats.error, 0);

    let result = session.main.play_result(2.3);
    assert!(result.is_aborted());
    assert!(!result.is_hard_failed);
    assert_eq!(result.achievement(), Achievement::None);
    assert_eq!(result.grade(), Grade::D);
    assert!((result.chart_time_progress - 2.3 / 5.5).abs() < 1e-9);
}

#[test]
fn test_exit_twice_keeps_first_result() {
    let mut session = Session::new(&chip_chart(10), PlayOption::default());
    session.run(2.3, tap((0..3).collect()));
    session.main.lock_for_exit();
    let first = session.main.play_result(2.3);
    session.main.lock_for_exit();
    assert_eq!(session.main.play_result(2.3), first);
}

#[test]
fn test_exit_mid_chart_finishes_every_lane() {
    let mut session = Session::new(&chip_chart(10), PlayOption::default());
    session.run(2.3, tap((0..3).collect()));
    assert!(!session.main.is_finished());

    session.main.lock_for_exit();
    assert!(session.main.is_finished());
    assert_eq!(session.main.judged_unit_count(), session.main.total_unit_count());
    // Closed units are not scored
    assert_eq!(session.stats().total_judged_combo(), 3);
}

// =========================================================================
// Button lanes
// =========================================================================

#[test]
fn test_early_release_errors_one_unit() {
    let mut chart = ChartData::default();
    chart.bpm.insert(0, 120.0);
    // 2.0s to 3.0s
    chart.note.bt[2].insert(960, Interval::long(480));
    let mut session = Session::new(&chart, PlayOption::default());

    let hold = |t: f64| {
        let mut pressed = [false; NUM_BUTTONS];
        pressed[Button::BtC as usize] = (2.0..2.4).contains(&t);
        pressed
    };
    session.run(2.39, hold);
    assert_eq!(session.stats().critical, 3);
    assert_eq!(session.stats().error, 0);

    session.run(2.41, hold);
    assert_eq!(session.stats().error, 1);

    session.run(3.5, hold);
    assert_eq!(session.stats().error, 3);
    assert!(session.main.is_finished());
}

#[test]
fn test_fx_key_sound_chip_forgives_early_press() {
    let mut chart = ChartData::default();
    chart.bpm.insert(0, 120.0);
    chart.note.fx[0].insert(480, Interval::chip());
    chart.note.fx[0].insert(960, Interval::chip());
    chart.fx_key_sound[0].insert(480);
    let mut session = Session::new(&chart, PlayOption::default());

    // 70ms early on both chips
    session.run(3.0, |t| {
        let mut pressed = [false; NUM_BUTTONS];
        pressed[Button::FxL as usize] = (0.93..0.95).contains(&t) || (1.93..1.95).contains(&t);
        pressed
    });
    let stats = session.stats();
    assert_eq!(stats.critical, 1);
    assert_eq!(stats.near_fast, 1);
    assert!(stats.average_deviation_sec().is_some_and(|d| d < 0.0));
}

#[test]
fn test_fx_priority_follows_latest_long_note() {
    let mut chart = ChartData::default();
    chart.bpm.insert(0, 120.0);
    chart.note.fx[0].insert(960, Interval::long(960));
    chart.note.fx[1].insert(1200, Interval::long(720));
    let mut session = Session::new(&chart, PlayOption::default());

    let hold = |t: f64| {
        let mut pressed = [false; NUM_BUTTONS];
        pressed[Button::FxL as usize] = (2.0..4.2).contains(&t);
        pressed[Button::FxR as usize] = (2.5..3.0).contains(&t);
        pressed
    };
    session.run(2.2, hold);
    assert_eq!(session.main.fx_lane_priority().active_lane(), Some(0));
    session.run(2.7, hold);
    assert_eq!(session.main.fx_lane_priority().active_lane(), Some(1));
    assert_eq!(session.main.fx_lane_priority().lane_order(), [1, 0]);
    session.run(3.2, hold);
    assert_eq!(session.main.fx_lane_priority().active_lane(), Some(0));
    session.run(4.5, hold);
    assert_eq!(session.main.fx_lane_priority().active_lane(), None);
}

// =========================================================================
// Laser slams
// =========================================================================

/// Right slam from 0.0 to 1.0 at 1.0s, then a flat line.
fn slam_section() -> LaserSection {
    LaserSection::new([(0, GraphValue::slam(0.0, 1.0)), (240, GraphValue::new(1.0))])
}

fn judge_slam(motion: impl Fn(f64) -> f64) -> JudgmentResult {
    let timing = TempoMap::constant(120.0).unwrap();
    let lane: ByPulse<LaserSection> = ByPulse::from([(480, slam_section())]);
    let mut judgment = LaserLaneJudgment::new(&lane, &timing, JudgmentPlayMode::On);
    let mut status = LaserLaneStatus::default();
    let mut events = Vec::new();
    let mut frame: i32 = 0;
    while f64::from(frame) / FPS <= 2.0 {
        let t = f64::from(frame) / FPS;
        judgment.update(motion(t), timing.sec_to_pulse(t), t, &mut status, &mut events);
        frame += 1;
    }
    let slams: Vec<JudgmentResult> = events
        .iter()
        .filter_map(|e| match *e {
            JudgmentEvent::Slam { result, .. } => Some(result),
            _ => None,
        })
        .collect();
    assert_eq!(slams.len(), 1);
    slams[0]
}

#[test]
fn test_slam_flick_in_direction_is_critical() {
    let result = judge_slam(|t| if (0.95..1.05).contains(&t) { 0.02 } else { 0.0 });
    assert_eq!(result, JudgmentResult::Critical);
}

#[test]
fn test_slam_flick_against_direction_is_error() {
    let result = judge_slam(|t| if (0.95..1.05).contains(&t) { -0.05 } else { 0.0 });
    assert_eq!(result, JudgmentResult::Error);
}

#[test]
fn test_slam_wiggle_counts_net_travel() {
    let result = judge_slam(|t| {
        if (0.95..1.0).contains(&t) || (1.05..1.1).contains(&t) {
            0.01
        } else if (1.0..1.05).contains(&t) {
            -0.01
        } else {
            0.0
        }
    });
    assert_eq!(result, JudgmentResult::Error);
}

#[test]
fn test_slam_without_motion_is_error() {
    assert_eq!(judge_slam(|_| 0.0), JudgmentResult::Error);
}

#[test]
fn test_slam_flick_just_before_window_counts() {
    let result = judge_slam(|t| if (0.85..0.89).contains(&t) { 0.04 } else { 0.0 });
    assert_eq!(result, JudgmentResult::Critical);
}

#[test]
fn test_slam_stale_flick_does_not_count() {
    let result = judge_slam(|t| if (0.60..0.70).contains(&t) { 0.04 } else { 0.0 });
    assert_eq!(result, JudgmentResult::Error);
}

#[test]
fn test_slam_flick_after_window_is_error() {
    let result = judge_slam(|t| if (1.15..1.25).contains(&t) { 0.05 } else { 0.0 });
    assert_eq!(result, JudgmentResult::Error);
}

#[test]
fn test_critical_slam_reaches_camera() {
    let mut chart = ChartData::default();
    chart.bpm.insert(0, 120.0);
    chart.note.laser[0].insert(480, slam_section());
    let mut session = Session::new(&chart, PlayOption::default());

    session.run_with(2.0, |t| {
        let delta = if (0.95..1.05).contains(&t) { 0.02 } else { 0.0 };
        ([false; NUM_BUTTONS], [delta, 0.0])
    });
    let triggers = session.main.drain_cam_triggers();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].pulse, 480);
    assert_eq!(triggers[0].direction, 1);

    let stats = session.stats();
    assert_eq!(stats.error, 0);
    assert_eq!(stats.critical as usize, session.main.total_unit_count());
    assert!(session.main.is_finished());
}

#[test]
fn test_missed_slam_skips_camera() {
    let mut chart = ChartData::default();
    chart.bpm.insert(0, 120.0);
    chart.note.laser[0].insert(480, slam_section());
    let mut session = Session::new(&chart, PlayOption::default());

    session.run(2.0, |_| [false; NUM_BUTTONS]);
    assert!(session.main.drain_cam_triggers().is_empty());
    assert_eq!(session.stats().error, 1);
}

// =========================================================================
// Course continuation
// =========================================================================

#[test]
fn test_course_carries_gauge_and_combo() {
    let first_chart = chip_chart(10);
    let mut first = Session::new(&first_chart, course_option());
    first.run(6.0, tap((0..8).collect()));
    let first_result = first.main.play_result(6.0);
    assert_eq!(first_result.gauge_value, 50_000);
    assert_eq!(first_result.final_course_combo, 0);

    let continuation = CourseContinuation::after(None, &first_result);
    assert_eq!(continuation.gauge_value, 50_000);
    assert!(!continuation.is_no_error);

    let mut second = Session::with_continuation(&chip_chart(10), course_option(), Some(&continuation));
    assert_eq!(second.main.scoring_status().gauge_value(), 50_000);
    second.run(6.0, tap((0..10).collect()));
    let second_result = second.main.play_result(6.0);
    assert_eq!(second_result.final_course_combo, 10);
    assert_eq!(second_result.combo_stats.error, 0);

    let next = CourseContinuation::after(Some(&continuation), &second_result);
    assert!(!next.is_no_error);
    assert_eq!(next.combo, 10);
}

#[test]
fn test_course_combo_spans_charts() {
    let mut first = Session::new(&chip_chart(10), course_option());
    first.run(6.0, tap((0..10).collect()));
    let continuation = CourseContinuation::after(None, &first.main.play_result(6.0));
    assert!(continuation.is_no_error);

    let mut second = Session::with_continuation(&chip_chart(10), course_option(), Some(&continuation));
    second.run(6.0, tap((0..10).collect()));
    let result = second.main.play_result(6.0);
    assert_eq!(result.max_combo, 10);
    assert_eq!(result.final_course_combo, 20);
    assert_eq!(result.max_course_combo, 20);
}

#[test]
fn test_single_chart_ignores_carried_gauge() {
    let continuation = CourseContinuation {
        gauge_value: 10_000,
        combo: 0,
        is_no_error: true,
    };
    let session = Session::with_continuation(&chip_chart(10), hard_option(), Some(&continuation));
    assert_eq!(session.main.scoring_status().gauge_percentage_int(), 100);
}

// =========================================================================
// Chart loading
// =========================================================================

const AUTO_CHART_JSON: &str = r#"{
    "note": {
        "bt": [{"480": {"length": 0}}, {"960": {"length": 480}}, {}, {}],
        "fx": [{"1440": {"length": 0}}, {}],
        "laser": [
            {"480": {"points": {"0": {"v": 0.0, "vf": 0.0}, "240": {"v": 0.0, "vf": 1.0}}}},
            {}
        ]
    },
    "bpm": {"0": 120.0},
    "fx_key_sound": [[1440], []]
}"#;

#[test]
fn test_auto_play_from_json_chart() {
    let chart = ChartData::from_json_str(AUTO_CHART_JSON).unwrap();
    let option = PlayOption {
        is_auto_play: true,
        ..Default::default()
    };
    let mut session = Session::new(&chart, option);
    session.run(4.0, |_| [false; NUM_BUTTONS]);
    assert!(session.main.is_finished());

    let result = session.main.play_result(4.0);
    assert_eq!(result.achievement(), Achievement::Perfect);
    assert_eq!(result.gauge_percent_for_high_score(), 100);

    let json = serde_json::to_string(&result).unwrap();
    let stored: ksm_rule::PlayResult = serde_json::from_str(&json).unwrap();
    assert_eq!(stored, result);
}

#[test]
fn test_malformed_chart_json_is_rejected() {
    assert!(ChartData::from_json_str(r#"{"note": {}}"#).is_err());
    assert!(ChartData::from_json_str(r#"{"note": {"bt": [{}, {}, {}, {}], "fx": [{}, {}], "laser": [{}, {}]}, "bpm": {}}"#).is_err());
}
