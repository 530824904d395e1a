use serde::{Deserialize, Serialize};

use crate::combo_status::ComboStats;
use crate::play_option::{GaugeCalcType, PlayOption};
use crate::scoring_status::SCORE_MAX;

/// Clear tier of a play, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Achievement {
    #[default]
    None = 0,
    Cleared = 1,
    FullCombo = 2,
    Perfect = 3,
}

/// Letter grade, ordered from lowest to highest.
///
/// `NoGrade` means never played; an aborted play still gets `D`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Grade {
    #[default]
    NoGrade = 0,
    D = 1,
    C = 2,
    B = 3,
    A = 4,
    AA = 5,
    AAA = 6,
}

/// Grade blend thresholds, highest first.
const GRADE_BORDERS: [(i64, Grade); 5] = [
    (9_800_000, Grade::AAA),
    (9_400_000, Grade::AA),
    (8_900_000, Grade::A),
    (8_000_000, Grade::B),
    (7_000_000, Grade::C),
];

/// Weight of the score in the grade blend, out of [`SCORE_MAX`].
const GRADE_SCORE_WEIGHT: i64 = 9_000_000;

/// Weight of the grade gauge in the grade blend.
const GRADE_GAUGE_WEIGHT: i64 = 1_000_000;

impl Grade {
    /// Blend 90% score with 10% floored grade-gauge percentage.
    pub fn from_score_and_gauge(score: i32, gauge_percentage_for_grade: f64) -> Self {
        let score_factor = i64::from(score) * GRADE_SCORE_WEIGHT / SCORE_MAX;
        let gauge_factor = GRADE_GAUGE_WEIGHT * gauge_percentage_for_grade.floor() as i64 / 100;
        let value = score_factor + gauge_factor;
        GRADE_BORDERS
            .iter()
            .find(|(border, _)| value >= *border)
            .map_or(Grade::D, |&(_, grade)| grade)
    }
}

/// Snapshot of a finished (or abandoned) play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayResult {
    pub score: i32,
    pub max_combo: i32,
    pub total_combo: i32,
    pub final_course_combo: i32,
    pub max_course_combo: i32,
    pub combo_stats: ComboStats,
    pub play_option: PlayOption,
    pub gauge_calc_type: GaugeCalcType,
    pub gauge_percentage: f64,
    /// Normal-gauge percentage played alongside the active gauge
    pub gauge_percentage_for_grade: f64,
    /// Raw gauge value, carried to the next chart of a course
    pub gauge_value: i32,
    /// Elapsed fraction of the chart, 0.0 to 1.0
    pub chart_time_progress: f64,
    pub is_hard_failed: bool,
}

impl PlayResult {
    /// Not every unit was judged.
    pub fn is_aborted(&self) -> bool {
        self.combo_stats.total_judged_combo() < self.total_combo
    }

    pub fn gauge_percentage_int(&self) -> i32 {
        self.gauge_percentage.floor() as i32
    }

    pub fn achievement(&self) -> Achievement {
        if self.is_aborted() || self.is_hard_failed {
            return Achievement::None;
        }
        let border = self.gauge_calc_type.property().clear_border;
        if !border.is_cleared(self.gauge_percentage_int()) {
            return Achievement::None;
        }
        if self.combo_stats.critical == self.total_combo {
            Achievement::Perfect
        } else if self.max_combo == self.total_combo {
            Achievement::FullCombo
        } else {
            Achievement::Cleared
        }
    }

    pub fn grade(&self) -> Grade {
        if self.is_aborted() {
            return Grade::D;
        }
        Grade::from_score_and_gauge(self.score, self.gauge_percentage_for_grade)
    }

    /// Gauge percentage worth recording as a high score.
    pub fn gauge_percent_for_high_score(&self) -> i32 {
        if self.is_aborted() {
            0
        } else {
            self.gauge_percentage_int()
        }
    }
}

/// Fraction of the chart that has been played.
pub fn chart_time_progress(current_time_sec: f64, chart_end_time_sec: f64) -> f64 {
    if chart_end_time_sec <= 0.0 {
        return 1.0;
    }
    (current_time_sec / chart_end_time_sec).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course_continuation::CourseContinuation;
    use crate::play_option::{GameMode, GaugeType};

    fn result(calc_type: GaugeCalcType, stats: ComboStats, total: i32) -> PlayResult {
        PlayResult {
            score: 0,
            max_combo: 0,
            total_combo: total,
            final_course_combo: 0,
            max_course_combo: 0,
            combo_stats: stats,
            play_option: PlayOption::default(),
            gauge_calc_type: calc_type,
            gauge_percentage: 100.0,
            gauge_percentage_for_grade: 100.0,
            gauge_value: 0,
            chart_time_progress: 1.0,
            is_hard_failed: false,
        }
    }

    fn stats(critical: i32, near: i32, error: i32) -> ComboStats {
        ComboStats {
            critical,
            near_fast: near,
            error,
            ..Default::default()
        }
    }

    // =========================================================================
    // Aborted tests
    // =========================================================================

    #[test]
    fn test_aborted_when_units_remain() {
        let r = result(GaugeCalcType::Normal, stats(3, 0, 0), 10);
        assert!(r.is_aborted());
        assert_eq!(r.achievement(), Achievement::None);
        assert_eq!(r.grade(), Grade::D);
        assert_eq!(r.gauge_percent_for_high_score(), 0);
    }

    #[test]
    fn test_not_aborted_when_all_judged() {
        let r = result(GaugeCalcType::Normal, stats(7, 2, 1), 10);
        assert!(!r.is_aborted());
        assert_eq!(r.gauge_percent_for_high_score(), 100);
    }

    // =========================================================================
    // Achievement tests
    // =========================================================================

    #[test]
    fn test_achievement_perfect() {
        let mut r = result(GaugeCalcType::Normal, stats(10, 0, 0), 10);
        r.max_combo = 10;
        assert_eq!(r.achievement(), Achievement::Perfect);
    }

    #[test]
    fn test_achievement_full_combo() {
        let mut r = result(GaugeCalcType::Normal, stats(8, 2, 0), 10);
        r.max_combo = 10;
        assert_eq!(r.achievement(), Achievement::FullCombo);
    }

    #[test]
    fn test_achievement_cleared() {
        let mut r = result(GaugeCalcType::Normal, stats(9, 0, 1), 10);
        r.max_combo = 9;
        assert_eq!(r.achievement(), Achievement::Cleared);
    }

    #[test]
    fn test_achievement_normal_border() {
        let mut r = result(GaugeCalcType::Normal, stats(9, 0, 1), 10);
        r.gauge_percentage = 69.99;
        assert_eq!(r.achievement(), Achievement::None);
        r.gauge_percentage = 70.0;
        assert_eq!(r.achievement(), Achievement::Cleared);
    }

    #[test]
    fn test_achievement_hard_border() {
        let mut r = result(GaugeCalcType::Hard, stats(5, 0, 5), 10);
        r.gauge_percentage = 0.999;
        assert_eq!(r.achievement(), Achievement::None);
        r.gauge_percentage = 1.0;
        assert_eq!(r.achievement(), Achievement::Cleared);
    }

    #[test]
    fn test_achievement_hard_failed() {
        let mut r = result(GaugeCalcType::Hard, stats(0, 0, 10), 10);
        r.gauge_percentage = 0.0;
        r.is_hard_failed = true;
        assert_eq!(r.achievement(), Achievement::None);
    }

    // =========================================================================
    // Grade tests
    // =========================================================================

    #[test]
    fn test_grade_boundaries_full_gauge() {
        let cases = [
            (9_777_778, Grade::AAA),
            (9_777_777, Grade::AA),
            (9_333_334, Grade::AA),
            (9_333_333, Grade::A),
            (8_777_778, Grade::A),
            (8_777_777, Grade::B),
            (7_777_778, Grade::B),
            (7_777_777, Grade::C),
            (6_666_667, Grade::C),
            (6_666_666, Grade::D),
        ];
        for (score, grade) in cases {
            assert_eq!(Grade::from_score_and_gauge(score, 100.0), grade, "score {score}");
        }
    }

    #[test]
    fn test_grade_boundaries_empty_gauge() {
        let cases = [
            (10_000_000, Grade::A),
            (9_888_889, Grade::A),
            (9_888_888, Grade::B),
            (8_888_889, Grade::B),
            (8_888_888, Grade::C),
            (7_777_778, Grade::C),
            (7_777_777, Grade::D),
            (0, Grade::D),
        ];
        for (score, grade) in cases {
            assert_eq!(Grade::from_score_and_gauge(score, 0.0), grade, "score {score}");
        }
    }

    #[test]
    fn test_grade_floors_gauge() {
        // 8_000_000 * 0.9 = 7_200_000; + 99.9% -> 990_000 = 8_190_000
        assert_eq!(Grade::from_score_and_gauge(8_000_000, 99.9), Grade::B);
    }

    #[test]
    fn test_grade_ordering() {
        assert!(Grade::AAA > Grade::D);
        assert!(Grade::D > Grade::NoGrade);
        assert!(Achievement::Perfect > Achievement::FullCombo);
    }

    // =========================================================================
    // Progress and course tests
    // =========================================================================

    #[test]
    fn test_chart_time_progress() {
        assert!((chart_time_progress(30.0, 120.0) - 0.25).abs() < 1e-9);
        assert_eq!(chart_time_progress(-1.0, 120.0), 0.0);
        assert_eq!(chart_time_progress(130.0, 120.0), 1.0);
        assert_eq!(chart_time_progress(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_course_continuation_after() {
        let mut r = result(GaugeCalcType::NormalCourse, stats(10, 0, 0), 10);
        r.gauge_value = 83_000;
        r.final_course_combo = 42;
        r.play_option.gauge_type = GaugeType::Normal;
        r.play_option.game_mode = GameMode::Course;

        let first = CourseContinuation::after(None, &r);
        assert_eq!(
            first,
            CourseContinuation {
                gauge_value: 83_000,
                combo: 42,
                is_no_error: true,
            }
        );

        let mut missed = r.clone();
        missed.combo_stats = stats(9, 0, 1);
        let second = CourseContinuation::after(Some(&first), &missed);
        assert!(!second.is_no_error);

        let third = CourseContinuation::after(Some(&second), &r);
        assert!(!third.is_no_error);
    }

    #[test]
    fn test_play_result_serializes() {
        let r = result(GaugeCalcType::Hard, stats(10, 0, 0), 10);
        let json = serde_json::to_string(&r).unwrap();
        let back: PlayResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
