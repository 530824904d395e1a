use serde::{Deserialize, Serialize};

use crate::course_continuation::CourseContinuation;
use crate::judgment_result::JudgmentResult;

/// Judgment tallies plus timing deviation of measured presses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComboStats {
    pub critical: i32,
    pub near_fast: i32,
    pub near_slow: i32,
    pub error: i32,
    /// Sum of input time minus note time over measured Critical/Near presses (FAST < 0)
    pub total_deviation_sec: f64,
    pub deviation_count: i32,
}

impl ComboStats {
    pub fn total_near(&self) -> i32 {
        self.near_fast + self.near_slow
    }

    pub fn total_judged_combo(&self) -> i32 {
        self.critical + self.total_near() + self.error
    }

    /// Mean deviation, or `None` before any measured press.
    pub fn average_deviation_sec(&self) -> Option<f64> {
        (self.deviation_count > 0)
            .then(|| self.total_deviation_sec / f64::from(self.deviation_count))
    }

    /// Amount to add to the input delay setting to center the player's timing.
    ///
    /// Consistently late presses give a positive value.
    pub fn suggested_input_delay_ms(&self) -> Option<i32> {
        self.average_deviation_sec().map(|avg| (avg * 1000.0).round() as i32)
    }
}

/// Combo counters for one chart, plus the course-wide combo and no-error flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboStatus {
    combo: i32,
    max_combo: i32,
    course_combo: i32,
    max_course_combo: i32,
    course_is_no_error: bool,
    stats: ComboStats,
}

impl ComboStatus {
    pub fn new(continuation: Option<&CourseContinuation>) -> Self {
        let course_combo = continuation.map_or(0, |c| c.combo);
        Self {
            combo: 0,
            max_combo: 0,
            course_combo,
            max_course_combo: course_combo,
            course_is_no_error: continuation.is_none_or(|c| c.is_no_error),
            stats: ComboStats::default(),
        }
    }

    /// Fold one judgment into the counters.
    ///
    /// `diff_sec` is recorded as deviation for Critical/Near only.
    pub fn process_judgment_result(&mut self, result: JudgmentResult, diff_sec: Option<f64>) {
        if let Some(diff) = diff_sec.filter(|_| result.continues_combo()) {
            self.stats.total_deviation_sec += diff;
            self.stats.deviation_count += 1;
        }

        match result {
            JudgmentResult::Critical => self.stats.critical += 1,
            JudgmentResult::NearFast => self.stats.near_fast += 1,
            JudgmentResult::NearSlow => self.stats.near_slow += 1,
            JudgmentResult::Error => {
                self.stats.error += 1;
                self.combo = 0;
                self.course_combo = 0;
                self.course_is_no_error = false;
                return;
            }
            JudgmentResult::Unspecified => return,
        }

        self.combo += 1;
        self.course_combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.max_course_combo = self.max_course_combo.max(self.course_combo);
    }

    pub fn combo(&self) -> i32 {
        self.combo
    }

    pub fn max_combo(&self) -> i32 {
        self.max_combo
    }

    pub fn stats(&self) -> &ComboStats {
        &self.stats
    }

    /// No Error in this chart.
    pub fn is_no_error(&self) -> bool {
        self.stats.error == 0
    }

    pub fn total_judged_combo(&self) -> i32 {
        self.stats.total_judged_combo()
    }

    pub fn course_combo(&self) -> i32 {
        self.course_combo
    }

    pub fn max_course_combo(&self) -> i32 {
        self.max_course_combo
    }

    pub fn course_is_no_error(&self) -> bool {
        self.course_is_no_error
    }
}
