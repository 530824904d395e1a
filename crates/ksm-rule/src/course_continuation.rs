use serde::{Deserialize, Serialize};

use crate::play_result::PlayResult;

/// State carried from one chart to the next in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseContinuation {
    pub gauge_value: i32,
    pub combo: i32,
    pub is_no_error: bool,
}

impl CourseContinuation {
    /// Continuation for the chart after the one that produced `result`.
    ///
    /// `previous` is the continuation the finished chart started from
    /// (`None` for the first chart of the course).
    pub fn after(previous: Option<&CourseContinuation>, result: &PlayResult) -> Self {
        let was_no_error = previous.is_none_or(|p| p.is_no_error);
        Self {
            gauge_value: result.gauge_value,
            combo: result.final_course_combo,
            is_no_error: was_no_error && result.combo_stats.error == 0,
        }
    }
}
