// Button/laser judgment, scoring and gauge rules, play results

mod button_lane_judgment;
mod combo_status;
mod course_continuation;
mod frame_input;
mod fx_lane_priority;
mod game_status;
pub mod gauge_property;
mod judgment_handler;
mod judgment_main;
mod judgment_result;
mod judgment_unit;
mod laser_lane_judgment;
mod laser_slam_judgment;
mod laser_slam_shake;
mod play_option;
mod play_result;
mod scoring_status;
pub mod timing_window;
mod view_status;

pub use button_lane_judgment::ButtonLaneJudgment;
pub use combo_status::{ComboStats, ComboStatus};
pub use course_continuation::CourseContinuation;
pub use frame_input::{Button, ButtonInput, FrameInput, FrameTime, NUM_BUTTONS};
pub use fx_lane_priority::FxLanePriority;
pub use game_status::{ButtonLaneStatus, GameStatus, LaserLaneStatus, PAST_TIME_SEC};
pub use gauge_property::{
    ClearBorder, GaugeDecrease, GaugeElementProperty, GaugeMax, GutsEntry, NearGaugeEffect,
    chart_gauge_value_max, near_gauge_effect,
};
pub use judgment_handler::{JudgmentHandler, JudgmentUnitCounts, SlamCamTrigger};
pub use judgment_main::JudgmentMain;
pub use judgment_result::{JudgmentEvent, JudgmentResult, KeyBeamType};
pub use judgment_unit::{JudgmentUnit, split_hold};
pub use laser_lane_judgment::LaserLaneJudgment;
pub use laser_slam_judgment::{LaserInputAccumulator, LaserSlamJudgment};
pub use laser_slam_shake::LaserSlamShake;
pub use play_option::{GameMode, GaugeCalcType, GaugeType, JudgmentPlayMode, PlayOption};
pub use play_result::{Achievement, Grade, PlayResult, chart_time_progress};
pub use scoring_status::{SCORE_MAX, SCORE_VALUE_CRITICAL, SCORE_VALUE_NEAR, ScoringStatus};
pub use view_status::{CamStatus, ViewStatus};
