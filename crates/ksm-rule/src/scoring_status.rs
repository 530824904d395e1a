//! Score and gauge reducer.
//!
//! Chip and slam judgments go through [`ScoringStatus::on_chip_or_slam_judgment`],
//! long note and laser line units through [`ScoringStatus::on_long_or_line_judgment`].
//! Alongside the active gauge, a Normal gauge is always kept for the grade.

use crate::combo_status::ComboStatus;
use crate::course_continuation::CourseContinuation;
use crate::gauge_property::{
    GAUGE_VALUE_CHIP, GAUGE_VALUE_CHIP_NEAR, GAUGE_VALUE_LONG, GAUGE_VALUE_MAX_FIXED,
    GaugeDecrease, GaugeElementProperty, GaugeMax, NORMAL, NearGaugeEffect,
};
use crate::judgment_result::JudgmentResult;
use crate::play_option::GaugeCalcType;

/// Score shown for a full-Critical play.
pub const SCORE_MAX: i64 = 10_000_000;

pub const SCORE_VALUE_CRITICAL: i64 = 2;
pub const SCORE_VALUE_NEAR: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    ChipOrSlam,
    LongOrLine,
}

/// One gauge bound to a property table.
///
/// A hard-failable gauge that reached 0 never recovers.
#[derive(Debug, Clone, PartialEq)]
struct Gauge {
    property: &'static GaugeElementProperty,
    hard_failable: bool,
    value: i32,
    value_max: i32,
    /// Normal maximum of the chart, the unit gains are expressed in
    chart_value_max: i32,
}

impl Gauge {
    fn new(
        property: &'static GaugeElementProperty,
        hard_failable: bool,
        chart_value_max: i32,
    ) -> Self {
        let value_max = match property.max {
            GaugeMax::Chart => chart_value_max,
            GaugeMax::Fixed => GAUGE_VALUE_MAX_FIXED,
        };
        Self {
            property,
            hard_failable,
            value: if property.start_at_max { value_max } else { 0 },
            value_max,
            chart_value_max,
        }
    }

    fn percentage(&self) -> f64 {
        100.0 * f64::from(self.value) / f64::from(self.value_max)
    }

    fn percentage_int(&self) -> i32 {
        (i64::from(self.value) * 100 / i64::from(self.value_max)) as i32
    }

    fn set_value(&mut self, value: i32) {
        if self.hard_failable && self.value == 0 {
            return;
        }
        self.value = value.clamp(0, self.value_max);
    }

    /// Gain for `base`, scaled by the increase rate and mapped onto this gauge's maximum.
    fn gain(&self, base: i32) -> f64 {
        let add = f64::from(base) * self.property.increase_rate;
        if self.property.rescale_increase {
            add * f64::from(self.value_max) / f64::from(self.chart_value_max)
        } else {
            add
        }
    }

    fn increase(&mut self, base: i32) {
        let add = self.gain(base);
        self.set_value(self.value.saturating_add(add as i32));
    }

    fn decrease(&mut self, kind: UnitKind) {
        let sub = match self.property.decrease {
            GaugeDecrease::PercentOfMax { chip, long } => {
                let percent = if kind == UnitKind::ChipOrSlam { chip } else { long };
                f64::from(self.value_max) * percent / 100.0 * self.property.decrease_rate
            }
            GaugeDecrease::Fixed { chip, long } => {
                let value = if kind == UnitKind::ChipOrSlam { chip } else { long };
                self.fixed_decrease(value)
            }
        };
        self.set_value(self.value - sub as i32);
    }

    /// Fixed loss scaled by the decrease rate and reduced by the guts table.
    fn fixed_decrease(&self, value: i32) -> f64 {
        f64::from(value)
            * self.property.decrease_rate
            * self.property.guts_multiplier(self.percentage_int())
    }

    fn apply_near(&mut self) {
        match self.property.near {
            NearGaugeEffect::Increase => self.increase(GAUGE_VALUE_CHIP_NEAR),
            NearGaugeEffect::Unchanged => {}
            NearGaugeEffect::Decrease => {
                let sub = self.gain(GAUGE_VALUE_CHIP_NEAR)
                    * self.property.guts_multiplier(self.percentage_int());
                self.set_value(self.value - sub as i32);
            }
        }
    }
}

/// Score, gauge and combo state of one play.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringStatus {
    calc_type: GaugeCalcType,
    score_value: i64,
    score_value_max: i64,
    gauge: Gauge,
    /// Normal gauge kept alongside the active one for the grade
    normal_gauge: Gauge,
    combo_status: ComboStatus,
}

impl ScoringStatus {
    /// # Arguments
    /// - `total_combo`: number of judgment units in the chart
    /// - `chart_gauge_value_max`: Normal gauge maximum of the chart
    /// - `continuation`: carried state, only used by course gauges
    pub fn new(
        calc_type: GaugeCalcType,
        total_combo: i32,
        chart_gauge_value_max: i32,
        continuation: Option<&CourseContinuation>,
    ) -> Self {
        let chart_gauge_value_max = chart_gauge_value_max.max(1);
        let mut gauge = Gauge::new(
            calc_type.property(),
            calc_type.is_hard_failable(),
            chart_gauge_value_max,
        );
        if let Some(c) = continuation.filter(|_| calc_type.is_course()) {
            gauge.set_value(c.gauge_value);
        }
        Self {
            calc_type,
            score_value: 0,
            score_value_max: i64::from(total_combo) * SCORE_VALUE_CRITICAL,
            gauge,
            normal_gauge: Gauge::new(&NORMAL, false, chart_gauge_value_max),
            combo_status: ComboStatus::new(continuation),
        }
    }

    pub fn on_chip_or_slam_judgment(&mut self, result: JudgmentResult, diff_sec: Option<f64>) {
        match result {
            JudgmentResult::Critical => {
                self.score_value += SCORE_VALUE_CRITICAL;
                self.gauge.increase(GAUGE_VALUE_CHIP);
                self.normal_gauge.increase(GAUGE_VALUE_CHIP);
            }
            JudgmentResult::NearFast | JudgmentResult::NearSlow => {
                self.score_value += SCORE_VALUE_NEAR;
                self.gauge.apply_near();
                self.normal_gauge.apply_near();
            }
            JudgmentResult::Error => {
                self.gauge.decrease(UnitKind::ChipOrSlam);
                self.normal_gauge.decrease(UnitKind::ChipOrSlam);
            }
            JudgmentResult::Unspecified => return,
        }
        self.combo_status.process_judgment_result(result, diff_sec);
    }

    pub fn on_long_or_line_judgment(&mut self, result: JudgmentResult) {
        match result {
            JudgmentResult::Critical | JudgmentResult::NearFast | JudgmentResult::NearSlow => {
                self.score_value += SCORE_VALUE_CRITICAL;
                self.gauge.increase(GAUGE_VALUE_LONG);
                self.normal_gauge.increase(GAUGE_VALUE_LONG);
            }
            JudgmentResult::Error => {
                self.gauge.decrease(UnitKind::LongOrLine);
                self.normal_gauge.decrease(UnitKind::LongOrLine);
            }
            JudgmentResult::Unspecified => return,
        }
        self.combo_status.process_judgment_result(result, None);
    }

    pub fn calc_type(&self) -> GaugeCalcType {
        self.calc_type
    }

    /// Score scaled to [`SCORE_MAX`].
    pub fn score(&self) -> i32 {
        if self.score_value_max == 0 {
            return 0;
        }
        (SCORE_MAX * self.score_value / self.score_value_max) as i32
    }

    pub fn gauge_value(&self) -> i32 {
        self.gauge.value
    }

    pub fn gauge_value_max(&self) -> i32 {
        self.gauge.value_max
    }

    pub fn gauge_percentage(&self) -> f64 {
        self.gauge.percentage()
    }

    pub fn gauge_percentage_int(&self) -> i32 {
        self.gauge.percentage_int()
    }

    /// Percentage of the Normal gauge played alongside, used for the grade.
    pub fn gauge_percentage_for_grade(&self) -> f64 {
        self.normal_gauge.percentage()
    }

    /// A hard-failable gauge that hit zero.
    pub fn is_hard_failed(&self) -> bool {
        self.calc_type.is_hard_failable() && self.gauge.value == 0
    }

    pub fn combo_status(&self) -> &ComboStatus {
        &self.combo_status
    }
}
