//! Gauge property definitions for all six gauge calculation types.
//!
//! Each [`GaugeCalcType`] maps to one constant [`GaugeElementProperty`]
//! holding its maximum, start value, gain/loss model and clear border.

use crate::play_option::GaugeCalcType;

/// Gauge gained by a Critical chip or slam before rate scaling.
pub const GAUGE_VALUE_CHIP: i32 = 200;

/// Gauge gained by a Near chip before rate scaling.
pub const GAUGE_VALUE_CHIP_NEAR: i32 = 50;

/// Gauge gained by a Critical long note or laser line unit before rate scaling.
pub const GAUGE_VALUE_LONG: i32 = 50;

/// Maximum of gauges with a chart-independent scale (Hard and course).
pub const GAUGE_VALUE_MAX_FIXED: i32 = 100_000;

/// A full-Critical play fills this percentage of the Normal gauge.
pub const GAUGE_TOTAL_PERCENTAGE: i64 = 125;

/// Floored percentage at or below which the guts rule kicks in.
pub const GAUGE_PERCENTAGE_THRESHOLD_HARD_WARNING: i32 = 30;

/// Percentage needed to clear with an Easy or Normal gauge.
pub const GAUGE_PERCENTAGE_THRESHOLD: i32 = 70;

/// Where the gauge maximum comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeMax {
    /// Derived from the chart's note count
    Chart,
    /// [`GAUGE_VALUE_MAX_FIXED`]
    Fixed,
}

/// How an Error lowers the gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GaugeDecrease {
    /// Percentage of the gauge maximum
    PercentOfMax { chip: f64, long: f64 },
    /// Absolute gauge value
    Fixed { chip: i32, long: i32 },
}

/// Effect of a Near chip or slam on the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearGaugeEffect {
    /// Gains [`GAUGE_VALUE_CHIP_NEAR`] scaled by the increase rate
    Increase,
    Unchanged,
    /// Loses what [`Self::Increase`] would have gained, reduced by the guts table
    Decrease,
}

/// Clear condition on the floored gauge percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearBorder {
    AtLeast(i32),
    AboveZero,
}

impl ClearBorder {
    pub fn is_cleared(self, percentage_int: i32) -> bool {
        match self {
            Self::AtLeast(border) => percentage_int >= border,
            Self::AboveZero => percentage_int > 0,
        }
    }
}

/// Guts damage reduction entry.
///
/// Applies when the floored gauge percentage is at or below `threshold`.
/// The table is checked in order; the first matching entry is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GutsEntry {
    pub threshold: i32,
    pub multiplier: f64,
}

/// Configuration for a single gauge calculation type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeElementProperty {
    pub max: GaugeMax,
    /// Start full instead of empty
    pub start_at_max: bool,
    /// Multiplier for gains
    pub increase_rate: f64,
    /// Gains are expressed relative to the chart's Normal maximum and mapped onto this gauge's maximum
    pub rescale_increase: bool,
    pub decrease: GaugeDecrease,
    /// Multiplier for losses
    pub decrease_rate: f64,
    pub near: NearGaugeEffect,
    /// Guts damage reduction table (only for fixed decreases)
    pub guts: &'static [GutsEntry],
    pub clear_border: ClearBorder,
}

impl GaugeElementProperty {
    /// Guts multiplier for a loss at the given floored percentage.
    pub fn guts_multiplier(&self, percentage_int: i32) -> f64 {
        self.guts
            .iter()
            .find(|g| percentage_int <= g.threshold)
            .map_or(1.0, |g| g.multiplier)
    }
}

const PERCENT_DECREASE: GaugeDecrease = GaugeDecrease::PercentOfMax {
    chip: 2.0,
    long: 0.5,
};

const FIXED_DECREASE: GaugeDecrease = GaugeDecrease::Fixed {
    chip: 25_000,
    long: 6_250,
};

const HARD_GUTS: &[GutsEntry] = &[GutsEntry {
    threshold: GAUGE_PERCENTAGE_THRESHOLD_HARD_WARNING,
    multiplier: 0.59,
}];

pub const EASY: GaugeElementProperty = GaugeElementProperty {
    max: GaugeMax::Chart,
    start_at_max: false,
    increase_rate: 1.10,
    rescale_increase: false,
    decrease: PERCENT_DECREASE,
    decrease_rate: 0.75,
    near: NearGaugeEffect::Increase,
    guts: &[],
    clear_border: ClearBorder::AtLeast(GAUGE_PERCENTAGE_THRESHOLD),
};

pub const NORMAL: GaugeElementProperty = GaugeElementProperty {
    max: GaugeMax::Chart,
    start_at_max: false,
    increase_rate: 1.0,
    rescale_increase: false,
    decrease: PERCENT_DECREASE,
    decrease_rate: 1.0,
    near: NearGaugeEffect::Increase,
    guts: &[],
    clear_border: ClearBorder::AtLeast(GAUGE_PERCENTAGE_THRESHOLD),
};

pub const HARD: GaugeElementProperty = GaugeElementProperty {
    max: GaugeMax::Fixed,
    start_at_max: true,
    increase_rate: 0.60,
    rescale_increase: false,
    decrease: FIXED_DECREASE,
    decrease_rate: 1.0,
    near: NearGaugeEffect::Unchanged,
    guts: HARD_GUTS,
    clear_border: ClearBorder::AboveZero,
};

// Course gauges keep the rates of their single-chart gauge and take the Hard
// gauge's scale: fixed maximum, fixed losses with guts, failure at zero.

pub const EASY_COURSE: GaugeElementProperty = GaugeElementProperty {
    max: GaugeMax::Fixed,
    start_at_max: true,
    rescale_increase: true,
    decrease: FIXED_DECREASE,
    guts: HARD_GUTS,
    clear_border: ClearBorder::AboveZero,
    ..EASY
};

pub const NORMAL_COURSE: GaugeElementProperty = GaugeElementProperty {
    max: GaugeMax::Fixed,
    start_at_max: true,
    rescale_increase: true,
    decrease: FIXED_DECREASE,
    guts: HARD_GUTS,
    clear_border: ClearBorder::AboveZero,
    ..NORMAL
};

pub const HARD_COURSE: GaugeElementProperty = GaugeElementProperty {
    rescale_increase: true,
    near: NearGaugeEffect::Decrease,
    ..HARD
};

impl GaugeCalcType {
    pub fn property(self) -> &'static GaugeElementProperty {
        match self {
            Self::Easy => &EASY,
            Self::Normal => &NORMAL,
            Self::Hard => &HARD,
            Self::EasyCourse => &EASY_COURSE,
            Self::NormalCourse => &NORMAL_COURSE,
            Self::HardCourse => &HARD_COURSE,
        }
    }
}

/// What a Near chip or slam does to the active gauge.
///
/// Easy and Normal gauges gain a little, a Hard gauge stays put, and a Hard
/// gauge in course mode loses.
pub fn near_gauge_effect(calc_type: GaugeCalcType) -> NearGaugeEffect {
    calc_type.property().near
}

/// Normal gauge maximum for a chart with the given unit counts.
pub fn chart_gauge_value_max(chip_units: usize, long_units: usize) -> i32 {
    let total_gain = chip_units as i64 * i64::from(GAUGE_VALUE_CHIP)
        + long_units as i64 * i64::from(GAUGE_VALUE_LONG);
    let max = total_gain * 100 / GAUGE_TOTAL_PERCENTAGE;
    max.clamp(1, i64::from(i32::MAX)) as i32
}
