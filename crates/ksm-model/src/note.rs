use serde::{Deserialize, Serialize};

use crate::pulse::{ByPulse, ByRelPulse, Pulse, RelPulse};

/// Number of BT lanes.
pub const NUM_BT_LANES: usize = 4;

/// Number of FX lanes.
pub const NUM_FX_LANES: usize = 2;

/// Number of laser lanes (left, right).
pub const NUM_LASER_LANES: usize = 2;

/// Values closer than this are treated as equal on the laser graph.
const GRAPH_EPSILON: f64 = 1e-6;

/// A button note. Length 0 is a chip, anything longer is a long note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub length: RelPulse,
}

impl Interval {
    pub fn chip() -> Self {
        Self { length: 0 }
    }

    pub fn long(length: RelPulse) -> Self {
        Self { length }
    }

    pub fn is_chip(&self) -> bool {
        self.length == 0
    }

    pub fn is_long(&self) -> bool {
        self.length > 0
    }
}

/// A laser graph point.
///
/// `v` is the value arriving at the point and `vf` the value leaving it.
/// A point with `v != vf` is a slam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphValue {
    pub v: f64,
    pub vf: f64,
}

impl GraphValue {
    pub fn new(v: f64) -> Self {
        Self { v, vf: v }
    }

    pub fn slam(v: f64, vf: f64) -> Self {
        Self { v, vf }
    }

    pub fn is_slam(&self) -> bool {
        (self.vf - self.v).abs() > GRAPH_EPSILON
    }

    /// Direction of the slam: -1 (left), 1 (right), or 0 for a plain point.
    pub fn slam_direction(&self) -> i32 {
        if self.is_slam() {
            sign(self.vf - self.v)
        } else {
            0
        }
    }
}

/// One continuous laser section. Point positions are relative to the section start.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LaserSection {
    pub points: ByRelPulse<GraphValue>,
    /// 2x-wide laser
    #[serde(default)]
    pub wide: bool,
}

impl LaserSection {
    pub fn new(points: impl IntoIterator<Item = (RelPulse, GraphValue)>) -> Self {
        Self {
            points: points.into_iter().collect(),
            wide: false,
        }
    }

    /// Relative pulse of the last point.
    pub fn length(&self) -> RelPulse {
        self.points.keys().next_back().copied().unwrap_or(0)
    }

    /// Ideal cursor position at `ry`, or `None` outside the section.
    ///
    /// Between two points the value moves linearly from the leaving value of the
    /// earlier point to the arriving value of the later one.
    pub fn value_at(&self, ry: RelPulse) -> Option<f64> {
        let (&ry0, p0) = self.points.range(..=ry).next_back()?;
        match self.points.range(ry + 1..).next() {
            Some((&ry1, p1)) => {
                let t = (ry - ry0) as f64 / (ry1 - ry0) as f64;
                Some(p0.vf + (p1.v - p0.vf) * t)
            }
            None if ry == ry0 => Some(p0.vf),
            None => None,
        }
    }

    /// Direction the line is moving at `ry`: -1, 0 (flat), or 1.
    pub fn direction_at(&self, ry: RelPulse) -> i32 {
        let Some((_, p0)) = self.points.range(..=ry).next_back() else {
            return 0;
        };
        match self.points.range(ry + 1..).next() {
            Some((_, p1)) => sign(p1.v - p0.vf),
            None => 0,
        }
    }

    /// All slams in the section as `(relative pulse, point)`.
    pub fn slams(&self) -> impl Iterator<Item = (RelPulse, &GraphValue)> {
        self.points
            .iter()
            .filter(|(_, p)| p.is_slam())
            .map(|(&ry, p)| (ry, p))
    }

    /// Relative pulses where the line starts moving against its previous direction.
    ///
    /// Flat segments do not reset the previous direction.
    pub fn direction_changes(&self) -> Vec<RelPulse> {
        let mut changes = Vec::new();
        let mut prev_direction = 0;
        let mut iter = self.points.iter().peekable();
        while let Some((&ry, p0)) = iter.next() {
            let Some(&(_, p1)) = iter.peek() else {
                break;
            };
            let direction = sign(p1.v - p0.vf);
            if direction == 0 {
                continue;
            }
            if prev_direction != 0 && direction != prev_direction {
                changes.push(ry);
            }
            prev_direction = direction;
        }
        changes
    }
}

/// Judgeable notes of a chart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NoteInfo {
    pub bt: [ByPulse<Interval>; NUM_BT_LANES],
    pub fx: [ByPulse<Interval>; NUM_FX_LANES],
    pub laser: [ByPulse<LaserSection>; NUM_LASER_LANES],
}

impl NoteInfo {
    /// Pulse where the last note (including laser sections) ends.
    pub fn last_note_end_pulse(&self) -> Pulse {
        let buttons = self
            .bt
            .iter()
            .chain(self.fx.iter())
            .filter_map(|lane| lane.iter().next_back())
            .map(|(&y, note)| y + note.length);
        let lasers = self
            .laser
            .iter()
            .filter_map(|lane| lane.iter().next_back())
            .map(|(&y, section)| y + section.length());
        buttons.chain(lasers).max().unwrap_or(0)
    }
}

fn sign(x: f64) -> i32 {
    if x > GRAPH_EPSILON {
        1
    } else if x < -GRAPH_EPSILON {
        -1
    } else {
        0
    }
}
