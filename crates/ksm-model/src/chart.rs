use std::collections::BTreeSet;

use anyhow::{Context, Result, bail, ensure};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::note::{Interval, LaserSection, NUM_FX_LANES, NoteInfo};
use crate::pulse::{ByPulse, Pulse};
use crate::timing::TempoMap;

/// Chart data consumed by judgment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub note: NoteInfo,
    /// Tempo changes (BPM by pulse)
    pub bpm: ByPulse<f64>,
    /// FX chips that trigger a key sound when pressed
    #[serde(default)]
    pub fx_key_sound: [BTreeSet<Pulse>; NUM_FX_LANES],
}

impl ChartData {
    /// Parse a chart from its JSON representation and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let chart: Self = serde_json::from_str(json).context("malformed chart JSON")?;
        chart.validate()?;
        Ok(chart)
    }

    /// Check the structural rules judgment relies on.
    pub fn validate(&self) -> Result<()> {
        for (i, lane) in self.note.bt.iter().enumerate() {
            validate_button_lane(lane).with_context(|| format!("BT lane {i}"))?;
        }
        for (i, lane) in self.note.fx.iter().enumerate() {
            validate_button_lane(lane).with_context(|| format!("FX lane {i}"))?;
        }
        for (i, lane) in self.note.laser.iter().enumerate() {
            validate_laser_lane(lane).with_context(|| format!("laser lane {i}"))?;
        }
        for (i, pulses) in self.fx_key_sound.iter().enumerate() {
            for pulse in pulses {
                if !self.note.fx[i].get(pulse).is_some_and(Interval::is_chip) {
                    warn!("FX lane {i}: key sound at pulse {pulse} has no chip note");
                }
            }
        }
        self.tempo_map().map(|_| ())
    }

    pub fn tempo_map(&self) -> Result<TempoMap> {
        TempoMap::new(&self.bpm)
    }
}

fn validate_button_lane(lane: &ByPulse<Interval>) -> Result<()> {
    let mut prev_end: Option<Pulse> = None;
    for (&y, note) in lane {
        ensure!(y >= 0, "note at negative pulse {y}");
        ensure!(note.length >= 0, "note at pulse {y} has negative length");
        if let Some(end) = prev_end.filter(|&end| y < end) {
            bail!("note at pulse {y} overlaps a long note ending at {end}");
        }
        prev_end = Some(y + note.length);
    }
    Ok(())
}

fn validate_laser_lane(lane: &ByPulse<LaserSection>) -> Result<()> {
    let mut prev_end: Option<Pulse> = None;
    for (&y, section) in lane {
        ensure!(y >= 0, "laser section at negative pulse {y}");
        let Some(&first) = section.points.keys().next() else {
            bail!("laser section at pulse {y} has no points");
        };
        ensure!(first == 0, "laser section at pulse {y} does not start at its origin");
        for (ry, p) in &section.points {
            ensure!(
                (0.0..=1.0).contains(&p.v) && (0.0..=1.0).contains(&p.vf),
                "laser point at pulse {} is out of range",
                y + ry
            );
        }
        if let Some(end) = prev_end.filter(|&end| y < end) {
            bail!("laser section at pulse {y} overlaps a section ending at {end}");
        }
        prev_end = Some(y + section.length());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::GraphValue;

    fn base_chart() -> ChartData {
        ChartData {
            bpm: ByPulse::from([(0, 120.0)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_ok() {
        let mut chart = base_chart();
        chart.note.bt[0].insert(0, Interval::long(480));
        chart.note.bt[0].insert(480, Interval::chip());
        chart.note.laser[1].insert(
            0,
            LaserSection::new([(0, GraphValue::new(0.0)), (480, GraphValue::new(1.0))]),
        );
        assert!(chart.validate().is_ok());
    }

    #[test]
    fn test_validate_overlapping_long_note() {
        let mut chart = base_chart();
        chart.note.fx[1].insert(0, Interval::long(480));
        chart.note.fx[1].insert(240, Interval::chip());
        let err = chart.validate().unwrap_err();
        assert!(format!("{err:#}").contains("FX lane 1"));
    }

    #[test]
    fn test_validate_laser_out_of_range() {
        let mut chart = base_chart();
        chart.note.laser[0].insert(
            0,
            LaserSection::new([(0, GraphValue::new(0.0)), (240, GraphValue::new(1.5))]),
        );
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_validate_laser_without_origin() {
        let mut chart = base_chart();
        chart.note.laser[0].insert(0, LaserSection::new([(120, GraphValue::new(0.0))]));
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_validate_missing_tempo() {
        let chart = ChartData::default();
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "note": {"bt": [{"0": {"length": 0}}, {}, {}, {}], "fx": [{}, {"240": {"length": 0}}], "laser": [{}, {}]},
            "bpm": {"0": 180.0},
            "fx_key_sound": [[], [240]]
        }"#;
        let chart = ChartData::from_json_str(json).unwrap();
        assert!(chart.fx_key_sound[1].contains(&240));
        assert_eq!(chart.bpm[&0], 180.0);
    }

    #[test]
    fn test_from_json_str_malformed() {
        assert!(ChartData::from_json_str("{").is_err());
    }
}
