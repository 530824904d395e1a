//! Pulse ↔ seconds conversion.
//!
//! Judgment code only talks to [`TimingProvider`]; [`TempoMap`] is the
//! piecewise-constant tempo implementation built from a chart's BPM changes.

use anyhow::{Result, bail, ensure};
use log::debug;

use crate::pulse::{ByPulse, Pulse, RESOLUTION};

/// Conversion between musical position and wall-clock time.
///
/// `pulse_to_sec` must be monotonically increasing in `pulse`.
pub trait TimingProvider {
    fn pulse_to_sec(&self, pulse: Pulse) -> f64;
    fn sec_to_pulse(&self, sec: f64) -> Pulse;
    fn tempo_at(&self, pulse: Pulse) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TempoSegment {
    pulse: Pulse,
    bpm: f64,
    /// Time at `pulse`, precomputed from the preceding segments
    sec: f64,
}

impl TempoSegment {
    fn sec_per_pulse(&self) -> f64 {
        60.0 / (self.bpm * RESOLUTION as f64)
    }
}

/// Timing cache over a set of tempo changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    /// Build the timing cache. Requires a tempo at pulse 0 and positive, finite BPMs.
    pub fn new(bpm_changes: &ByPulse<f64>) -> Result<Self> {
        ensure!(!bpm_changes.is_empty(), "chart has no tempo");
        let mut segments: Vec<TempoSegment> = Vec::with_capacity(bpm_changes.len());
        for (&pulse, &bpm) in bpm_changes {
            if !(bpm.is_finite() && bpm > 0.0) {
                bail!("invalid tempo {bpm} at pulse {pulse}");
            }
            let sec = match segments.last() {
                Some(prev) => prev.sec + (pulse - prev.pulse) as f64 * prev.sec_per_pulse(),
                None => {
                    ensure!(pulse == 0, "first tempo change must be at pulse 0, found {pulse}");
                    0.0
                }
            };
            segments.push(TempoSegment { pulse, bpm, sec });
        }
        debug!("tempo map built with {} segment(s)", segments.len());
        Ok(Self { segments })
    }

    /// Single-tempo map.
    pub fn constant(bpm: f64) -> Result<Self> {
        Self::new(&ByPulse::from([(0, bpm)]))
    }

    fn segment_at_pulse(&self, pulse: Pulse) -> &TempoSegment {
        let idx = self.segments.partition_point(|s| s.pulse <= pulse);
        &self.segments[idx.saturating_sub(1)]
    }

    fn segment_at_sec(&self, sec: f64) -> &TempoSegment {
        let idx = self.segments.partition_point(|s| s.sec <= sec);
        &self.segments[idx.saturating_sub(1)]
    }
}

impl TimingProvider for TempoMap {
    fn pulse_to_sec(&self, pulse: Pulse) -> f64 {
        let seg = self.segment_at_pulse(pulse);
        seg.sec + (pulse - seg.pulse) as f64 * seg.sec_per_pulse()
    }

    fn sec_to_pulse(&self, sec: f64) -> Pulse {
        let seg = self.segment_at_sec(sec);
        let pulses = (sec - seg.sec) * seg.bpm * RESOLUTION as f64 / 60.0;
        seg.pulse + (pulses + 1e-9).floor() as Pulse
    }

    fn tempo_at(&self, pulse: Pulse) -> f64 {
        self.segment_at_pulse(pulse).bpm
    }
}
