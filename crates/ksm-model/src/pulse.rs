use std::collections::BTreeMap;

/// Absolute musical position in the chart.
pub type Pulse = i64;

/// Musical position relative to the start of its container (e.g. a laser section).
pub type RelPulse = i64;

/// Pulses per quarter note.
pub const RESOLUTION: Pulse = 240;

/// Pulses per 4/4 measure.
pub const RESOLUTION4: Pulse = RESOLUTION * 4;

/// Pulse-ordered map.
pub type ByPulse<T> = BTreeMap<Pulse, T>;

/// Relative-pulse-ordered map.
pub type ByRelPulse<T> = BTreeMap<RelPulse, T>;

/// Returns the last entry whose key is at or before `pulse`.
pub fn entry_at<T>(map: &BTreeMap<i64, T>, pulse: i64) -> Option<(i64, &T)> {
    map.range(..=pulse).next_back().map(|(&y, v)| (y, v))
}

/// Returns the value in effect at `pulse`, falling back to the first entry for
/// positions before the map starts.
pub fn value_at<T: Copy>(map: &BTreeMap<i64, T>, pulse: i64) -> Option<T> {
    entry_at(map, pulse)
        .map(|(_, v)| *v)
        .or_else(|| map.values().next().copied())
}
