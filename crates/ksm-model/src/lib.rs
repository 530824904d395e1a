// KSM chart data model: pulses, button/laser notes, tempo map

mod chart;
mod note;
mod pulse;
mod timing;

pub use chart::ChartData;
pub use note::{
    GraphValue, Interval, LaserSection, NUM_BT_LANES, NUM_FX_LANES, NUM_LASER_LANES, NoteInfo,
};
pub use pulse::{ByPulse, ByRelPulse, Pulse, RESOLUTION, RESOLUTION4, RelPulse, entry_at, value_at};
pub use timing::{TempoMap, TimingProvider};
